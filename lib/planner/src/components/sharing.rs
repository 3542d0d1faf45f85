use crate::components::JoinGraph;
use crate::join_order::JoinOrderPlanner;
use crate::PlanResult;
use rdf_federation_common::BitSet;
use tracing::{debug, trace};

/// A set of nodes of a join graph that the common subset reduction can operate on.
///
/// Implemented for single machine words (graphs with at most 64 nodes) and for [BitSet]s.
pub(crate) trait NodeSet: Clone + PartialEq + std::fmt::Debug {
    #[must_use]
    fn and(&self, other: &Self) -> Self;

    #[must_use]
    fn and_not(&self, other: &Self) -> Self;

    fn is_empty(&self) -> bool;

    fn cardinality(&self) -> usize;
}

impl NodeSet for u64 {
    fn and(&self, other: &Self) -> Self {
        self & other
    }

    fn and_not(&self, other: &Self) -> Self {
        self & !other
    }

    fn is_empty(&self) -> bool {
        *self == 0
    }

    fn cardinality(&self) -> usize {
        self.count_ones() as usize
    }
}

impl NodeSet for BitSet {
    fn and(&self, other: &Self) -> Self {
        self.intersection(other)
    }

    fn and_not(&self, other: &Self) -> Self {
        self.difference(other)
    }

    fn is_empty(&self) -> bool {
        BitSet::is_empty(self)
    }

    fn cardinality(&self) -> usize {
        BitSet::cardinality(self)
    }
}

/// Finds node subsets that are part of at least two components.
///
/// Every returned subset contains at least two nodes, is connected in `graph`, can be planned by
/// `planner`, and is disjoint from the other returned subsets. If `scalar_fast_path` is set and
/// the graph has at most 64 nodes, the subsets are computed on single machine words.
pub fn find_common_subsets(
    graph: &JoinGraph,
    components: &[BitSet],
    planner: &dyn JoinOrderPlanner,
    scalar_fast_path: bool,
) -> PlanResult<Vec<BitSet>> {
    let scalar = if scalar_fast_path {
        find_common_subsets_scalar(graph, components, planner)?
    } else {
        None
    };
    let subsets = match scalar {
        Some(subsets) => subsets,
        None => find_common_subsets_general(graph, components, planner)?,
    };

    debug!(
        components = components.len(),
        subsets = subsets.len(),
        "Found common subsets"
    );
    Ok(subsets)
}

/// Computes the common subsets on machine words. Returns [None] if the graph has more than 64
/// nodes.
pub fn find_common_subsets_scalar(
    graph: &JoinGraph,
    components: &[BitSet],
    planner: &dyn JoinOrderPlanner,
) -> PlanResult<Option<Vec<BitSet>>> {
    check_components(graph, components)?;
    let Some(words) = components
        .iter()
        .map(BitSet::to_word)
        .collect::<Option<Vec<_>>>()
    else {
        return Ok(None);
    };

    let width = graph.len();
    let subsets = reduce_common_subsets(&words, |subset: &u64| {
        is_plannable(graph, planner, &BitSet::from_word(width, *subset))
    });
    Ok(Some(
        subsets
            .into_iter()
            .map(|word| BitSet::from_word(width, word))
            .collect(),
    ))
}

/// Computes the common subsets on [BitSet]s of arbitrary width.
pub fn find_common_subsets_general(
    graph: &JoinGraph,
    components: &[BitSet],
    planner: &dyn JoinOrderPlanner,
) -> PlanResult<Vec<BitSet>> {
    check_components(graph, components)?;
    Ok(reduce_common_subsets(components, |subset: &BitSet| {
        is_plannable(graph, planner, subset)
    }))
}

fn check_components(graph: &JoinGraph, components: &[BitSet]) -> PlanResult<()> {
    for component in components {
        graph.check_subset(component)?;
    }
    Ok(())
}

/// Returns true if the nodes of `subset` can be joined into a single fragment.
///
/// Connectivity is checked first, as it is cheaper than planning. If inputs are considered, a
/// connected subset may still be unplannable because an input is only produced outside of it.
fn is_plannable(graph: &JoinGraph, planner: &dyn JoinOrderPlanner, subset: &BitSet) -> bool {
    graph.is_connected(subset) && !planner.plan(graph, subset).is_empty()
}

/// Intersects all pairs of components and reduces the intersections to disjoint subsets.
pub(crate) fn reduce_common_subsets<S: NodeSet>(
    components: &[S],
    is_plannable: impl Fn(&S) -> bool,
) -> Vec<S> {
    let is_shareable = |subset: &S| subset.cardinality() >= 2 && is_plannable(subset);

    let mut result = Vec::new();
    for (i, lhs) in components.iter().enumerate() {
        for rhs in &components[i + 1..] {
            let shared = lhs.and(rhs);
            if !is_shareable(&shared) {
                if !shared.is_empty() {
                    trace!("Rejected common subset {shared:?}");
                }
                continue;
            }

            if let Some(shared) = merge_common_subset(&mut result, shared, &is_shareable) {
                result.push(shared);
            }
        }
    }
    result
}

/// Removes the overlap between `shared` and the subsets in `result`.
///
/// On overlap, the larger subset is kept intact and the overlap is removed from the smaller one.
/// If the smaller one would no longer be shareable, it is discarded. Returns the remainder of
/// `shared` that should be appended to `result`.
fn merge_common_subset<S: NodeSet>(
    result: &mut Vec<S>,
    mut shared: S,
    is_shareable: &impl Fn(&S) -> bool,
) -> Option<S> {
    let mut i = 0;
    while i < result.len() {
        if result[i] == shared {
            return None;
        }

        let overlap = shared.and(&result[i]);
        if !overlap.is_empty() {
            if shared.cardinality() > result[i].cardinality() {
                let shrunk = result[i].and_not(&overlap);
                if is_shareable(&shrunk) {
                    result[i] = shrunk;
                } else {
                    trace!("Replaced common subset {:?} by {shared:?}", result[i]);
                    result.remove(i);
                    continue;
                }
            } else {
                let shrunk = shared.and_not(&overlap);
                if is_shareable(&shrunk) {
                    shared = shrunk;
                } else {
                    trace!("Rejected common subset {shared:?}");
                    return None;
                }
            }
        }
        i += 1;
    }
    Some(shared)
}
