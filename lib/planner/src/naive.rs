use crate::conjunctive::ConjunctivePlanner;
use crate::join_order::JoinOrderPlanner;
use crate::{ConjunctiveQuery, Fragment, PlanResult, PlanningError};
use itertools::Itertools;
use rdf_federation_model::{TriplePattern, Variable};
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// A [ConjunctivePlanner] that searches components on hash sets of triples and variables.
///
/// The planner does not require the query to be indexed. It applies the same rules as the bit set
/// based search but computes the neighbors of a state by scanning all fragments. Fragments are
/// neither grouped nor shared between components.
#[derive(Debug, Clone)]
pub struct NaiveConjunctivePlanner {
    join_order: Arc<dyn JoinOrderPlanner>,
}

/// A search state of the [NaiveConjunctivePlanner].
#[derive(Clone, Debug)]
struct NaiveState<'fragment> {
    nodes: BTreeSet<usize>,
    vars: FxHashSet<&'fragment Variable>,
    triples: FxHashSet<&'fragment TriplePattern>,
    inputs: FxHashSet<&'fragment Variable>,
}

impl NaiveConjunctivePlanner {
    pub fn new(join_order: Arc<dyn JoinOrderPlanner>) -> Self {
        Self { join_order }
    }

    /// Finds all components of `fragments` as ascending lists of fragment indices.
    pub fn find_components(query: &ConjunctiveQuery, fragments: &[Fragment]) -> Vec<Vec<usize>> {
        let with_inputs = fragments.iter().any(Fragment::requires_inputs);
        let all_triples = query.patterns().iter().collect::<FxHashSet<_>>();

        let mut seen: FxHashSet<BTreeSet<usize>> = FxHashSet::default();
        let mut components: BTreeSet<Vec<usize>> = BTreeSet::new();
        let mut stack = Vec::new();

        for start in 0..fragments.len() {
            let initial = NaiveState {
                nodes: BTreeSet::from([start]),
                vars: fragments[start].public_vars().iter().collect(),
                triples: fragments[start].triples().iter().collect(),
                inputs: fragments[start].input_vars().iter().collect(),
            };
            if !seen.insert(initial.nodes.clone()) {
                continue;
            }
            stack.push(initial);

            while let Some(state) = stack.pop() {
                if state.triples == all_triples && state.inputs.is_empty() {
                    components.insert(state.nodes.into_iter().collect());
                    continue;
                }

                for candidate in 0..fragments.len() {
                    let is_neighbor = state.nodes.iter().any(|node| {
                        is_adjacent(&fragments[*node], &fragments[candidate], with_inputs)
                    });
                    if !is_neighbor {
                        continue;
                    }

                    if let Some(next) = add_fragment(&state, fragments, candidate) {
                        if seen.insert(next.nodes.clone()) {
                            stack.push(next);
                        }
                    }
                }
            }
        }

        components.into_iter().collect()
    }
}

impl ConjunctivePlanner for NaiveConjunctivePlanner {
    fn plan(&self, query: &ConjunctiveQuery, fragments: &[Fragment]) -> PlanResult<Fragment> {
        if query.is_empty() {
            return Err(PlanningError::EmptyQuery);
        }
        if let Some(fragment) = fragments.iter().find(|f| f.triples().is_empty()) {
            return Err(PlanningError::EmptyFragment(fragment.id()));
        }

        let components = Self::find_components(query, fragments);
        debug!(components = components.len(), "Finished naive component search");

        let plans = components
            .iter()
            .map(|component| {
                let fragments = component
                    .iter()
                    .map(|index| fragments[*index].clone())
                    .collect_vec();
                self.join_order.plan_fragments(&fragments)
            })
            .collect_vec();

        let plan = Fragment::union(plans);
        if plan.is_empty() {
            return Ok(Fragment::empty(query.variables()));
        }
        Ok(plan)
    }
}

fn is_adjacent(lhs: &Fragment, rhs: &Fragment, with_inputs: bool) -> bool {
    let shared = lhs
        .public_vars()
        .iter()
        .filter(|var| rhs.public_vars().contains(var))
        .collect_vec();
    if shared.is_empty()
        || is_subset(lhs.triples(), rhs.triples())
        || is_subset(rhs.triples(), lhs.triples())
    {
        return false;
    }

    !with_inputs
        || shared
            .iter()
            .any(|var| lhs.produces(var) || rhs.produces(var))
}

fn is_subset(lhs: &[TriplePattern], rhs: &[TriplePattern]) -> bool {
    lhs.iter().all(|pattern| rhs.contains(pattern))
}

fn add_fragment<'fragment>(
    state: &NaiveState<'fragment>,
    fragments: &'fragment [Fragment],
    candidate: usize,
) -> Option<NaiveState<'fragment>> {
    if state.nodes.contains(&candidate) {
        return None;
    }

    let fragment = &fragments[candidate];
    if !fragment
        .public_vars()
        .iter()
        .any(|var| state.vars.contains(var))
    {
        return None;
    }

    let triples = fragment.triples().iter().collect::<FxHashSet<_>>();
    if triples.is_subset(&state.triples) || triples.is_superset(&state.triples) {
        return None;
    }

    let makes_redundant = state.nodes.iter().any(|node| {
        fragments[*node].triples().iter().all(|pattern| {
            triples.contains(pattern)
                || state
                    .nodes
                    .iter()
                    .filter(|other| *other != node)
                    .any(|other| fragments[*other].triples().contains(pattern))
        })
    });
    if makes_redundant {
        return None;
    }

    let produced = state
        .nodes
        .iter()
        .flat_map(|node| fragments[*node].output_vars())
        .collect::<FxHashSet<_>>();

    let mut next = state.clone();
    next.nodes.insert(candidate);
    next.vars.extend(fragment.public_vars());
    next.triples.extend(triples);
    next.inputs.retain(|var| !fragment.produces(var));
    next.inputs.extend(
        fragment
            .input_vars()
            .iter()
            .filter(|var| !produced.contains(var)),
    );
    Some(next)
}
