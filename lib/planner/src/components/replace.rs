use crate::components::JoinGraph;
use crate::join_order::JoinOrderPlanner;
use crate::{Fragment, PlanResult};
use rdf_federation_common::BitSet;
use tracing::debug;

/// A shared subset that has been planned and appended to the join graph.
#[derive(Clone, Debug)]
pub struct MaterializedSubset {
    /// The replaced nodes.
    pub subset: BitSet,
    /// The node of the planned fragment.
    pub node: usize,
    pub fragment: Fragment,
}

/// The result of [replace_shared].
#[derive(Clone, Debug)]
pub struct SharedReplacement {
    /// The rewritten components. They have the width of the grown join graph.
    pub components: Vec<BitSet>,
    pub materialized: Vec<MaterializedSubset>,
}

/// Plans every shared subset once and replaces its nodes in the components by the planned
/// fragment.
///
/// Each planned fragment is appended to `graph`. A component that contains all nodes of a shared
/// subset has these nodes replaced by the new node. Shared subsets that cannot be planned are
/// skipped. Once all subsets are processed, the edges of the new nodes are computed.
pub fn replace_shared(
    graph: &mut JoinGraph,
    components: Vec<BitSet>,
    shared: &[BitSet],
    planner: &dyn JoinOrderPlanner,
) -> PlanResult<SharedReplacement> {
    for subset in components.iter().chain(shared) {
        graph.check_subset(subset)?;
    }

    let mut components = components;
    let mut materialized = Vec::new();
    for subset in shared {
        let subset = subset.resized(graph.len());
        let fragment = planner.plan(graph, &subset);
        if fragment.is_empty() {
            debug!("Shared subset {subset:?} cannot be planned");
            continue;
        }

        #[cfg(debug_assertions)]
        let shadow = components.clone();

        let node = graph.push_fragment(fragment.clone())?;
        let width = graph.len();
        let subset = subset.resized(width);
        components = components
            .into_iter()
            .map(|component| {
                let mut component = component.resized(width);
                if component.is_superset(&subset) {
                    component.difference_with(&subset);
                    component.insert(node);
                }
                component
            })
            .collect();

        #[cfg(debug_assertions)]
        check_replacement(graph, &shadow, &components, &subset, node);

        debug!(node, fragment = %fragment.id(), "Materialized shared subset {subset:?}");
        materialized.push(MaterializedSubset {
            subset,
            node,
            fragment,
        });
    }

    graph.notify_added_nodes();
    Ok(SharedReplacement {
        components,
        materialized,
    })
}

/// Checks that every component that contained `subset` now contains `node` instead, that the
/// other components are unchanged, and that `node` matches the triples of `subset`.
#[cfg(debug_assertions)]
fn check_replacement(
    graph: &JoinGraph,
    before: &[BitSet],
    after: &[BitSet],
    subset: &BitSet,
    node: usize,
) {
    let width = graph.len();
    let subset = subset.resized(width);
    for (before, after) in before.iter().zip(after) {
        let mut expected = before.resized(width);
        if expected.is_superset(&subset) {
            expected.difference_with(&subset);
            expected.insert(node);
        }
        assert_eq!(&expected, after, "Invalid replacement of a shared subset.");
    }
    assert_eq!(
        graph.triples(node),
        &graph.triples_of(&subset),
        "The materialized fragment does not match the triples of the shared subset."
    );
}
