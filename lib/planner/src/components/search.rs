use crate::components::{JoinGraph, SearchState, StateHelper};
use rdf_federation_common::BitSet;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

/// Finds all components of `graph`.
///
/// A component is a connected set of nodes that matches every triple of the query, without a
/// node whose triples are all matched by the other nodes. The components are returned in
/// ascending order of their node indices.
pub fn find_components(graph: &JoinGraph) -> Vec<BitSet> {
    ComponentSearch::new(graph).run()
}

/// A depth-first search over [SearchState]s that discovers the components of a [JoinGraph].
///
/// The search uses an explicit stack, so its depth is not limited by the call stack. States that
/// were already reached from another path or another starting node are not explored again.
#[derive(Debug)]
pub struct ComponentSearch<'graph> {
    helper: StateHelper<'graph>,
    restriction: Option<BitSet>,
}

impl<'graph> ComponentSearch<'graph> {
    pub fn new(graph: &'graph JoinGraph) -> Self {
        Self {
            helper: StateHelper::new(graph),
            restriction: None,
        }
    }

    /// Only considers the nodes of `subset`.
    #[must_use]
    pub fn restricted_to(mut self, subset: BitSet) -> Self {
        assert_eq!(
            subset.width(),
            self.helper.graph().len(),
            "Node subset does not belong to this join graph."
        );
        self.restriction = Some(subset);
        self
    }

    /// Searches from every (allowed) node of the graph.
    ///
    /// An unrestricted search expects the fragments of the graph to cover the query. A
    /// restricted search over nodes that do not cover the query finds no component.
    pub fn run(&self) -> Vec<BitSet> {
        let graph = self.helper.graph();
        debug_assert!(
            self.restriction.is_some()
                || graph.triples_of(&BitSet::full(graph.len())) == graph.universes().all_triples(),
            "The fragments of the join graph do not cover the query."
        );

        let starts = (0..graph.len()).filter(|node| self.is_allowed(*node));
        self.search(starts)
    }

    /// Searches from `start` only.
    pub fn run_from(&self, start: usize) -> Vec<BitSet> {
        if self.is_allowed(start) {
            self.search([start])
        } else {
            Vec::new()
        }
    }

    fn is_allowed(&self, node: usize) -> bool {
        match &self.restriction {
            Some(restriction) => restriction.contains(node),
            None => true,
        }
    }

    fn search(&self, starts: impl IntoIterator<Item = usize>) -> Vec<BitSet> {
        let graph = self.helper.graph();
        let mut seen: FxHashSet<SearchState> = FxHashSet::default();
        let mut components: FxHashSet<BitSet> = FxHashSet::default();
        let mut stack = Vec::new();
        let mut explored = 0_usize;
        let mut started = 0_usize;

        for start in starts {
            let initial = self.helper.initial_state(start);
            if !seen.insert(initial.clone()) {
                continue;
            }
            started += 1;
            stack.push(initial);

            while let Some(state) = stack.pop() {
                explored += 1;
                if self.helper.is_final(&state) {
                    let nodes = self.helper.nodes(&state);
                    trace!("Discovered component {nodes:?}");
                    components.insert(nodes);
                    continue;
                }

                let mut tried = graph.empty_subset();
                for node in self.helper.node_iter(&state) {
                    for &neighbor in graph.neighbors(node) {
                        if !self.is_allowed(neighbor) || !tried.insert(neighbor) {
                            continue;
                        }

                        if let Some(next) = self.helper.add_fragment(&state, neighbor) {
                            if seen.insert(next.clone()) {
                                stack.push(next);
                            }
                        }
                    }
                }
            }
        }

        let mut components = components.into_iter().collect::<Vec<_>>();
        components.sort_by_cached_key(|component| component.iter().collect::<Vec<_>>());
        debug!(
            started,
            explored,
            components = components.len(),
            "Finished component search"
        );
        components
    }
}
