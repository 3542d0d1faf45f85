//! Turns a set of fragments into a join tree.

mod cardinality;
mod greedy;

pub use cardinality::*;
pub use greedy::*;

use crate::components::JoinGraph;
use crate::Fragment;
use rdf_federation_common::BitSet;
use std::fmt::Debug;

/// Plans the join order of a fixed set of fragments.
///
/// If the fragments cannot be joined (e.g., they are not connected or the required inputs of a
/// fragment are never produced), the planner returns [Fragment::empty].
pub trait JoinOrderPlanner: Debug + Send + Sync {
    /// Joins all `fragments` into a single fragment.
    fn plan_fragments(&self, fragments: &[Fragment]) -> Fragment;

    /// Joins the fragments of the nodes in `subset`.
    fn plan(&self, graph: &JoinGraph, subset: &BitSet) -> Fragment {
        self.plan_fragments(&graph.fragments_of(subset))
    }
}
