//! The component search of the conjunctive planners.
//!
//! Given a set of fragments, the search finds every minimal, connected set of fragments that
//! matches all triples of a query (a component). Fragment subsets that are part of multiple
//! components can then be planned once and shared between them.

mod graph;
mod replace;
mod search;
mod sharing;
mod state;

pub use graph::*;
pub use replace::*;
pub use search::*;
pub use sharing::{find_common_subsets, find_common_subsets_general, find_common_subsets_scalar};
pub use state::*;
