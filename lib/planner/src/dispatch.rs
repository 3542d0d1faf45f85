use crate::components::InputsMode;
use crate::conjunctive::{BitsetConjunctivePlanner, ConjunctivePlanner};
use crate::join_order::{GreedyJoinOrderPlanner, JoinOrderPlanner};
use crate::naive::NaiveConjunctivePlanner;
use crate::{ConjunctiveQuery, Fragment, PlanResult, PlannerConfig};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::debug;

/// The planner a [ConjunctivePlannerDispatcher] uses for a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlannerRoute {
    /// The query has no universes, so the [NaiveConjunctivePlanner] is used.
    Fallback,
    NoInputs,
    WithInputs,
}

impl Display for PlannerRoute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PlannerRoute::Fallback => f.write_str("fallback"),
            PlannerRoute::NoInputs => f.write_str("no-inputs"),
            PlannerRoute::WithInputs => f.write_str("with-inputs"),
        }
    }
}

/// Selects the conjunctive planner for a query.
///
/// Queries without universes are planned by the [NaiveConjunctivePlanner]. Otherwise, the bit set
/// based search is used, considering inputs only if a fragment requires them.
#[derive(Debug, Clone)]
pub struct ConjunctivePlannerDispatcher {
    no_inputs: BitsetConjunctivePlanner,
    with_inputs: BitsetConjunctivePlanner,
    fallback: NaiveConjunctivePlanner,
}

impl ConjunctivePlannerDispatcher {
    pub fn new(config: PlannerConfig, join_order: Arc<dyn JoinOrderPlanner>) -> Self {
        Self {
            no_inputs: BitsetConjunctivePlanner::new(
                InputsMode::NoInputs,
                config,
                Arc::clone(&join_order),
            ),
            with_inputs: BitsetConjunctivePlanner::new(
                InputsMode::WithInputs,
                config,
                Arc::clone(&join_order),
            ),
            fallback: NaiveConjunctivePlanner::new(join_order),
        }
    }

    /// Decides which planner is responsible for `query`.
    pub fn route(query: &ConjunctiveQuery, fragments: &[Fragment]) -> PlannerRoute {
        if query.universes().is_none() {
            return PlannerRoute::Fallback;
        }

        match InputsMode::of(fragments) {
            InputsMode::NoInputs => PlannerRoute::NoInputs,
            InputsMode::WithInputs => PlannerRoute::WithInputs,
        }
    }
}

impl Default for ConjunctivePlannerDispatcher {
    fn default() -> Self {
        Self::new(
            PlannerConfig::default(),
            Arc::new(GreedyJoinOrderPlanner::default()),
        )
    }
}

impl ConjunctivePlanner for ConjunctivePlannerDispatcher {
    fn plan(&self, query: &ConjunctiveQuery, fragments: &[Fragment]) -> PlanResult<Fragment> {
        let route = Self::route(query, fragments);
        debug!(%route, fragments = fragments.len(), "Dispatching conjunctive query");
        match route {
            PlannerRoute::Fallback => self.fallback.plan(query, fragments),
            PlannerRoute::NoInputs => self.no_inputs.plan(query, fragments),
            PlannerRoute::WithInputs => self.with_inputs.plan(query, fragments),
        }
    }
}
