use crate::join_order::{CardinalityEstimator, HeuristicCardinalityEstimator, JoinOrderPlanner};
use crate::Fragment;
use itertools::Itertools;
use rdf_federation_model::Variable;
use std::sync::Arc;

/// Plans joins by joining "cheap" fragments first.
///
/// The planner starts with the cheapest fragment that requires no inputs. Then, it repeatedly
/// joins the cheapest remaining fragment that shares a variable with the current plan and whose
/// inputs are all produced by the current plan. Ties are broken by the order of the fragments.
/// If no fragment can be joined, the next cheapest start is tried.
#[derive(Debug, Clone)]
pub struct GreedyJoinOrderPlanner {
    estimator: Arc<dyn CardinalityEstimator>,
}

impl GreedyJoinOrderPlanner {
    /// Creates a new [GreedyJoinOrderPlanner] that uses `estimator` for comparing fragments.
    pub fn new(estimator: Arc<dyn CardinalityEstimator>) -> Self {
        Self { estimator }
    }

    /// Greedily joins all `fragments`, starting with the fragment at index `first`.
    fn plan_from(&self, fragments: &[Fragment], first: usize) -> Option<Fragment> {
        let mut remaining = fragments.to_vec();
        let mut plan = remaining.remove(first);
        while !remaining.is_empty() {
            let next = self.pop_next_greedy(&plan, &mut remaining)?;
            plan = Fragment::join(plan, next);
        }
        Some(plan)
    }

    /// Finds the next fragment with the least cost that can be joined with `plan`.
    fn pop_next_greedy(&self, plan: &Fragment, remaining: &mut Vec<Fragment>) -> Option<Fragment> {
        let (index, _) = remaining
            .iter()
            .enumerate()
            .filter(|(_, fragment)| is_joinable(plan, fragment))
            .map(|(index, fragment)| (index, self.estimator.estimate(fragment)))
            .min_by_key(|&(_, cost)| cost)?;
        Some(remaining.remove(index))
    }
}

impl Default for GreedyJoinOrderPlanner {
    fn default() -> Self {
        Self::new(Arc::new(HeuristicCardinalityEstimator))
    }
}

impl JoinOrderPlanner for GreedyJoinOrderPlanner {
    fn plan_fragments(&self, fragments: &[Fragment]) -> Fragment {
        let vars = fragments
            .iter()
            .flat_map(Fragment::public_vars)
            .unique()
            .cloned()
            .collect::<Vec<Variable>>();

        // Starting with the cheapest fragment may leave an input that is only produced by a
        // fragment that can no longer be reached, so the other starts are tried as well.
        fragments
            .iter()
            .enumerate()
            .filter(|(_, fragment)| !fragment.requires_inputs())
            .map(|(index, fragment)| (index, self.estimator.estimate(fragment)))
            .sorted_by_key(|&(_, cost)| cost)
            .find_map(|(first, _)| self.plan_from(fragments, first))
            .unwrap_or_else(|| Fragment::empty(vars))
    }
}

/// Returns true if `fragment` shares a variable with `plan` and all its inputs are produced by
/// `plan`.
fn is_joinable(plan: &Fragment, fragment: &Fragment) -> bool {
    let shares_var = fragment
        .public_vars()
        .iter()
        .any(|var| plan.public_vars().contains(var));
    shares_var && fragment.input_vars().iter().all(|var| plan.produces(var))
}
