use crate::{Fragment, FragmentKind};
use rdf_federation_model::{
    is_object_bound, is_predicate_bound, is_subject_bound, pattern_variables, NamedNodePattern,
    TermPattern, TriplePattern, Variable,
};
use std::fmt::Debug;

/// Estimates the number of results of a fragment.
pub trait CardinalityEstimator: Debug + Send + Sync {
    fn estimate(&self, fragment: &Fragment) -> usize;
}

/// Estimates cardinalities without statistics, based on which positions of the triple patterns
/// are bound.
///
/// Variables that a fragment requires as inputs are considered bound.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicCardinalityEstimator;

impl CardinalityEstimator for HeuristicCardinalityEstimator {
    fn estimate(&self, fragment: &Fragment) -> usize {
        match fragment.kind() {
            FragmentKind::Source(_) => {
                estimate_patterns(fragment.triples(), fragment.input_vars())
            }
            FragmentKind::Join(lhs, rhs) => estimate_join(
                self.estimate(lhs),
                self.estimate(rhs),
                shared_var_count(lhs.public_vars(), rhs.public_vars()),
            ),
            FragmentKind::Union(children) => children
                .iter()
                .map(|child| self.estimate(child))
                .fold(0, usize::saturating_add),
            FragmentKind::Cartesian(children) => children
                .iter()
                .map(|child| self.estimate(child))
                .fold(1, usize::saturating_mul),
            FragmentKind::Empty => 0,
        }
    }
}

/// Estimates the patterns of a single source as if they were joined in the given order.
fn estimate_patterns(patterns: &[TriplePattern], inputs: &[Variable]) -> usize {
    let mut vars: Vec<Variable> = Vec::new();
    let mut result = None;
    for pattern in patterns {
        let pattern_vars = pattern_variables(pattern);
        let estimate = estimate_pattern(pattern, inputs);
        result = Some(match result {
            None => estimate,
            Some(current) => {
                estimate_join(current, estimate, shared_var_count(&vars, &pattern_vars))
            }
        });
        vars.extend(pattern_vars);
    }
    result.unwrap_or(0)
}

/// Estimates the cardinality of a join.
///
/// This uses the heuristics from Oxigraph's join reordering.
fn estimate_join(lhs: usize, rhs: usize, shared_vars: usize) -> usize {
    let shared_vars = u32::try_from(shared_vars).unwrap_or(u32::MAX);
    lhs.saturating_mul(rhs)
        .saturating_div(1_000_usize.saturating_pow(shared_vars))
}

/// Estimates the cardinality of a single triple pattern.
///
/// This uses the heuristics from Oxigraph's join reordering.
fn estimate_pattern(pattern: &TriplePattern, inputs: &[Variable]) -> usize {
    let subject_bound = is_subject_bound(pattern) || is_input_term(&pattern.subject, inputs);
    let predicate_bound = is_predicate_bound(pattern)
        || matches!(&pattern.predicate, NamedNodePattern::Variable(var) if inputs.contains(var));
    let object_bound = is_object_bound(pattern) || is_input_term(&pattern.object, inputs);

    match (subject_bound, predicate_bound, object_bound) {
        (true, true, true) => 1,
        (true, true, false) => 10,
        (true, false, true) => 2,
        (false, true, true) => 10_000,
        (true, false, false) => 100,
        (false, false, false) => 1_000_000_000,
        (false, true, false) => 1_000_000,
        (false, false, true) => 100_000,
    }
}

fn is_input_term(term: &TermPattern, inputs: &[Variable]) -> bool {
    matches!(term, TermPattern::Variable(var) if inputs.contains(var))
}

fn shared_var_count(lhs: &[Variable], rhs: &[Variable]) -> usize {
    lhs.iter().filter(|var| rhs.contains(var)).count()
}
