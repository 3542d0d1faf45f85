use crate::{NamedNodePattern, TermPattern, TriplePattern, Variable};

/// Returns the distinct variables of `pattern` in subject, predicate, object order.
///
/// Blank nodes are not reported even though they behave like variables during evaluation, as
/// they can never be shared with another pattern.
pub fn pattern_variables(pattern: &TriplePattern) -> Vec<Variable> {
    let candidates = [
        term_variable(&pattern.subject),
        predicate_variable(&pattern.predicate),
        term_variable(&pattern.object),
    ];

    let mut result: Vec<Variable> = Vec::with_capacity(candidates.len());
    for variable in candidates.into_iter().flatten() {
        if !result.contains(variable) {
            result.push(variable.clone());
        }
    }
    result
}

/// Returns true if the subject of `pattern` is a constant.
pub fn is_subject_bound(pattern: &TriplePattern) -> bool {
    is_term_bound(&pattern.subject)
}

/// Returns true if the predicate of `pattern` is a constant.
pub fn is_predicate_bound(pattern: &TriplePattern) -> bool {
    matches!(&pattern.predicate, NamedNodePattern::NamedNode(_))
}

/// Returns true if the object of `pattern` is a constant.
pub fn is_object_bound(pattern: &TriplePattern) -> bool {
    is_term_bound(&pattern.object)
}

fn is_term_bound(term: &TermPattern) -> bool {
    matches!(term, TermPattern::NamedNode(_) | TermPattern::Literal(_))
}

fn term_variable(term: &TermPattern) -> Option<&Variable> {
    if let TermPattern::Variable(variable) = term {
        Some(variable)
    } else {
        None
    }
}

fn predicate_variable(predicate: &NamedNodePattern) -> Option<&Variable> {
    if let NamedNodePattern::Variable(variable) = predicate {
        Some(variable)
    } else {
        None
    }
}
