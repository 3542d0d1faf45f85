use crate::fragment::FragmentId;
use rdf_federation_common::UniverseError;
use thiserror::Error;

/// A result whose error is a [PlanningError].
pub type PlanResult<T> = Result<T, PlanningError>;

/// An error that prevents a conjunctive query from being planned.
///
/// Note that a query that simply cannot be answered by the given fragments is not an error. In
/// this case, the planners return [Fragment::empty](crate::Fragment::empty).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlanningError {
    /// A bit set or an element did not belong to the universe it was used with.
    #[error(transparent)]
    Universe(#[from] UniverseError),
    #[error("Cannot plan a query without triple patterns.")]
    EmptyQuery,
    /// The query was not indexed, so the bit set based planners cannot be used.
    #[error("The query carries no triple and variable universes.")]
    MissingUniverses,
    #[error("Fragment {0} does not match any triple pattern.")]
    EmptyFragment(FragmentId),
    /// A fragment matches a triple pattern that is not part of the planned query.
    #[error("Fragment {fragment} matches a triple pattern that is not part of the query: {pattern}")]
    ForeignTriple {
        fragment: FragmentId,
        pattern: String,
    },
    /// The number of fragments exceeds [PlannerConfig::max_fragments](crate::PlannerConfig).
    #[error("Planning {count} fragments exceeds the configured limit of {limit}.")]
    TooManyFragments { count: usize, limit: usize },
}
