/// Configures the bit set based conjunctive planners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Whether fragment subsets that are part of multiple components are planned once and
    /// shared between the components.
    pub share_common_subsets: bool,
    /// Whether the common subsets are searched on single machine words if the fragment universe
    /// is small enough.
    pub scalar_fast_path: bool,
    /// The maximum number of fragments of a single query.
    ///
    /// The component search is exponential in the number of fragments in the worst case, so
    /// federation layers should bound it.
    pub max_fragments: Option<usize>,
}

impl PlannerConfig {
    #[must_use]
    pub fn with_share_common_subsets(mut self, share_common_subsets: bool) -> Self {
        self.share_common_subsets = share_common_subsets;
        self
    }

    #[must_use]
    pub fn with_scalar_fast_path(mut self, scalar_fast_path: bool) -> Self {
        self.scalar_fast_path = scalar_fast_path;
        self
    }

    #[must_use]
    pub fn with_max_fragments(mut self, max_fragments: usize) -> Self {
        self.max_fragments = Some(max_fragments);
        self
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            share_common_subsets: true,
            scalar_fast_path: true,
            max_fragments: None,
        }
    }
}
