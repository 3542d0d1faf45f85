use crate::{PlanResult, PlanningError};
use rdf_federation_common::{BitSet, IndexedSet, UniverseError};
use rdf_federation_model::{pattern_variables, TriplePattern, Variable};
use std::sync::Arc;

/// The indexed triple patterns and variables of a query.
///
/// Bit sets over triples and variables that are used while planning the query refer to these
/// universes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryUniverses {
    triples: IndexedSet<TriplePattern>,
    variables: IndexedSet<Variable>,
}

impl QueryUniverses {
    pub fn new(triples: IndexedSet<TriplePattern>, variables: IndexedSet<Variable>) -> Self {
        Self { triples, variables }
    }

    /// Indexes `patterns` and their variables in order of appearance.
    pub fn from_patterns<'pattern>(
        patterns: impl IntoIterator<Item = &'pattern TriplePattern>,
    ) -> Self {
        let triples: IndexedSet<TriplePattern> = patterns.into_iter().cloned().collect();
        let variables = triples.iter().flat_map(pattern_variables).collect();
        Self { triples, variables }
    }

    pub fn triples(&self) -> &IndexedSet<TriplePattern> {
        &self.triples
    }

    pub fn variables(&self) -> &IndexedSet<Variable> {
        &self.variables
    }

    /// A bit set that contains every triple of the query.
    pub fn all_triples(&self) -> BitSet {
        self.triples.full_subset()
    }
}

/// A basic graph pattern whose triple patterns are answered by a set of fragments.
///
/// The bit set based planners require the query to carry [QueryUniverses].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConjunctiveQuery {
    patterns: Vec<TriplePattern>,
    universes: Option<Arc<QueryUniverses>>,
}

impl ConjunctiveQuery {
    /// Creates a query without universes. Duplicate patterns are removed.
    pub fn new(patterns: impl IntoIterator<Item = TriplePattern>) -> Self {
        let patterns: IndexedSet<TriplePattern> = patterns.into_iter().collect();
        Self {
            patterns: patterns.as_slice().to_vec(),
            universes: None,
        }
    }

    /// Creates a query and indexes its triples and variables.
    pub fn indexed(patterns: impl IntoIterator<Item = TriplePattern>) -> Self {
        let query = Self::new(patterns);
        let universes = QueryUniverses::from_patterns(&query.patterns);
        Self {
            universes: Some(Arc::new(universes)),
            ..query
        }
    }

    /// Attaches existing universes to this query.
    ///
    /// Returns an error if a pattern or one of its variables is not part of `universes`.
    pub fn with_universes(self, universes: Arc<QueryUniverses>) -> PlanResult<Self> {
        for pattern in &self.patterns {
            if !universes.triples().contains(pattern) {
                return Err(UniverseError::UnknownElement(pattern.to_string()).into());
            }
            universes
                .variables()
                .subset(pattern_variables(pattern).iter())?;
        }

        Ok(Self {
            universes: Some(universes),
            ..self
        })
    }

    pub fn patterns(&self) -> &[TriplePattern] {
        &self.patterns
    }

    pub fn universes(&self) -> Option<&Arc<QueryUniverses>> {
        self.universes.as_ref()
    }

    /// Returns the universes or [PlanningError::MissingUniverses].
    pub fn try_universes(&self) -> PlanResult<&Arc<QueryUniverses>> {
        self.universes().ok_or(PlanningError::MissingUniverses)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The distinct variables of the query in order of appearance.
    pub fn variables(&self) -> Vec<Variable> {
        let variables: IndexedSet<Variable> =
            self.patterns.iter().flat_map(pattern_variables).collect();
        variables.as_slice().to_vec()
    }

    /// Partitions the patterns into parts that are connected by shared variables.
    ///
    /// The parts keep the order of the patterns and are indexed iff this query is indexed.
    pub fn join_connected_parts(&self) -> Vec<ConjunctiveQuery> {
        let groups = connected_groups(&self.patterns, |lhs, rhs| {
            let lhs = pattern_variables(lhs);
            pattern_variables(rhs).iter().any(|var| lhs.contains(var))
        });

        groups
            .into_iter()
            .map(|group| {
                let patterns = group.into_iter().map(|i| self.patterns[i].clone());
                if self.universes.is_some() {
                    Self::indexed(patterns)
                } else {
                    Self::new(patterns)
                }
            })
            .collect()
    }
}

/// Groups the indices of `items` into the connected components of the relation `connected`.
///
/// Groups are ordered by their first element and contain ascending indices.
pub(crate) fn connected_groups<T>(
    items: &[T],
    connected: impl Fn(&T, &T) -> bool,
) -> Vec<Vec<usize>> {
    let mut parents = (0..items.len()).collect::<Vec<_>>();
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            if connected(&items[i], &items[j]) {
                merge_roots(&mut parents, i, j);
            }
        }
    }
    groups_of(&mut parents)
}

pub(crate) fn merge_roots(parents: &mut [usize], lhs: usize, rhs: usize) {
    let lhs = find_root(parents, lhs);
    let rhs = find_root(parents, rhs);
    if lhs != rhs {
        parents[lhs.max(rhs)] = lhs.min(rhs);
    }
}

pub(crate) fn find_root(parents: &mut [usize], mut node: usize) -> usize {
    while parents[node] != node {
        parents[node] = parents[parents[node]];
        node = parents[node];
    }
    node
}

pub(crate) fn groups_of(parents: &mut [usize]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of_root = vec![usize::MAX; parents.len()];
    for node in 0..parents.len() {
        let root = find_root(parents, node);
        if group_of_root[root] == usize::MAX {
            group_of_root[root] = groups.len();
            groups.push(Vec::new());
        }
        groups[group_of_root[root]].push(node);
    }
    groups
}
