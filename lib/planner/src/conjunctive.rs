use crate::components::{
    find_common_subsets, find_components, replace_shared, InputsMode, JoinGraph,
};
use crate::grouping::group_fragments;
use crate::join_order::JoinOrderPlanner;
use crate::query::{groups_of, merge_roots};
use crate::{ConjunctiveQuery, Fragment, PlanResult, PlannerConfig, PlanningError};
use itertools::Itertools;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

/// Plans a conjunctive query from the fragments that match its triples.
pub trait ConjunctivePlanner: Debug + Send + Sync {
    /// Returns a plan that answers `query` using `fragments`.
    ///
    /// If the fragments cannot answer the query, the result is [Fragment::empty].
    fn plan(&self, query: &ConjunctiveQuery, fragments: &[Fragment]) -> PlanResult<Fragment>;
}

/// A [ConjunctivePlanner] that uses the bit set based component search.
///
/// The query must carry [QueryUniverses](crate::QueryUniverses). Each component of the
/// fragments is planned with the [JoinOrderPlanner], and the alternative plans are combined in a
/// union.
#[derive(Debug, Clone)]
pub struct BitsetConjunctivePlanner {
    mode: InputsMode,
    config: PlannerConfig,
    join_order: Arc<dyn JoinOrderPlanner>,
}

impl BitsetConjunctivePlanner {
    pub fn new(
        mode: InputsMode,
        config: PlannerConfig,
        join_order: Arc<dyn JoinOrderPlanner>,
    ) -> Self {
        Self {
            mode,
            config,
            join_order,
        }
    }

    pub fn mode(&self) -> InputsMode {
        self.mode
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn validate(&self, query: &ConjunctiveQuery, fragments: &[Fragment]) -> PlanResult<()> {
        if query.is_empty() {
            return Err(PlanningError::EmptyQuery);
        }
        let universes = query.try_universes()?;

        if let Some(limit) = self.config.max_fragments {
            if fragments.len() > limit {
                return Err(PlanningError::TooManyFragments {
                    count: fragments.len(),
                    limit,
                });
            }
        }

        for fragment in fragments {
            if fragment.triples().is_empty() {
                return Err(PlanningError::EmptyFragment(fragment.id()));
            }
            if let Some(pattern) = fragment
                .triples()
                .iter()
                .find(|pattern| !universes.triples().contains(pattern))
            {
                return Err(PlanningError::ForeignTriple {
                    fragment: fragment.id(),
                    pattern: pattern.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Splits the query into parts that share no variables and that are not spanned by a single
    /// fragment. Returns the parts with the fragments that match their triples.
    fn cartesian_parts(
        query: &ConjunctiveQuery,
        fragments: &[Fragment],
    ) -> Vec<(ConjunctiveQuery, Vec<Fragment>)> {
        let parts = query.join_connected_parts();
        let part_of = |fragment: &Fragment| {
            fragment
                .triples()
                .iter()
                .filter_map(|pattern| {
                    parts
                        .iter()
                        .position(|part| part.patterns().contains(pattern))
                })
                .collect_vec()
        };

        let mut parents = (0..parts.len()).collect_vec();
        for fragment in fragments {
            for (lhs, rhs) in part_of(fragment).into_iter().tuple_windows() {
                merge_roots(&mut parents, lhs, rhs);
            }
        }

        let part_groups = groups_of(&mut parents);
        let mut group_of_part = vec![0; parts.len()];
        for (group, members) in part_groups.iter().enumerate() {
            for part in members {
                group_of_part[*part] = group;
            }
        }

        let mut result = part_groups
            .iter()
            .map(|members| {
                let patterns = members
                    .iter()
                    .flat_map(|part| parts[*part].patterns())
                    .cloned();
                (ConjunctiveQuery::indexed(patterns), Vec::new())
            })
            .collect_vec();
        for fragment in fragments {
            if let Some(part) = part_of(fragment).first() {
                result[group_of_part[*part]].1.push(fragment.clone());
            }
        }
        result
    }

    /// Plans a query whose triples are connected by shared variables or by fragments.
    fn plan_connected(
        &self,
        query: &ConjunctiveQuery,
        fragments: &[Fragment],
    ) -> PlanResult<Fragment> {
        let universes = query.try_universes()?;
        let grouped = group_fragments(universes, fragments, self.mode)?;

        let mut covered = universes.triples().empty_subset();
        for fragment in &grouped {
            covered.union_with(&universes.triples().subset(fragment.triples())?);
        }
        if covered != universes.all_triples() {
            debug!(
                missing = universes.all_triples().difference(&covered).cardinality(),
                "Fragments do not cover the query"
            );
            return Ok(Fragment::empty(query.variables()));
        }

        let mut graph = JoinGraph::new(Arc::clone(universes), grouped, self.mode)?;
        let mut components = find_components(&graph);

        if self.config.share_common_subsets && components.len() > 1 {
            let shared = find_common_subsets(
                &graph,
                &components,
                self.join_order.as_ref(),
                self.config.scalar_fast_path,
            )?;
            if !shared.is_empty() {
                let replacement =
                    replace_shared(&mut graph, components, &shared, self.join_order.as_ref())?;
                components = replacement.components;
            }
        }

        let plans = components
            .iter()
            .map(|component| self.join_order.plan(&graph, component))
            .filter(|plan| {
                if plan.is_empty() {
                    debug!("Component cannot be planned");
                }
                !plan.is_empty()
            })
            .collect_vec();

        let plan = Fragment::union(plans);
        if plan.is_empty() {
            return Ok(Fragment::empty(query.variables()));
        }
        Ok(plan)
    }
}

impl ConjunctivePlanner for BitsetConjunctivePlanner {
    fn plan(&self, query: &ConjunctiveQuery, fragments: &[Fragment]) -> PlanResult<Fragment> {
        self.validate(query, fragments)?;

        let parts = Self::cartesian_parts(query, fragments);
        if parts.len() == 1 {
            return self.plan_connected(query, fragments);
        }

        debug!(parts = parts.len(), "Planning cartesian product");
        let mut plans = Vec::with_capacity(parts.len());
        for (part, part_fragments) in parts {
            let plan = self.plan_connected(&part, &part_fragments)?;
            if plan.is_empty() {
                return Ok(Fragment::empty(query.variables()));
            }
            plans.push(plan);
        }
        Ok(Fragment::cartesian(plans))
    }
}
