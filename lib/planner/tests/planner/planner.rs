use crate::test_utils::{api, chain, graph_of, source, triple};
use rdf_federation_model::{DataSource, TriplePattern};
use rdf_federation_planner::components::{find_components, InputsMode};
use rdf_federation_planner::join_order::GreedyJoinOrderPlanner;
use rdf_federation_planner::{
    BitsetConjunctivePlanner, ConjunctivePlanner, ConjunctivePlannerDispatcher, ConjunctiveQuery,
    Fragment, NaiveConjunctivePlanner, PlannerConfig, PlannerRoute, PlanningError,
};
use std::sync::Arc;

fn bitset_planner(mode: InputsMode, config: PlannerConfig) -> BitsetConjunctivePlanner {
    BitsetConjunctivePlanner::new(mode, config, Arc::new(GreedyJoinOrderPlanner::default()))
}

#[test]
fn test_alternative_plans_are_combined_in_union() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("y", "q", "z");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone()]);
    let fragments = [
        source("A", &[&t1]),
        source("B", &[&t2]),
        source("C", &[&t1, &t2]),
    ];

    assert_eq!(
        ConjunctivePlannerDispatcher::route(&query, &fragments),
        PlannerRoute::NoInputs
    );
    let plan = ConjunctivePlannerDispatcher::default()
        .plan(&query, &fragments)
        .unwrap();
    insta::assert_snapshot!(plan, @r"
    Union [?x ?y ?z]
      Join [?x ?y ?z]
        Source A [?x ?y]
        Source B [?y ?z]
      Source C [?x ?y ?z]
    ");
}

#[test]
fn test_common_subsets_are_shared_between_plans() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("y", "q", "z");
    let t3 = triple("z", "r", "w");
    let t4 = triple("w", "s", "v");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone(), t3.clone(), t4.clone()]);
    let fragments = [
        source("A", &[&t1]),
        source("B", &[&t2]),
        source("X", &[&t3, &t4]),
        source("Y", &[&t3]),
        source("Z", &[&t4]),
    ];

    let plan = ConjunctivePlannerDispatcher::default()
        .plan(&query, &fragments)
        .unwrap();
    insta::assert_snapshot!(plan, @r"
    Union [?z ?w ?v ?x ?y]
      Join [?z ?w ?v ?x ?y]
        Source X [?z ?w ?v]
        Join [?x ?y ?z]
          Source A [?x ?y]
          Source B [?y ?z]
      Join [?z ?w ?v ?x ?y]
        Join [?z ?w ?v]
          Source Y [?z ?w]
          Source Z [?w ?v]
        Join [?x ?y ?z]
          Source A [?x ?y]
          Source B [?y ?z]
    ");

    let alternatives = plan.children();
    assert_eq!(alternatives.len(), 2);
    assert_eq!(alternatives[0].children()[1], alternatives[1].children()[1]);
}

#[test]
fn test_sharing_can_be_disabled() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("y", "q", "z");
    let t3 = triple("z", "r", "w");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone(), t3.clone()]);
    let fragments = [
        source("A", &[&t1]),
        source("B", &[&t2]),
        source("X", &[&t3]),
        source("Y", &[&t3]),
    ];

    let planner = bitset_planner(
        InputsMode::NoInputs,
        PlannerConfig::default().with_share_common_subsets(false),
    );
    let plan = planner.plan(&query, &fragments).unwrap();
    let alternatives = plan.children();
    assert_eq!(alternatives.len(), 2);
    assert_ne!(alternatives[0].children()[0], alternatives[1].children()[0]);
    insta::assert_snapshot!(plan, @r"
    Union [?x ?y ?z ?w]
      Join [?x ?y ?z ?w]
        Join [?x ?y ?z]
          Source A [?x ?y]
          Source B [?y ?z]
        Source X [?z ?w]
      Join [?x ?y ?z ?w]
        Join [?x ?y ?z]
          Source A [?x ?y]
          Source B [?y ?z]
        Source Y [?z ?w]
    ");
}

#[test]
fn test_inputs_are_bound_by_other_fragments() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("y", "q", "z");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone()]);
    let fragments = [source("S", &[&t1]), api("W", &[&t2], &["y"])];

    assert_eq!(
        ConjunctivePlannerDispatcher::route(&query, &fragments),
        PlannerRoute::WithInputs
    );
    let plan = ConjunctivePlannerDispatcher::default()
        .plan(&query, &fragments)
        .unwrap();
    assert!(!plan.requires_inputs());
    insta::assert_snapshot!(plan, @r"
    Join [?x ?y ?z]
      Source S [?x ?y]
      Source W [?y ?z] inputs [?y]
    ");
}

#[test]
fn test_unbound_inputs_produce_empty_plan() {
    let t1 = triple("x", "p", "y");
    let query = ConjunctiveQuery::indexed([t1.clone()]);
    let fragments = [api("W", &[&t1], &["x"])];

    let plan = ConjunctivePlannerDispatcher::default()
        .plan(&query, &fragments)
        .unwrap();
    insta::assert_snapshot!(plan, @"Empty [?x ?y]");
}

#[test]
fn test_disconnected_query_is_cartesian_product() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("z", "q", "w");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone()]);
    let fragments = [source("A", &[&t1]), source("B", &[&t2])];

    let plan = ConjunctivePlannerDispatcher::default()
        .plan(&query, &fragments)
        .unwrap();
    insta::assert_snapshot!(plan, @r"
    Cartesian [?x ?y ?z ?w]
      Source A [?x ?y]
      Source B [?z ?w]
    ");
}

#[test]
fn test_fragment_spanning_disconnected_parts() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("z", "q", "w");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone()]);
    let fragments = [source("C", &[&t1, &t2])];

    let plan = ConjunctivePlannerDispatcher::default()
        .plan(&query, &fragments)
        .unwrap();
    insta::assert_snapshot!(plan, @"Source C [?x ?y ?z ?w]");
}

#[test]
fn test_uncovered_part_empties_cartesian_product() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("z", "q", "w");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone()]);
    let fragments = [source("A", &[&t1])];

    let plan = ConjunctivePlannerDispatcher::default()
        .plan(&query, &fragments)
        .unwrap();
    insta::assert_snapshot!(plan, @"Empty [?x ?y ?z ?w]");
}

#[test]
fn test_uncovered_query_produces_empty_plan() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("y", "q", "z");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2]);
    let fragments = [source("A", &[&t1])];

    let plan = ConjunctivePlannerDispatcher::default()
        .plan(&query, &fragments)
        .unwrap();
    assert!(plan.is_empty());
    insta::assert_snapshot!(plan, @"Empty [?x ?y ?z]");
}

#[test]
fn test_equal_fragments_are_grouped_before_search() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("y", "q", "z");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone()]);
    let fragments = [
        source("B1", &[&t1]),
        source("B2", &[&t2]),
        source("A1", &[&t1]),
        source("A2", &[&t2]),
    ];

    let plan = ConjunctivePlannerDispatcher::default()
        .plan(&query, &fragments)
        .unwrap();
    insta::assert_snapshot!(plan, @r"
    Join [?x ?y ?z]
      Union [?x ?y]
        Source A1 [?x ?y]
        Source B1 [?x ?y]
      Union [?y ?z]
        Source A2 [?y ?z]
        Source B2 [?y ?z]
    ");
}

#[test]
fn test_invalid_input_is_rejected() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("y", "q", "z");
    let dispatcher = ConjunctivePlannerDispatcher::default();

    let empty_query = ConjunctiveQuery::indexed(Vec::<TriplePattern>::new());
    assert!(matches!(
        dispatcher.plan(&empty_query, &[source("A", &[&t1])]),
        Err(PlanningError::EmptyQuery)
    ));

    let query = ConjunctiveQuery::indexed([t1.clone()]);
    let foreign = source("A", &[&t2]);
    assert!(matches!(
        dispatcher.plan(&query, &[foreign.clone()]),
        Err(PlanningError::ForeignTriple { fragment, .. }) if fragment == foreign.id()
    ));

    let empty = Fragment::source(Arc::new(DataSource::sparql_endpoint("E")), []);
    assert!(matches!(
        dispatcher.plan(&query, &[empty.clone()]),
        Err(PlanningError::EmptyFragment(id)) if id == empty.id()
    ));
}

#[test]
fn test_fragment_limit() {
    let t1 = triple("x", "p", "y");
    let query = ConjunctiveQuery::indexed([t1.clone()]);
    let fragments = [source("A", &[&t1]), source("B", &[&t1])];

    let planner = bitset_planner(
        InputsMode::NoInputs,
        PlannerConfig::default().with_max_fragments(1),
    );
    assert!(matches!(
        planner.plan(&query, &fragments),
        Err(PlanningError::TooManyFragments { count: 2, limit: 1 })
    ));
}

#[test]
fn test_bitset_planner_requires_universes() {
    let t1 = triple("x", "p", "y");
    let query = ConjunctiveQuery::new([t1.clone()]);

    let planner = bitset_planner(InputsMode::NoInputs, PlannerConfig::default());
    assert!(matches!(
        planner.plan(&query, &[source("A", &[&t1])]),
        Err(PlanningError::MissingUniverses)
    ));
}

/// Fragments over `t0 . t1 . t2 . t3` that match pairwise distinct sets of triples.
fn overlapping_chain_fragments(triples: &[TriplePattern]) -> Vec<Fragment> {
    let mut fragments = triples
        .iter()
        .enumerate()
        .map(|(i, triple)| source(&format!("a{i}"), &[triple]))
        .collect::<Vec<_>>();
    fragments.push(source("b0", &[&triples[0], &triples[1]]));
    fragments.push(source("b2", &[&triples[2], &triples[3]]));
    fragments.push(source("c", &[&triples[1], &triples[2]]));
    fragments
}

#[test]
fn test_naive_planner_finds_the_same_components() {
    let triples = chain(4);
    let fragments = overlapping_chain_fragments(&triples);
    let indexed = ConjunctiveQuery::indexed(triples.clone());
    let unindexed = ConjunctiveQuery::new(triples);

    let graph = graph_of(&indexed, &fragments);
    let expected = find_components(&graph)
        .iter()
        .map(|component| component.iter().collect::<Vec<_>>())
        .collect::<Vec<_>>();
    assert!(expected.len() > 1);
    assert_eq!(
        NaiveConjunctivePlanner::find_components(&unindexed, &fragments),
        expected
    );
}

#[test]
fn test_fallback_planner_agrees_with_bitset_planner() {
    let triples = chain(4);
    let fragments = overlapping_chain_fragments(&triples);
    let indexed = ConjunctiveQuery::indexed(triples.clone());
    let unindexed = ConjunctiveQuery::new(triples);

    assert_eq!(
        ConjunctivePlannerDispatcher::route(&unindexed, &fragments),
        PlannerRoute::Fallback
    );
    let config = PlannerConfig::default().with_share_common_subsets(false);
    let dispatcher =
        ConjunctivePlannerDispatcher::new(config, Arc::new(GreedyJoinOrderPlanner::default()));

    let fallback = dispatcher.plan(&unindexed, &fragments).unwrap();
    let bitset = dispatcher.plan(&indexed, &fragments).unwrap();
    assert_eq!(fallback.to_string(), bitset.to_string());
}
