use crate::test_utils::{api, chain, graph_of, names, source, triple};
use proptest::prelude::*;
use rdf_federation_common::BitSet;
use rdf_federation_model::TriplePattern;
use rdf_federation_planner::components::{
    find_common_subsets, find_common_subsets_general, find_common_subsets_scalar,
    find_components, replace_shared, JoinGraph,
};
use rdf_federation_planner::join_order::{GreedyJoinOrderPlanner, JoinOrderPlanner};
use rdf_federation_planner::{ConjunctiveQuery, Fragment};
use std::collections::BTreeSet;

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

/// Checks the properties that every result of the common subset extraction must have.
fn assert_valid_common_subsets(graph: &JoinGraph, subsets: &[BitSet]) {
    for (i, subset) in subsets.iter().enumerate() {
        assert!(subset.cardinality() >= 2, "{subset:?} is too small.");
        assert!(graph.is_connected(subset), "{subset:?} is not connected.");
        for other in &subsets[i + 1..] {
            assert!(!subset.intersects(other), "{subset:?} overlaps {other:?}.");
        }
    }
}

#[test]
fn test_shared_subset_is_materialized_once() {
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
    let mut graph = graph_of(&query, &fragments);

    let components = find_components(&graph);
    assert_eq!(
        components,
        vec![graph.node_subset([0, 1, 2]), graph.node_subset([0, 1, 3])]
    );

    let planner = GreedyJoinOrderPlanner::default();
    let shared = find_common_subsets(&graph, &components, &planner, true).unwrap();
    assert_eq!(shared, vec![graph.node_subset([0, 1])]);

    let replacement = replace_shared(&mut graph, components, &shared, &planner).unwrap();
    assert_eq!(graph.len(), 5);
    assert_eq!(replacement.materialized.len(), 1);

    let materialized = &replacement.materialized[0];
    assert_eq!(materialized.node, 4);
    assert_eq!(graph.fragment(4), &materialized.fragment);
    assert_eq!(
        graph.triples(4),
        &graph.triples_of(&graph.node_subset([0, 1]))
    );
    assert_eq!(
        replacement.components,
        vec![graph.node_subset([2, 4]), graph.node_subset([3, 4])]
    );
    assert!(replacement
        .components
        .iter()
        .all(|component| graph.is_connected(component)));
    insta::assert_snapshot!(materialized.fragment, @r"
    Join [?x ?y ?z]
      Source A [?x ?y]
      Source B [?y ?z]
    ");
}

#[test]
fn test_components_without_full_subset_are_untouched() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("y", "q", "z");
    let t3 = triple("z", "r", "w");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone(), t3.clone()]);
    let fragments = [
        source("A", &[&t1]),
        source("B", &[&t2]),
        source("X", &[&t3]),
        source("Y", &[&t3]),
        source("C", &[&t1, &t2]),
    ];
    let mut graph = graph_of(&query, &fragments);

    let components = find_components(&graph);
    let shared = [graph.node_subset([0, 1])];
    let replacement = replace_shared(
        &mut graph,
        components.clone(),
        &shared,
        &GreedyJoinOrderPlanner::default(),
    )
    .unwrap();

    let node = replacement.materialized[0].node;
    for (before, after) in components.iter().zip(&replacement.components) {
        let before = before.resized(graph.len());
        if before.is_superset(&shared[0].resized(graph.len())) {
            assert!(after.contains(node));
            assert!(!after.intersects(&shared[0].resized(graph.len())));
        } else {
            assert_eq!(&before, after);
        }
    }

    let replaced = replacement
        .components
        .iter()
        .map(|component| names(&graph, component))
        .collect::<BTreeSet<_>>();
    assert!(replaced.contains(&set(&["C", "X"])));
    assert!(replaced.contains(&set(&["C", "Y"])));
}

#[test]
fn test_general_path_beyond_a_single_word() {
    // 66 triples with a single source each and two more sources for the first and the last
    // triple, i.e., 70 fragments and nine components.
    let triples = chain(66);
    let query = ConjunctiveQuery::indexed(triples.clone());
    let mut fragments = triples
        .iter()
        .enumerate()
        .map(|(i, triple)| source(&format!("a{i}"), &[triple]))
        .collect::<Vec<_>>();
    fragments.push(source("b0", &[&triples[0]]));
    fragments.push(source("c0", &[&triples[0]]));
    fragments.push(source("b65", &[&triples[65]]));
    fragments.push(source("c65", &[&triples[65]]));
    let graph = graph_of(&query, &fragments);
    assert_eq!(graph.len(), 70);

    let components = find_components(&graph);
    assert_eq!(components.len(), 9);
    let planner = GreedyJoinOrderPlanner::default();
    assert!(find_common_subsets_scalar(&graph, &components, &planner)
        .unwrap()
        .is_none());

    let subsets = find_common_subsets(&graph, &components, &planner, true).unwrap();
    assert_valid_common_subsets(&graph, &subsets);
    assert_eq!(subsets, vec![graph.node_subset(0..65)]);
}

#[test]
fn test_subsets_of_foreign_components_are_rejected() {
    let t1 = triple("x", "p", "y");
    let query = ConjunctiveQuery::indexed([t1.clone()]);
    let graph = graph_of(&query, &[source("A", &[&t1])]);

    let planner = GreedyJoinOrderPlanner::default();
    let result = find_common_subsets(&graph, &[BitSet::new(3)], &planner, true);
    assert!(result.is_err());
}

#[test]
fn test_narrow_components_of_wide_graphs_are_rejected() {
    let triples = chain(66);
    let query = ConjunctiveQuery::indexed(triples.clone());
    let fragments = triples
        .iter()
        .enumerate()
        .map(|(i, triple)| source(&format!("a{i}"), &[triple]))
        .collect::<Vec<_>>();
    let graph = graph_of(&query, &fragments);
    assert_eq!(graph.len(), 66);

    let planner = GreedyJoinOrderPlanner::default();
    let components = [BitSet::new(3), BitSet::new(3)];
    assert!(find_common_subsets_scalar(&graph, &components, &planner).is_err());
    assert!(find_common_subsets_general(&graph, &components, &planner).is_err());
    assert!(find_common_subsets(&graph, &components, &planner, true).is_err());
}

#[test]
fn test_unplannable_common_subsets_are_not_shared() {
    // "W" needs ?z as an input, which only the fragments outside of the common subset produce.
    let t1 = triple("x", "p", "y");
    let t2 = triple("y", "q", "z");
    let t3 = triple("z", "r", "w");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone(), t3.clone()]);
    let fragments = [
        source("A", &[&t1]),
        api("W", &[&t2], &["z"]),
        source("X1", &[&t3]),
        source("X2", &[&t3]),
    ];
    let graph = graph_of(&query, &fragments);

    let components = find_components(&graph);
    assert_eq!(
        components,
        vec![graph.node_subset([0, 1, 2]), graph.node_subset([0, 1, 3])]
    );
    assert!(graph.is_connected(&graph.node_subset([0, 1])));

    let planner = GreedyJoinOrderPlanner::default();
    assert!(planner.plan(&graph, &graph.node_subset([0, 1])).is_empty());
    for component in &components {
        assert!(!planner.plan(&graph, component).is_empty());
    }

    assert!(find_common_subsets(&graph, &components, &planner, true)
        .unwrap()
        .is_empty());
    assert!(find_common_subsets(&graph, &components, &planner, false)
        .unwrap()
        .is_empty());
}

/// The chain query `t0 . ... . t5` with single-triple fragments from "a" and optional fragments
/// that cover one to three triples.
fn chain_with_optional_fragments(mask: &[bool]) -> (ConjunctiveQuery, Vec<Fragment>) {
    let triples = chain(6);
    let query = ConjunctiveQuery::indexed(triples.clone());

    let mut fragments = triples
        .iter()
        .enumerate()
        .map(|(i, triple)| source(&format!("a{i}"), &[triple]))
        .collect::<Vec<_>>();

    let mut optional: Vec<Fragment> = Vec::new();
    for (i, triple) in triples.iter().enumerate() {
        optional.push(source(&format!("c{i}"), &[triple]));
    }
    for len in 2..=3 {
        for start in 0..=(triples.len() - len) {
            let window = triples[start..start + len].iter().collect::<Vec<&TriplePattern>>();
            optional.push(source(&format!("b{start}_{len}"), &window));
        }
    }

    fragments.extend(
        optional
            .into_iter()
            .zip(mask)
            .filter(|(_, selected)| **selected)
            .map(|(fragment, _)| fragment),
    );
    (query, fragments)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_scalar_and_general_paths_agree(mask in prop::collection::vec(any::<bool>(), 15)) {
        let (query, fragments) = chain_with_optional_fragments(&mask);
        let graph = graph_of(&query, &fragments);
        let components = find_components(&graph);

        let planner = GreedyJoinOrderPlanner::default();
        let scalar = find_common_subsets_scalar(&graph, &components, &planner).unwrap();
        let general = find_common_subsets_general(&graph, &components, &planner).unwrap();
        prop_assert_eq!(scalar.as_ref(), Some(&general));
        assert_valid_common_subsets(&graph, &general);
    }

    #[test]
    fn test_replacement_keeps_components_plannable(mask in prop::collection::vec(any::<bool>(), 15)) {
        let (query, fragments) = chain_with_optional_fragments(&mask);
        let mut graph = graph_of(&query, &fragments);
        let components = find_components(&graph);
        let planner = GreedyJoinOrderPlanner::default();
        let shared = find_common_subsets(&graph, &components, &planner, true).unwrap();

        let replacement = replace_shared(&mut graph, components, &shared, &planner).unwrap();
        let all_triples = query.universes().unwrap().all_triples();
        for component in &replacement.components {
            prop_assert_eq!(&graph.triples_of(component), &all_triples);
            prop_assert!(!planner.plan(&graph, component).is_empty());
        }
    }
}
