use crate::test_utils::{api, chain, graph_of, names, source, triple};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rdf_federation_common::BitSet;
use rdf_federation_model::TriplePattern;
use rdf_federation_planner::components::{find_components, ComponentSearch, JoinGraph};
use rdf_federation_planner::{ConjunctiveQuery, Fragment};
use std::collections::BTreeSet;

fn component_names(graph: &JoinGraph, components: &[BitSet]) -> BTreeSet<BTreeSet<String>> {
    components
        .iter()
        .map(|component| names(graph, component))
        .collect()
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

/// Fragments over the chain `t0 . t1 . ... . t5` with several ways to cover each part.
fn chain_fragments(triples: &[TriplePattern]) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    for (i, triple) in triples.iter().enumerate() {
        fragments.push(source(&format!("a{i}"), &[triple]));
    }
    for i in 0..triples.len() - 1 {
        if i % 2 == 0 {
            fragments.push(source(&format!("b{i}"), &[&triples[i], &triples[i + 1]]));
        }
    }
    fragments.push(source("c", &[&triples[1], &triples[2], &triples[3]]));
    fragments
}

#[test]
fn test_alternative_sources_are_separate_components() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("y", "q", "z");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone()]);
    let fragments = [
        source("A", &[&t1]),
        source("B", &[&t2]),
        source("C", &[&t1, &t2]),
    ];

    let graph = graph_of(&query, &fragments);
    let components = find_components(&graph);
    assert_eq!(
        component_names(&graph, &components),
        BTreeSet::from([set(&["A", "B"]), set(&["C"])])
    );
}

#[test]
fn test_subsumed_fragments_are_never_combined() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("y", "q", "z");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone()]);
    let fragments = [
        source("D", &[&t1]),
        source("E", &[&t1, &t2]),
        source("B", &[&t2]),
    ];

    let graph = graph_of(&query, &fragments);
    let components = component_names(&graph, &find_components(&graph));
    assert_eq!(components, BTreeSet::from([set(&["B", "D"]), set(&["E"])]));
    assert!(components
        .iter()
        .all(|component| !(component.contains("D") && component.contains("E"))));
}

#[test]
fn test_uncoverable_inputs_prevent_components() {
    let t1 = triple("x", "p", "y");
    let t2 = triple("y", "q", "z");
    let query = ConjunctiveQuery::indexed([t1.clone(), t2.clone()]);
    let fragments = [
        source("S", &[&t1]),
        api("W", &[&t2], &["y"]),
        api("V", &[&t1], &["x"]),
    ];

    let graph = graph_of(&query, &fragments);
    let components = component_names(&graph, &find_components(&graph));
    assert_eq!(components, BTreeSet::from([set(&["S", "W"])]));
}

#[test]
fn test_components_cover_the_query_without_redundancy() {
    let triples = chain(6);
    let query = ConjunctiveQuery::indexed(triples.clone());
    let fragments = chain_fragments(&triples);
    let graph = graph_of(&query, &fragments);
    let all_triples = query.universes().unwrap().all_triples();

    let components = find_components(&graph);
    assert!(components.len() > 1);
    for component in &components {
        assert_eq!(graph.triples_of(component), all_triples);

        for node in component {
            let mut without = component.clone();
            without.remove(node);
            assert_ne!(
                graph.triples_of(&without),
                all_triples,
                "Node {node} of {component:?} is redundant."
            );
        }
    }
}

#[test]
fn test_components_are_reached_from_each_of_their_nodes() {
    let triples = chain(6);
    let query = ConjunctiveQuery::indexed(triples.clone());
    let fragments = chain_fragments(&triples);
    let graph = graph_of(&query, &fragments);

    for component in find_components(&graph) {
        assert!(graph.is_connected(&component));

        let search = ComponentSearch::new(&graph).restricted_to(component.clone());
        for start in &component {
            assert!(
                search.run_from(start).contains(&component),
                "{component:?} is not reachable from {start}."
            );
        }
    }
}

#[test]
fn test_components_do_not_depend_on_fragment_order() {
    let triples = chain(6);
    let query = ConjunctiveQuery::indexed(triples.clone());
    let mut fragments = chain_fragments(&triples);

    let graph = graph_of(&query, &fragments);
    let expected = component_names(&graph, &find_components(&graph));

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..5 {
        fragments.shuffle(&mut rng);
        let graph = graph_of(&query, &fragments);
        assert_eq!(
            component_names(&graph, &find_components(&graph)),
            expected
        );
    }
}
