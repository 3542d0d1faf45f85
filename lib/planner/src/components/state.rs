use crate::components::{InputsMode, JoinGraph};
use rdf_federation_common::{AlignedBitSet, BitSet, SegmentLayout, SegmentRef};

const NODES: usize = 0;
const VARS: usize = 1;
const TRIPLES: usize = 2;
const INPUTS: usize = 3;

/// A partial solution of the component search.
///
/// The state is a single [AlignedBitSet] with a segment for the included nodes, the covered
/// variables, the covered triples, and, if inputs are considered, the pending input variables.
/// States are values: transitions create new states.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SearchState(AlignedBitSet);

/// Creates and transitions [SearchState]s of a [JoinGraph].
#[derive(Debug)]
pub struct StateHelper<'graph> {
    graph: &'graph JoinGraph,
    layout: SegmentLayout,
    all_triples: BitSet,
}

impl<'graph> StateHelper<'graph> {
    pub fn new(graph: &'graph JoinGraph) -> Self {
        let universes = graph.universes();
        let vars = universes.variables().len();
        let mut widths = vec![graph.len(), vars, universes.triples().len()];
        if graph.mode() == InputsMode::WithInputs {
            widths.push(vars);
        }

        Self {
            graph,
            layout: SegmentLayout::new(&widths),
            all_triples: universes.all_triples(),
        }
    }

    pub fn graph(&self) -> &'graph JoinGraph {
        self.graph
    }

    fn has_inputs(&self) -> bool {
        self.layout.num_segments() > INPUTS
    }

    /// Creates a state that only contains `node`.
    pub fn initial_state(&self, node: usize) -> SearchState {
        let mut state = self.layout.create();
        state.segment_mut(&self.layout, NODES).insert(node);
        state
            .segment_mut(&self.layout, VARS)
            .assign(self.graph.public_vars(node));
        state
            .segment_mut(&self.layout, TRIPLES)
            .assign(self.graph.triples(node));
        if self.has_inputs() {
            state
                .segment_mut(&self.layout, INPUTS)
                .assign(self.graph.input_vars(node));
        }
        SearchState(state)
    }

    /// Tries to extend `state` with `candidate`.
    ///
    /// The candidate must be adjacent to a node of the state. Returns [None] if the candidate is
    /// already part of the state, if its triples are a subset or a superset of the covered
    /// triples, or if it would make a node of the state redundant.
    pub fn add_fragment(&self, state: &SearchState, candidate: usize) -> Option<SearchState> {
        let nodes = self.segment(state, NODES);
        if nodes.contains(candidate) {
            return None;
        }

        let candidate_vars = self.graph.public_vars(candidate);
        let connected = self.segment(state, VARS).intersects(candidate_vars);
        debug_assert!(
            connected,
            "Candidate {candidate} shares no variable with the search state."
        );
        if !connected {
            return None;
        }

        let candidate_triples = self.graph.triples(candidate);
        let triples = self.segment(state, TRIPLES);
        if triples.is_superset(candidate_triples) || triples.is_subset(candidate_triples) {
            return None;
        }

        if self.makes_redundant(nodes, candidate_triples) {
            return None;
        }

        let mut next = state.0.clone();
        next.segment_mut(&self.layout, NODES).insert(candidate);
        next.segment_mut(&self.layout, VARS).union_with(candidate_vars);
        next.segment_mut(&self.layout, TRIPLES)
            .union_with(candidate_triples);

        if self.has_inputs() {
            let mut produced = BitSet::new(candidate_vars.width());
            for node in nodes.iter() {
                produced.union_with(self.graph.output_vars(node));
            }
            let required = self.graph.input_vars(candidate).difference(&produced);

            let mut inputs = next.segment_mut(&self.layout, INPUTS);
            inputs.difference_with(self.graph.output_vars(candidate));
            inputs.union_with(&required);
        }

        Some(SearchState(next))
    }

    /// Returns true if a node of the state would only match triples that are also matched by
    /// other nodes once the candidate is added.
    fn makes_redundant(&self, nodes: SegmentRef<'_>, candidate_triples: &BitSet) -> bool {
        let mut covered_once = candidate_triples.clone();
        let mut covered_twice = BitSet::new(candidate_triples.width());
        for node in nodes.iter() {
            let triples = self.graph.triples(node);
            covered_twice.union_with(&covered_once.intersection(triples));
            covered_once.union_with(triples);
        }

        nodes
            .iter()
            .any(|node| self.graph.triples(node).is_subset(&covered_twice))
    }

    /// Returns true if the state covers all triples and has no pending inputs.
    pub fn is_final(&self, state: &SearchState) -> bool {
        self.segment(state, TRIPLES).equals(&self.all_triples)
            && (!self.has_inputs() || self.segment(state, INPUTS).is_empty())
    }

    /// The nodes included in the state.
    pub fn nodes(&self, state: &SearchState) -> BitSet {
        self.segment(state, NODES).to_bit_set()
    }

    pub fn node_iter<'state>(
        &self,
        state: &'state SearchState,
    ) -> impl Iterator<Item = usize> + 'state {
        self.segment(state, NODES).iter()
    }

    /// The triples covered by the nodes of the state.
    pub fn covered_triples(&self, state: &SearchState) -> BitSet {
        self.segment(state, TRIPLES).to_bit_set()
    }

    /// The variables that the nodes of the state still require as inputs.
    pub fn pending_inputs(&self, state: &SearchState) -> Option<BitSet> {
        self.has_inputs()
            .then(|| self.segment(state, INPUTS).to_bit_set())
    }

    fn segment<'state>(&self, state: &'state SearchState, segment: usize) -> SegmentRef<'state> {
        state.0.segment(&self.layout, segment)
    }
}
