use crate::{Fragment, PlanResult, QueryUniverses};
use rdf_federation_common::{BitSet, IndexedSet, UniverseError};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Whether the fragments of a join graph may require input variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputsMode {
    /// No fragment requires inputs. Joinability only depends on shared variables.
    NoInputs,
    /// Some fragments require inputs that must be produced by other fragments.
    WithInputs,
}

impl InputsMode {
    /// Returns [InputsMode::WithInputs] iff one of the fragments requires inputs.
    pub fn of<'fragment>(fragments: impl IntoIterator<Item = &'fragment Fragment>) -> Self {
        if fragments.into_iter().any(Fragment::requires_inputs) {
            InputsMode::WithInputs
        } else {
            InputsMode::NoInputs
        }
    }
}

/// How two joinable fragments relate to each other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinInterface {
    shared_vars: BitSet,
    satisfied_inputs: BitSet,
    pending_inputs: BitSet,
}

impl JoinInterface {
    /// The public variables that both fragments have in common.
    pub fn shared_vars(&self) -> &BitSet {
        &self.shared_vars
    }

    /// Input variables of one side that are produced by the other side.
    pub fn satisfied_inputs(&self) -> &BitSet {
        &self.satisfied_inputs
    }

    /// Input variables of either side that remain unbound after joining both sides.
    pub fn pending_inputs(&self) -> &BitSet {
        &self.pending_inputs
    }
}

/// The variables and triples of a single node as bit sets.
#[derive(Clone, Debug)]
struct NodeSets {
    triples: BitSet,
    public_vars: BitSet,
    input_vars: BitSet,
    output_vars: BitSet,
}

/// The joinability relation of a set of fragments.
///
/// Nodes are the fragments of the graph, addressed by their index. Two nodes are adjacent iff
/// they share a public variable and neither matches a subset of the other's triples. If inputs
/// are considered, at least one shared variable must also be produced by one of the nodes.
///
/// The graph is append-only. Appended nodes have no edges until
/// [JoinGraph::notify_added_nodes] is called. Every structural change increments the
/// [generation](JoinGraph::generation) of the graph.
#[derive(Clone, Debug)]
pub struct JoinGraph {
    universes: Arc<QueryUniverses>,
    mode: InputsMode,
    nodes: IndexedSet<Fragment>,
    sets: Vec<NodeSets>,
    neighbors: Vec<Vec<usize>>,
    interfaces: FxHashMap<(usize, usize), JoinInterface>,
    indexed_nodes: usize,
    generation: u64,
}

impl JoinGraph {
    /// Creates a graph of `fragments` and computes all edges.
    ///
    /// Returns an error if a fragment refers to a triple or a variable that is not part of
    /// `universes`.
    pub fn new(
        universes: Arc<QueryUniverses>,
        fragments: impl IntoIterator<Item = Fragment>,
        mode: InputsMode,
    ) -> PlanResult<Self> {
        let mut graph = Self {
            universes,
            mode,
            nodes: IndexedSet::new(),
            sets: Vec::new(),
            neighbors: Vec::new(),
            interfaces: FxHashMap::default(),
            indexed_nodes: 0,
            generation: 0,
        };
        for fragment in fragments {
            graph.push_fragment(fragment)?;
        }
        graph.notify_added_nodes();
        Ok(graph)
    }

    /// Appends `fragment` to the graph and returns its index.
    ///
    /// The new node has no edges until [JoinGraph::notify_added_nodes] is called. Bit sets over
    /// the nodes of this graph must be [resized](BitSet::resized) before they can be used with
    /// the new node.
    pub fn push_fragment(&mut self, fragment: Fragment) -> PlanResult<usize> {
        if let Some(index) = self.nodes.index_of(&fragment) {
            return Ok(index);
        }

        let triples = self.universes.triples().subset(fragment.triples())?;
        let public_vars = self.universes.variables().subset(fragment.public_vars())?;
        let input_vars = self.universes.variables().subset(fragment.input_vars())?;
        let output_vars = public_vars.difference(&input_vars);

        let index = self.nodes.push(fragment);
        self.sets.push(NodeSets {
            triples,
            public_vars,
            input_vars,
            output_vars,
        });
        self.neighbors.push(Vec::new());
        self.generation += 1;
        Ok(index)
    }

    /// Computes the edges of all nodes appended since the last call.
    pub fn notify_added_nodes(&mut self) {
        if self.indexed_nodes == self.len() {
            return;
        }

        for node in self.indexed_nodes..self.len() {
            for other in 0..node {
                if let Some(interface) = self.compute_interface(other, node) {
                    self.neighbors[other].push(node);
                    self.neighbors[node].push(other);
                    self.interfaces.insert((other, node), interface);
                }
            }
        }
        self.indexed_nodes = self.len();
        self.generation += 1;
    }

    fn compute_interface(&self, lhs: usize, rhs: usize) -> Option<JoinInterface> {
        let lhs = &self.sets[lhs];
        let rhs = &self.sets[rhs];

        let shared_vars = lhs.public_vars.intersection(&rhs.public_vars);
        if shared_vars.is_empty()
            || lhs.triples.is_subset(&rhs.triples)
            || rhs.triples.is_subset(&lhs.triples)
        {
            return None;
        }

        if self.mode == InputsMode::WithInputs
            && !shared_vars.intersects(&lhs.output_vars)
            && !shared_vars.intersects(&rhs.output_vars)
        {
            return None;
        }

        let satisfied_inputs = lhs
            .input_vars
            .intersection(&rhs.output_vars)
            .union(&rhs.input_vars.intersection(&lhs.output_vars));
        let pending_inputs = lhs
            .input_vars
            .difference(&rhs.output_vars)
            .union(&rhs.input_vars.difference(&lhs.output_vars));

        Some(JoinInterface {
            shared_vars,
            satisfied_inputs,
            pending_inputs,
        })
    }

    pub fn universes(&self) -> &Arc<QueryUniverses> {
        &self.universes
    }

    pub fn mode(&self) -> InputsMode {
        self.mode
    }

    /// The number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Increases whenever a node is appended or edges are recomputed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fragment(&self, node: usize) -> &Fragment {
        &self.nodes[node]
    }

    pub fn fragments(&self) -> &[Fragment] {
        self.nodes.as_slice()
    }

    pub fn index_of(&self, fragment: &Fragment) -> Option<usize> {
        self.nodes.index_of(fragment)
    }

    pub fn triples(&self, node: usize) -> &BitSet {
        &self.sets[node].triples
    }

    pub fn public_vars(&self, node: usize) -> &BitSet {
        &self.sets[node].public_vars
    }

    pub fn input_vars(&self, node: usize) -> &BitSet {
        &self.sets[node].input_vars
    }

    pub fn output_vars(&self, node: usize) -> &BitSet {
        &self.sets[node].output_vars
    }

    /// The adjacent nodes of `node` in ascending order.
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.neighbors[node]
    }

    /// The join interface of two adjacent nodes.
    pub fn interface(&self, lhs: usize, rhs: usize) -> Option<&JoinInterface> {
        self.interfaces.get(&(lhs.min(rhs), lhs.max(rhs)))
    }

    /// A node subset that contains no node.
    pub fn empty_subset(&self) -> BitSet {
        BitSet::new(self.len())
    }

    /// Creates a node subset. Panics if a node is out of range.
    pub fn node_subset(&self, nodes: impl IntoIterator<Item = usize>) -> BitSet {
        BitSet::from_indices(self.len(), nodes)
    }

    /// Returns an error if `subset` is not a node subset of this graph.
    pub fn check_subset(&self, subset: &BitSet) -> PlanResult<()> {
        UniverseError::check_width(self.len(), subset.width())?;
        Ok(())
    }

    /// The fragments of the nodes in `subset`.
    pub fn fragments_of(&self, subset: &BitSet) -> Vec<Fragment> {
        assert_eq!(
            subset.width(),
            self.len(),
            "Node subset does not belong to this join graph."
        );
        subset.iter().map(|node| self.nodes[node].clone()).collect()
    }

    /// The union of the triples matched by the nodes in `subset`.
    pub fn triples_of(&self, subset: &BitSet) -> BitSet {
        let mut triples = self.universes.triples().empty_subset();
        for node in subset {
            triples.union_with(self.triples(node));
        }
        triples
    }

    /// Returns true if the nodes in `subset` are a non-empty connected subgraph.
    pub fn is_connected(&self, subset: &BitSet) -> bool {
        assert_eq!(
            subset.width(),
            self.len(),
            "Node subset does not belong to this join graph."
        );
        let Some(start) = subset.first() else {
            return false;
        };

        let mut visited = self.empty_subset();
        visited.insert(start);
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for &neighbor in self.neighbors(node) {
                if subset.contains(neighbor) && visited.insert(neighbor) {
                    stack.push(neighbor);
                }
            }
        }
        visited == *subset
    }
}
