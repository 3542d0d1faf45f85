use itertools::Itertools;
use rdf_federation_model::{pattern_variables, DataSource, TriplePattern, Variable};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_FRAGMENT_ID: AtomicU64 = AtomicU64::new(0);

/// A process-unique identifier of a [Fragment].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(u64);

impl FragmentId {
    fn next() -> Self {
        Self(NEXT_FRAGMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for FragmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The operation of a [Fragment].
#[derive(Clone, Debug)]
pub enum FragmentKind {
    /// The triples of the fragment are evaluated against a single source.
    Source(Arc<DataSource>),
    /// The union of alternative fragments that match the same triples.
    Union(Vec<Fragment>),
    /// An inner join of two fragments.
    Join(Fragment, Fragment),
    /// The cross product of fragments that do not share variables.
    Cartesian(Vec<Fragment>),
    /// A fragment without results. Used as a sentinel for subsets that cannot be planned.
    Empty,
}

#[derive(Debug)]
struct FragmentInner {
    id: FragmentId,
    kind: FragmentKind,
    triples: Vec<TriplePattern>,
    public_vars: Vec<Variable>,
    input_vars: Vec<Variable>,
}

/// A plan node that matches a subset of the triple patterns of a query.
///
/// Fragments are immutable and cheap to clone. Two fragments are equal iff they are the same
/// node, i.e., they have the same [FragmentId]. Use [Fragment::is_equivalent] for comparing the
/// structure of two fragments.
///
/// The public variables of a fragment are its result variables and its input variables. Input
/// variables are variables that the fragment cannot produce on its own. They must be bound by
/// another fragment before this fragment can be evaluated.
#[derive(Clone)]
pub struct Fragment(Arc<FragmentInner>);

impl Fragment {
    fn new(
        kind: FragmentKind,
        triples: Vec<TriplePattern>,
        public_vars: Vec<Variable>,
        input_vars: Vec<Variable>,
    ) -> Self {
        Self(Arc::new(FragmentInner {
            id: FragmentId::next(),
            kind,
            triples,
            public_vars,
            input_vars,
        }))
    }

    /// Creates a fragment that evaluates `triples` against `source`.
    ///
    /// The public variables are the variables of the triples.
    pub fn source(
        source: Arc<DataSource>,
        triples: impl IntoIterator<Item = TriplePattern>,
    ) -> Self {
        Self::source_with_inputs(source, triples, [])
    }

    /// Creates a fragment that evaluates `triples` against `source` and requires `input_vars`
    /// to be bound.
    pub fn source_with_inputs(
        source: Arc<DataSource>,
        triples: impl IntoIterator<Item = TriplePattern>,
        input_vars: impl IntoIterator<Item = Variable>,
    ) -> Self {
        let triples = distinct(triples);
        let input_vars = distinct(input_vars);
        let public_vars = distinct(
            triples
                .iter()
                .flat_map(pattern_variables)
                .chain(input_vars.iter().cloned()),
        );
        Self::new(FragmentKind::Source(source), triples, public_vars, input_vars)
    }

    /// Joins `lhs` and `rhs`.
    ///
    /// The input variables of the result are the inputs of either side that are not produced by
    /// the other side. Joining with an empty fragment produces an empty fragment.
    pub fn join(lhs: Fragment, rhs: Fragment) -> Self {
        let public_vars = distinct(lhs.public_vars().iter().chain(rhs.public_vars()).cloned());
        if lhs.is_empty() || rhs.is_empty() {
            return Self::empty(public_vars);
        }

        let triples = distinct(lhs.triples().iter().chain(rhs.triples()).cloned());
        let input_vars = distinct(
            lhs.input_vars()
                .iter()
                .filter(|var| !rhs.produces(var))
                .chain(rhs.input_vars().iter().filter(|var| !lhs.produces(var)))
                .cloned(),
        );
        Self::new(FragmentKind::Join(lhs, rhs), triples, public_vars, input_vars)
    }

    /// Creates a union of alternative fragments.
    ///
    /// Empty children are dropped. A union of a single child is the child itself.
    pub fn union(children: impl IntoIterator<Item = Fragment>) -> Self {
        let children = children.into_iter().collect_vec();
        let public_vars = union_vars(&children);
        let mut children = children
            .into_iter()
            .filter(|child| !child.is_empty())
            .collect_vec();

        match children.len() {
            0 => Self::empty(public_vars),
            1 => children.remove(0),
            _ => {
                let triples = distinct(children.iter().flat_map(|c| c.triples()).cloned());
                let input_vars = distinct(children.iter().flat_map(|c| c.input_vars()).cloned());
                Self::new(
                    FragmentKind::Union(children),
                    triples,
                    public_vars,
                    input_vars,
                )
            }
        }
    }

    /// Creates the cross product of `children`.
    ///
    /// If a child is empty, the product is empty. A product of a single child is the child
    /// itself.
    pub fn cartesian(children: impl IntoIterator<Item = Fragment>) -> Self {
        let mut children = children.into_iter().collect_vec();
        let public_vars = union_vars(&children);
        if children.is_empty() || children.iter().any(Fragment::is_empty) {
            return Self::empty(public_vars);
        }
        if children.len() == 1 {
            return children.remove(0);
        }

        let triples = distinct(children.iter().flat_map(|c| c.triples()).cloned());
        let input_vars = distinct(children.iter().flat_map(|c| c.input_vars()).cloned());
        Self::new(
            FragmentKind::Cartesian(children),
            triples,
            public_vars,
            input_vars,
        )
    }

    /// Creates a fragment without results that has the given variables.
    pub fn empty(vars: impl IntoIterator<Item = Variable>) -> Self {
        Self::new(FragmentKind::Empty, Vec::new(), distinct(vars), Vec::new())
    }

    pub fn id(&self) -> FragmentId {
        self.0.id
    }

    pub fn kind(&self) -> &FragmentKind {
        &self.0.kind
    }

    /// The triple patterns matched by this fragment.
    pub fn triples(&self) -> &[TriplePattern] {
        &self.0.triples
    }

    /// The result and the input variables of this fragment.
    pub fn public_vars(&self) -> &[Variable] {
        &self.0.public_vars
    }

    /// The variables that must be bound before this fragment can be evaluated.
    pub fn input_vars(&self) -> &[Variable] {
        &self.0.input_vars
    }

    /// The variables this fragment produces on its own.
    pub fn output_vars(&self) -> impl Iterator<Item = &Variable> {
        self.public_vars()
            .iter()
            .filter(|var| !self.input_vars().contains(var))
    }

    /// Returns true if this fragment produces `var` on its own.
    pub fn produces(&self, var: &Variable) -> bool {
        self.public_vars().contains(var) && !self.input_vars().contains(var)
    }

    pub fn requires_inputs(&self) -> bool {
        !self.input_vars().is_empty()
    }

    /// Returns true if this is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        matches!(self.kind(), FragmentKind::Empty)
    }

    /// Returns true if `other` has the same structure as this fragment.
    ///
    /// Triples and variables are compared as sets, while the children of unions and cartesian
    /// products are compared regardless of their order.
    pub fn is_equivalent(&self, other: &Fragment) -> bool {
        if self == other {
            return true;
        }

        if !same_elements(self.triples(), other.triples())
            || !same_elements(self.public_vars(), other.public_vars())
            || !same_elements(self.input_vars(), other.input_vars())
        {
            return false;
        }

        match (self.kind(), other.kind()) {
            (FragmentKind::Source(lhs), FragmentKind::Source(rhs)) => lhs == rhs,
            (FragmentKind::Union(lhs), FragmentKind::Union(rhs))
            | (FragmentKind::Cartesian(lhs), FragmentKind::Cartesian(rhs)) => {
                equivalent_children(lhs, rhs)
            }
            (FragmentKind::Join(lhs_l, lhs_r), FragmentKind::Join(rhs_l, rhs_r)) => {
                (lhs_l.is_equivalent(rhs_l) && lhs_r.is_equivalent(rhs_r))
                    || (lhs_l.is_equivalent(rhs_r) && lhs_r.is_equivalent(rhs_l))
            }
            (FragmentKind::Empty, FragmentKind::Empty) => true,
            _ => false,
        }
    }

    /// The direct children of this fragment.
    pub fn children(&self) -> Vec<&Fragment> {
        match self.kind() {
            FragmentKind::Union(children) | FragmentKind::Cartesian(children) => {
                children.iter().collect()
            }
            FragmentKind::Join(lhs, rhs) => vec![lhs, rhs],
            FragmentKind::Source(_) | FragmentKind::Empty => Vec::new(),
        }
    }

    fn fmt_indented(&self, f: &mut Formatter<'_>, depth: usize) -> std::fmt::Result {
        write!(f, "{:indent$}", "", indent = depth * 2)?;
        match self.kind() {
            FragmentKind::Source(source) => write!(f, "Source {source} ")?,
            FragmentKind::Union(_) => f.write_str("Union ")?,
            FragmentKind::Join(_, _) => f.write_str("Join ")?,
            FragmentKind::Cartesian(_) => f.write_str("Cartesian ")?,
            FragmentKind::Empty => f.write_str("Empty ")?,
        }
        write!(f, "[{}]", self.public_vars().iter().join(" "))?;
        if self.requires_inputs() {
            write!(f, " inputs [{}]", self.input_vars().iter().join(" "))?;
        }

        for child in self.children() {
            writeln!(f)?;
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Fragment {}

impl Hash for Fragment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl Debug for Fragment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fragment")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .field("triples", &self.0.triples)
            .field("public_vars", &self.0.public_vars)
            .field("input_vars", &self.0.input_vars)
            .finish()
    }
}

/// Renders the fragment as an indented plan tree.
impl Display for Fragment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.fmt_indented(f, 0)
    }
}

fn distinct<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut result = Vec::new();
    for item in items {
        if !result.contains(&item) {
            result.push(item);
        }
    }
    result
}

fn union_vars(fragments: &[Fragment]) -> Vec<Variable> {
    distinct(fragments.iter().flat_map(|f| f.public_vars()).cloned())
}

fn same_elements<T: PartialEq>(lhs: &[T], rhs: &[T]) -> bool {
    lhs.iter().all(|item| rhs.contains(item)) && rhs.iter().all(|item| lhs.contains(item))
}

fn equivalent_children(lhs: &[Fragment], rhs: &[Fragment]) -> bool {
    lhs.len() == rhs.len()
        && lhs.iter().all(|l| rhs.iter().any(|r| l.is_equivalent(r)))
        && rhs.iter().all(|r| lhs.iter().any(|l| l.is_equivalent(r)))
}
