mod pattern;
mod source;

pub use pattern::*;
pub use source::*;

// Re-export some oxrdf types.
pub use oxrdf::{BlankNode, Literal, NamedNode, NamedNodeRef, Variable, VariableRef};

// Re-export the query patterns of spargebra.
pub use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
