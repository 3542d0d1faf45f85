use std::fmt::{Display, Formatter};

/// The kind of data source a fragment is evaluated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A remote SPARQL endpoint.
    SparqlEndpoint,
    /// A relational database that is queried through a SQL rewriting of the fragment.
    Relational,
    /// A web API. Web APIs usually require some of their variables to be bound as parameters.
    WebApi,
}

/// A data source that is part of the federation.
///
/// Sources are only described here. Connecting to them and evaluating fragments is done by the
/// federation layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DataSource {
    name: String,
    kind: SourceKind,
}

impl DataSource {
    /// Creates a new [DataSource].
    pub fn new(name: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Creates a [SourceKind::SparqlEndpoint] source.
    pub fn sparql_endpoint(name: impl Into<String>) -> Self {
        Self::new(name, SourceKind::SparqlEndpoint)
    }

    /// Creates a [SourceKind::Relational] source.
    pub fn relational(name: impl Into<String>) -> Self {
        Self::new(name, SourceKind::Relational)
    }

    /// Creates a [SourceKind::WebApi] source.
    pub fn web_api(name: impl Into<String>) -> Self {
        Self::new(name, SourceKind::WebApi)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }
}

impl Display for DataSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
