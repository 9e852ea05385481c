/**
 * pattern.rs
 * Structured descriptions of the triple patterns the generator understands
 */

use crate::literal::LiteralValue;
use crate::model::Storid;

/// Subject/predicate/object node already resolved from a storid
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Iri(String),
    /// Blank node storid (negative; the store's internal id is its absolute value)
    Blank(Storid),
}

impl NodeRef {
    pub fn iri(iri: impl Into<String>) -> Self {
        NodeRef::Iri(iri.into())
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            NodeRef::Iri(iri) => Some(iri),
            NodeRef::Blank(_) => None,
        }
    }

    /// Store-internal node id of a blank node
    pub fn internal_id(&self) -> Option<i64> {
        match self {
            NodeRef::Blank(storid) => Some(storid.abs()),
            NodeRef::Iri(_) => None,
        }
    }
}

/// Constraint on the subject or predicate position
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Binding {
    #[default]
    Unbound,
    One(NodeRef),
    /// Any of the candidates (batched lookup)
    Any(Vec<NodeRef>),
}

impl Binding {
    pub fn is_bound(&self) -> bool {
        !matches!(self, Binding::Unbound)
    }
}

impl From<NodeRef> for Binding {
    fn from(node: NodeRef) -> Self {
        Binding::One(node)
    }
}

impl From<Option<NodeRef>> for Binding {
    fn from(node: Option<NodeRef>) -> Self {
        node.map(Binding::One).unwrap_or_default()
    }
}

/// Bound object position
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectTerm {
    Node(NodeRef),
    Literal(LiteralValue),
}

/// Which kind of triples a pattern retrieves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Objects are IRIs or blank nodes
    Object,
    /// Objects are literals
    Data,
    /// Any RDF term
    Mixed,
}

impl Mode {
    pub fn from_flags(object_mode: bool, data_mode: bool) -> Option<Self> {
        match (object_mode, data_mode) {
            (true, false) => Some(Mode::Object),
            (false, true) => Some(Mode::Data),
            (true, true) => Some(Mode::Mixed),
            (false, false) => None,
        }
    }

    pub fn includes_objects(self) -> bool {
        matches!(self, Mode::Object | Mode::Mixed)
    }

    pub fn includes_data(self) -> bool {
        matches!(self, Mode::Data | Mode::Mixed)
    }
}

/// SELECT pattern request
///
/// # Example
///
/// ```
/// use spog_core::query::{NodeRef, SelectQuery};
///
/// let query = SelectQuery::new()
///     .objects()
///     .subject(NodeRef::iri("http://ex.org/A"))
///     .graphs(vec!["http://ex.org/onto".to_string()]);
/// assert!(query.object_mode);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub object_mode: bool,
    pub data_mode: bool,
    pub subject: Binding,
    pub predicate: Binding,
    pub object: Option<ObjectTerm>,
    /// Datatype IRI or `@tag`
    pub datatype: Option<String>,
    pub distinct: bool,
    pub graph_iris: Vec<String>,
    pub default_graph_iri: Option<String>,
    pub limit: Option<usize>,
    pub order_by: Option<String>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(mut self) -> Self {
        self.object_mode = true;
        self
    }

    pub fn data(mut self) -> Self {
        self.data_mode = true;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.object_mode = mode.includes_objects();
        self.data_mode = mode.includes_data();
        self
    }

    pub fn subject(mut self, subject: impl Into<Binding>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn predicate(mut self, predicate: impl Into<Binding>) -> Self {
        self.predicate = predicate.into();
        self
    }

    pub fn object(mut self, object: Option<ObjectTerm>) -> Self {
        self.object = object;
        self
    }

    pub fn datatype(mut self, datatype: Option<String>) -> Self {
        self.datatype = datatype;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn graphs(mut self, graph_iris: Vec<String>) -> Self {
        self.graph_iris = graph_iris;
        self
    }

    pub fn default_graph(mut self, graph_iri: impl Into<String>) -> Self {
        self.default_graph_iri = Some(graph_iri.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }
}
