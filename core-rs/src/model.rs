/**
 * model.rs
 * Shared identifiers and value shapes handed to the owning object model
 *
 * - Storid: positive = interned IRI, 0 = reserved, negative = blank node
 *   (absolute value is the store's internal node id)
 * - Context: positive named-graph handle, 0 = reserved
 */

use std::fmt;

use crate::literal::LiteralValue;

/// Integer stand-in for an IRI or blank node
pub type Storid = i64;

/// Named-graph context handle
pub type Context = u32;

/// Datatype marker attached to every literal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Datatype {
    /// Abbreviated datatype IRI
    Id(Storid),
    /// Language tag, without the leading `@`
    Lang(String),
}

impl Datatype {
    /// Parse the `"@tag"` marker form; anything else is not a language marker
    pub fn from_marker(marker: &str) -> Option<Self> {
        marker.strip_prefix('@').map(|tag| Datatype::Lang(tag.to_string()))
    }

    pub fn is_lang(&self) -> bool {
        matches!(self, Datatype::Lang(_))
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datatype::Id(storid) => write!(f, "{}", storid),
            Datatype::Lang(tag) => write!(f, "@{}", tag),
        }
    }
}

/// Object position of a triple: an entity or a literal
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Id(Storid),
    Literal { value: String, datatype: Datatype },
}

impl Object {
    pub fn as_id(&self) -> Option<Storid> {
        match self {
            Object::Id(storid) => Some(*storid),
            Object::Literal { .. } => None,
        }
    }
}

/// Decoded cell of a user-supplied query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Entity(Storid),
    /// Blank node without a store id, labelled per result set
    TempBlank(String),
    Literal(LiteralValue),
}
