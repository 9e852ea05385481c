/**
 * classify.rs
 * Read/write classification of SPARQL request text
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Endpoint context a request is sent through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connection {
    /// Read endpoint (SELECT / CONSTRUCT / DESCRIBE / ASK)
    Query,
    /// Write endpoint (everything else)
    Update,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Query => f.write_str("query"),
            Connection::Update => f.write_str("update"),
        }
    }
}

/// Classification of a request: the connection it is routed to
pub type RequestKind = Connection;

static PROLOGUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*(?:(?:prefix\s+[^\s:]*:\s*<[^>]*>|base\s+<[^>]*>)\s*)*").unwrap()
});
static READ_FORM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(select|construct|describe|ask)").unwrap());

/// Classify SPARQL text as a read (`Query`) or a write (`Update`).
///
/// PREFIX/BASE declarations are skipped before looking at the first keyword.
///
/// # Example
///
/// ```
/// use spog_core::client::{classify, RequestKind};
///
/// assert_eq!(classify("PREFIX ex: <http://ex.org/>\nSELECT * { ?s ?p ?o }"), RequestKind::Query);
/// assert_eq!(classify("insert data { <a:b> <a:c> <a:d> }"), RequestKind::Update);
/// ```
pub fn classify(text: &str) -> RequestKind {
    let body = match PROLOGUE.find(text) {
        Some(prologue) => &text[prologue.end()..],
        None => text,
    };
    if READ_FORM.is_match(body.trim_start()) {
        Connection::Query
    } else {
        Connection::Update
    }
}
