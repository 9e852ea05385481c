//! In-process transport backed by an oxigraph store
//!
//! Speaks the same request/response contract as [`super::HttpTransport`]:
//! reads answer with SPARQL JSON results, evaluation errors come back as
//! status 400 with the error text as body. Oxigraph has no internal node id
//! predicate, so pair it with `QueryGenerator::without_node_ids()`.

use oxigraph::model::Term as OxTerm;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use std::collections::HashMap;
use tracing::debug;

use super::classify::Connection;
use super::results::{Bindings, Head, RawTerm, SparqlResults};
use super::transport::{Transport, TransportResponse};
use crate::errors::{Result, SpogError};
use crate::vocab::XSD_STRING;

pub struct MemoryTransport {
    store: Store,
}

impl MemoryTransport {
    pub fn new() -> Result<Self> {
        let store = Store::new().map_err(|e| SpogError::Config(format!("failed to open in-memory store: {}", e)))?;
        Ok(Self { store })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn bad_request(message: impl ToString) -> TransportResponse {
        TransportResponse { status: 400, body: message.to_string() }
    }

    fn raw_term(term: &OxTerm) -> Option<RawTerm> {
        #[allow(unreachable_patterns)]
        match term {
            OxTerm::NamedNode(node) => Some(RawTerm::uri(node.as_str())),
            OxTerm::BlankNode(node) => Some(RawTerm::bnode(node.as_str())),
            OxTerm::Literal(literal) => Some(match literal.language() {
                Some(lang) => RawTerm::literal(literal.value(), None, Some(lang.to_string())),
                None => {
                    let datatype = literal.datatype().as_str();
                    // plain strings are reported untyped, as most endpoints do
                    let datatype = (datatype != XSD_STRING).then(|| datatype.to_string());
                    RawTerm::literal(literal.value(), datatype, None)
                }
            }),
            _ => None,
        }
    }

    fn run_query(&self, body: &str) -> TransportResponse {
        let results = match self.store.query(body) {
            Ok(results) => results,
            Err(e) => return Self::bad_request(e),
        };
        let json = match results {
            QueryResults::Solutions(solutions) => {
                let vars = solutions.variables().iter().map(|v| v.as_str().to_string()).collect();
                let mut bindings = Vec::new();
                for solution in solutions {
                    let solution = match solution {
                        Ok(solution) => solution,
                        Err(e) => return Self::bad_request(e),
                    };
                    let mut row = HashMap::new();
                    for (var, term) in solution.iter() {
                        if let Some(raw) = Self::raw_term(term) {
                            row.insert(var.as_str().to_string(), raw);
                        }
                    }
                    bindings.push(row);
                }
                SparqlResults {
                    head: Head { vars },
                    results: Some(Bindings { bindings }),
                    boolean: None,
                }
            }
            QueryResults::Boolean(flag) => SparqlResults {
                head: Head::default(),
                results: None,
                boolean: Some(flag),
            },
            QueryResults::Graph(_) => return Self::bad_request("graph results are not supported"),
        };
        match json.to_json() {
            Ok(text) => TransportResponse::ok(text),
            Err(e) => TransportResponse { status: 500, body: e.to_string() },
        }
    }
}

impl Transport for MemoryTransport {
    fn send(&self, connection: Connection, body: &str) -> Result<TransportResponse> {
        debug!(%connection, "memory store request");
        Ok(match connection {
            Connection::Query => self.run_query(body),
            Connection::Update => match self.store.update(body) {
                Ok(()) => TransportResponse { status: 204, body: String::new() },
                Err(e) => Self::bad_request(e),
            },
        })
    }

    fn describe(&self) -> String {
        "memory:".to_string()
    }
}
