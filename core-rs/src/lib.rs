//! # SPOG Core - storid-addressed SPARQL graph backend
//!
//! Backs an ontology object model with a remote SPARQL 1.1 store (GraphDB
//! first, any endpoint that speaks the protocol second). Entities travel
//! through the model as compact integer storids; this crate owns the
//! translation between storids and IRIs, between typed values and SPARQL
//! literals, and between triple patterns and query text.
//!
//! ## Layers
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  graph: SparqlGraph / SparqlSubGraph         │
//! │  pattern reads, sub-graph writes, contexts   │
//! └──────────────────────────────────────────────┘
//!      │             │                │
//! ┌────┴─────┐ ┌─────┴──────┐ ┌───────┴────────┐
//! │  abbrev  │ │   query    │ │    client      │
//! │  storids │ │ generator  │ │ HTTP / memory  │
//! └──────────┘ └─────┬──────┘ └───────┬────────┘
//!                    │                │
//!              ┌─────┴────────────────┴─────┐
//!              │  literal: value <-> text   │
//!              └────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use spog_core::{OntologyRef, StoreConfig};
//!
//! let graph = StoreConfig::memory().connect().unwrap();
//! let (onto, is_new) = graph
//!     .attach(OntologyRef::new("http://ex.org/onto#", "http://ex.org/onto"))
//!     .unwrap();
//! assert!(is_new);
//!
//! let a = graph.abbreviate("http://ex.org/onto#A");
//! let p = graph.abbreviate("http://ex.org/onto#knows");
//! let b = graph.abbreviate("http://ex.org/onto#B");
//! onto.add_obj_triple_raw_spo(a, p, b).unwrap();
//! assert_eq!(graph.get_obj_triple_sp_o(a, p).unwrap(), Some(b));
//! ```

pub mod abbrev;
pub mod client;
pub mod errors;
pub mod graph;
pub mod literal;
pub mod model;
pub mod query;
pub mod vocab;

pub use abbrev::AbbreviationTable;
pub use client::{
    classify, Connection, HttpTransport, MemoryTransport, NoMetrics, QueryMetrics, SessionMetrics, SparqlClient,
    SparqlResults, StoreConfig, Transport,
};
pub use errors::{Result, SpogError};
pub use graph::{OntologyRef, Pattern, PatternObject, RowIter, Scope, SparqlGraph, SparqlSubGraph};
pub use literal::{deserialize, serialize, LiteralValue, NodeKind};
pub use model::{Context, Datatype, Object, QueryValue, Storid};
pub use query::{QueryGenerator, GRAPHDB_ENTITY_ID};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
