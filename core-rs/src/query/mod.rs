/**
 * query module
 *
 * - pattern: SELECT request shapes (bindings, object terms, modes)
 * - generator: SPARQL text generation for selects, inserts, deletes
 */

pub mod generator;
pub mod pattern;

pub use generator::{QueryGenerator, GRAPHDB_ENTITY_ID};
pub use pattern::{Binding, Mode, NodeRef, ObjectTerm, SelectQuery};
