/**
 * literal module
 *
 * - value: native literal values and their lexical forms
 * - codec: SPARQL literal serialization/deserialization, string and IRI escaping
 */

pub mod codec;
pub mod value;

pub use codec::{deserialize, escape_string, inferred_datatype, iri_ref, is_valid_language_tag, serialize, DatatypeFamily, NodeKind};
pub use value::LiteralValue;
