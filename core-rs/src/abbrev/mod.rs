//! IRI <-> storid abbreviation

pub mod table;

pub use table::AbbreviationTable;
