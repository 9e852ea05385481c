//! Abbreviation Contract Tests
//!
//! Storids are persisted by the object model (caches, pickled sessions), so
//! the mapping rules below are a compatibility surface, not an implementation
//! detail.

use std::collections::HashSet;
use std::sync::Arc;

use spog_core::query::NodeRef;
use spog_core::vocab::{well_known, RDF_TYPE, RESERVED_FLOOR, XSD_STRING};
use spog_core::AbbreviationTable;

/// WHY: One IRI, one storid, for the lifetime of the table
/// BREAKS: Every cached entity reference if an IRI is re-numbered
#[test]
fn abbreviate_is_idempotent() {
    let table = AbbreviationTable::new();
    let first = table.get_or_insert("http://ex.org/A");
    for _ in 0..10 {
        assert_eq!(table.get_or_insert("http://ex.org/A"), first);
    }
    assert_eq!(table.len(), 1);
}

/// WHY: unabbreviate(abbreviate(iri)) == iri
#[test]
fn abbreviation_round_trips() {
    let table = AbbreviationTable::new();
    for iri in ["http://ex.org/A", "http://ex.org/onto#B", "urn:uuid:1234", RDF_TYPE, XSD_STRING] {
        let storid = table.get_or_insert(iri);
        assert_eq!(table.iri(storid).as_deref(), Some(iri));
        assert_eq!(table.resolve(storid), Some(NodeRef::Iri(iri.to_string())));
    }
}

/// WHY: Fresh storids start above the reserved vocabulary range and only grow
/// BREAKS: Collisions with the well-known RDF/OWL/XSD storids
#[test]
fn allocation_is_monotonic_above_reserved_floor() {
    let table = AbbreviationTable::new();
    let mut previous = RESERVED_FLOOR;
    for i in 0..50 {
        let storid = table.get_or_insert(&format!("http://ex.org/item{}", i));
        assert!(storid > previous);
        previous = storid;
    }
}

/// WHY: Well-known terms have fixed storids shared by every table
#[test]
fn well_known_terms_are_fixed() {
    let first = AbbreviationTable::new();
    let second = AbbreviationTable::new();
    second.get_or_insert("http://ex.org/noise");

    let rdf_type = first.get_or_insert(RDF_TYPE);
    assert_eq!(rdf_type, second.get_or_insert(RDF_TYPE));
    assert_eq!(Some(rdf_type), well_known().storid(RDF_TYPE));
    assert!(rdf_type > 0 && rdf_type <= RESERVED_FLOOR);
    assert!(first.is_empty());
}

/// WHY: Negative storids are blank nodes and pass through unabbreviation as-is
/// WHY: 0 is reserved and never names anything
#[test]
fn blank_and_zero_storids() {
    let table = AbbreviationTable::new();
    assert_eq!(table.resolve(-42), Some(NodeRef::Blank(-42)));
    assert_eq!(table.resolve(0), None);
    assert_eq!(table.iri(-42), None);
    assert_eq!(table.resolve(999_999), None);
}

/// WHY: Plural forms keep arity; unknown entries are None, never dropped
#[test]
fn plural_forms_keep_arity() {
    let table = AbbreviationTable::new();
    let storids = table.get_or_insert_all(&["http://ex.org/A", "http://ex.org/B"]);
    assert_eq!(storids.len(), 2);
    let nodes = table.resolve_all(&[storids[0], 123_456, -3, storids[1]]);
    assert_eq!(nodes.len(), 4);
    assert_eq!(nodes[1], None);
    assert_eq!(nodes[2], Some(NodeRef::Blank(-3)));
}

/// WHY: Concurrent allocation never hands out one storid twice
/// BREAKS: Two entities silently merged under one storid
#[test]
fn concurrent_allocation_is_distinct() {
    let table = Arc::new(AbbreviationTable::new());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let table = Arc::clone(&table);
            std::thread::spawn(move || {
                (0..100)
                    .map(|i| table.get_or_insert(&format!("http://ex.org/t{}/{}", t % 4, i)))
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }
    let distinct: HashSet<_> = all.iter().copied().collect();
    // threads t and t + 4 share IRIs
    assert_eq!(distinct.len(), 400);
    assert_eq!(table.len(), 400);
}

/// WHY: refactor keeps the storid and moves it to the new IRI
#[test]
fn refactor_moves_iri() {
    let table = AbbreviationTable::new();
    let storid = table.get_or_insert("http://ex.org/old");
    table.refactor(storid, "http://ex.org/new").unwrap();
    assert_eq!(table.iri(storid).as_deref(), Some("http://ex.org/new"));
    assert_eq!(table.lookup("http://ex.org/old"), None);
    assert!(table.refactor(777_777, "http://ex.org/x").is_err());
}

/// WHY: restored mappings raise the allocation floor
#[test]
fn restore_then_allocate() {
    let table = AbbreviationTable::new();
    table.restore(5000, "http://ex.org/saved").unwrap();
    assert_eq!(table.get_or_insert("http://ex.org/saved"), 5000);
    assert_eq!(table.get_or_insert("http://ex.org/fresh"), 5001);
    assert!(table.restore(5000, "http://ex.org/other").is_err());
    assert!(table.restore(0, "http://ex.org/zero").is_err());
}

/// WHY: restore must not give an already-mapped IRI a second storid
/// BREAKS: Two storids resolving to one IRI after a session reload
#[test]
fn restore_rejects_mapped_iri() {
    let table = AbbreviationTable::new();
    let existing = table.get_or_insert("http://ex.org/A");
    assert!(table.restore(1000, "http://ex.org/A").is_err());
    assert_eq!(table.lookup("http://ex.org/A"), Some(existing));
    assert_eq!(table.iri(1000), None);
    assert_eq!(table.iri(existing).as_deref(), Some("http://ex.org/A"));
}

/// WHY: refactor onto an IRI that already has a storid would alias two entities
#[test]
fn refactor_rejects_existing_iri() {
    let table = AbbreviationTable::new();
    let a = table.get_or_insert("http://ex.org/A");
    let b = table.get_or_insert("http://ex.org/B");
    assert!(table.refactor(b, "http://ex.org/A").is_err());
    assert_eq!(table.iri(a).as_deref(), Some("http://ex.org/A"));
    assert_eq!(table.iri(b).as_deref(), Some("http://ex.org/B"));
    assert_eq!(table.lookup("http://ex.org/A"), Some(a));
}

/// WHY: Well-known terms keep their fixed storid and never enter the per-instance map
#[test]
fn restore_rejects_well_known_terms() {
    let table = AbbreviationTable::new();
    assert!(table.restore(500, RDF_TYPE).is_err());
    assert!(table.is_empty());
    assert_eq!(table.lookup(RDF_TYPE), well_known().storid(RDF_TYPE));
    assert_eq!(table.iri(500), None);
}
