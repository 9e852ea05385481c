//! Identifier abbreviation table
//!
//! Write-through, never-evicted bidirectional map IRI <-> storid. Well-known
//! vocabulary terms resolve through the shared [`crate::vocab`] table and are
//! never stored here. Allocation is monotonic: a storid never changes meaning
//! and one IRI never receives two storids.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use crate::errors::{Result, SpogError};
use crate::model::Storid;
use crate::query::NodeRef;
use crate::vocab::{well_known, RESERVED_FLOOR};

#[derive(Debug, Default)]
struct Maps {
    iri_to_storid: HashMap<String, Storid>,
    storid_to_iri: HashMap<Storid, String>,
    max_storid: Storid,
}

impl Maps {
    /// Reject `iri` if it is a well-known term or already names another storid
    fn check_free(&self, iri: &str, storid: Storid) -> Result<()> {
        if let Some(fixed) = well_known().storid(iri) {
            return Err(SpogError::InvalidInput(format!(
                "'{}' is a well-known term with fixed storid {}",
                iri, fixed
            )));
        }
        match self.iri_to_storid.get(iri) {
            Some(existing) if *existing != storid => Err(SpogError::InvalidInput(format!(
                "'{}' already has storid {}, not {}",
                iri, existing, storid
            ))),
            _ => Ok(()),
        }
    }

    fn insert(&mut self, iri: &str, storid: Storid) {
        self.iri_to_storid.insert(iri.to_string(), storid);
        self.storid_to_iri.insert(storid, iri.to_string());
        self.max_storid = self.max_storid.max(storid);
    }

    fn next_storid(&self) -> Storid {
        self.max_storid.max(RESERVED_FLOOR) + 1
    }
}

/// Per-instance IRI abbreviation map
#[derive(Debug, Default)]
pub struct AbbreviationTable {
    maps: Mutex<Maps>,
}

impl AbbreviationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storid of `iri` if already known (well-known terms first)
    pub fn lookup(&self, iri: &str) -> Option<Storid> {
        well_known()
            .storid(iri)
            .or_else(|| self.maps.lock().iri_to_storid.get(iri).copied())
    }

    /// Storid of `iri`, allocating a fresh one if needed.
    ///
    /// Check and allocation happen under one lock acquisition.
    pub fn get_or_insert(&self, iri: &str) -> Storid {
        if let Some(storid) = well_known().storid(iri) {
            return storid;
        }
        let mut maps = self.maps.lock();
        if let Some(storid) = maps.iri_to_storid.get(iri) {
            return *storid;
        }
        let storid = maps.next_storid();
        maps.insert(iri, storid);
        debug!(iri = iri, storid = storid, "allocated storid");
        storid
    }

    pub fn get_or_insert_all(&self, iris: &[&str]) -> Vec<Storid> {
        iris.iter().map(|iri| self.get_or_insert(iri)).collect()
    }

    /// IRI of a positive storid
    pub fn iri(&self, storid: Storid) -> Option<String> {
        if storid <= 0 {
            return None;
        }
        match well_known().iri(storid) {
            Some(iri) => Some(iri.to_string()),
            None => self.maps.lock().storid_to_iri.get(&storid).cloned(),
        }
    }

    /// Node for a storid: negative ids are blank nodes and pass through
    /// unchanged, 0 and unknown positive ids resolve to nothing.
    pub fn resolve(&self, storid: Storid) -> Option<NodeRef> {
        if storid < 0 {
            return Some(NodeRef::Blank(storid));
        }
        self.iri(storid).map(NodeRef::Iri)
    }

    pub fn resolve_all(&self, storids: &[Storid]) -> Vec<Option<NodeRef>> {
        storids.iter().map(|storid| self.resolve(*storid)).collect()
    }

    /// Record a mapping produced elsewhere (e.g. when reloading a saved session)
    pub fn restore(&self, storid: Storid, iri: &str) -> Result<()> {
        if storid <= 0 {
            return Err(SpogError::InvalidInput(format!("cannot restore non-positive storid {}", storid)));
        }
        let mut maps = self.maps.lock();
        maps.check_free(iri, storid)?;
        if let Some(existing) = maps.storid_to_iri.get(&storid) {
            if existing != iri {
                return Err(SpogError::InvalidInput(format!(
                    "storid {} already names '{}', not '{}'",
                    storid, existing, iri
                )));
            }
        }
        maps.insert(iri, storid);
        Ok(())
    }

    /// Point an existing storid at a new IRI. The old IRI is forgotten.
    pub fn refactor(&self, storid: Storid, new_iri: &str) -> Result<()> {
        let mut maps = self.maps.lock();
        if !maps.storid_to_iri.contains_key(&storid) {
            return Err(SpogError::UnknownStorid(storid));
        }
        maps.check_free(new_iri, storid)?;
        let old_iri = maps.storid_to_iri.remove(&storid).ok_or(SpogError::UnknownStorid(storid))?;
        maps.iri_to_storid.remove(&old_iri);
        maps.insert(new_iri, storid);
        debug!(storid = storid, old = %old_iri, new = new_iri, "refactored storid");
        Ok(())
    }

    /// Number of per-instance mappings
    pub fn len(&self) -> usize {
        self.maps.lock().iri_to_storid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
