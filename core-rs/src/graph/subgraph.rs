//! One ontology's view of the store
//!
//! Reads are scoped to the context's graph (queried as the default graph);
//! writes target it as the named graph of every insert/delete.

use tracing::debug;

use super::patterns::{literal_of, storid_of, Pattern, RowIter, Scope};
use super::{OntologyRef, SparqlGraph};
use crate::errors::{Result, SpogError};
use crate::literal::LiteralValue;
use crate::model::{Context, Datatype, Object, Storid};
use crate::query::{Mode, ObjectTerm};

pub struct SparqlSubGraph<'g> {
    graph: &'g SparqlGraph,
    context: Context,
    ontology: OntologyRef,
}

impl<'g> SparqlSubGraph<'g> {
    pub(crate) fn new(graph: &'g SparqlGraph, context: Context, ontology: OntologyRef) -> Self {
        Self { graph, context, ontology }
    }

    pub fn context(&self) -> Context {
        self.context
    }

    pub fn graph_iri(&self) -> &str {
        &self.ontology.graph_iri
    }

    pub fn ontology(&self) -> &OntologyRef {
        &self.ontology
    }

    /// Parent graph (abbreviation, numbered IRIs, ...)
    pub fn graph(&self) -> &'g SparqlGraph {
        self.graph
    }

    /// Record `alias` for this ontology's base IRI and graph
    pub fn add_ontology_alias(&self, alias: &str) -> Result<()> {
        self.graph.add_ontology_alias(&self.ontology.base_iri, alias, &self.ontology.graph_iri)
    }

    fn scoped(&self, mode: Mode) -> Pattern {
        Pattern::new(mode).scope(Scope::Context(self.context))
    }

    fn insert_text(&self, s: Storid, p: Storid, object: &ObjectTerm, datatype: Option<&str>) -> Result<String> {
        self.graph.generator().generate_insert(
            &self.graph.node(s)?,
            &self.graph.predicate_iri(p)?,
            object,
            datatype,
            Some(self.graph_iri()),
        )
    }

    fn delete_text(
        &self,
        s: Option<Storid>,
        p: Option<Storid>,
        object: Option<&ObjectTerm>,
        datatype: Option<&str>,
    ) -> Result<String> {
        let subject = s.map(|s| self.graph.node(s)).transpose()?;
        let predicate = p.map(|p| self.graph.predicate_iri(p)).transpose()?;
        self.graph.generator().generate_delete(
            subject.as_ref(),
            predicate.as_deref(),
            object,
            datatype,
            Some(self.graph_iri()),
        )
    }

    fn object_node(&self, o: Storid) -> Result<ObjectTerm> {
        Ok(ObjectTerm::Node(self.graph.node(o)?))
    }

    /// Send `fragments` as one update request under the write lock
    fn write(&self, label: &str, fragments: &[&str]) -> Result<()> {
        let _guard = self.graph.write_lock();
        debug!(context = self.context, label = label, "writing sub-graph");
        self.graph.client().update(label, fragments)
    }

    // ==================== OBJECT WRITES ====================

    /// Replace every `(s, p, *)` with `(s, p, o)`
    pub fn set_obj_triple_raw_spo(&self, s: Storid, p: Storid, o: Storid) -> Result<()> {
        let delete = self.delete_text(Some(s), Some(p), None, None)?;
        let insert = self.insert_text(s, p, &self.object_node(o)?, None)?;
        self.write("set_obj_triple_raw_spo", &[&delete, &insert])
    }

    pub fn add_obj_triple_raw_spo(&self, s: Storid, p: Storid, o: Storid) -> Result<()> {
        let insert = self.insert_text(s, p, &self.object_node(o)?, None)?;
        self.write("add_obj_triple_raw_spo", &[&insert])
    }

    /// Delete matching object triples; `None` matches anything
    pub fn del_obj_triple_raw_spo(&self, s: Option<Storid>, p: Option<Storid>, o: Option<Storid>) -> Result<()> {
        let object = o.map(|o| self.object_node(o)).transpose()?;
        let delete = self.delete_text(s, p, object.as_ref(), None)?;
        self.write("del_obj_triple_raw_spo", &[&delete])
    }

    // ==================== DATA WRITES ====================

    /// Replace every `(s, p, *)` with the literal `o`
    pub fn set_data_triple_raw_spod(&self, s: Storid, p: Storid, o: &LiteralValue, d: &Datatype) -> Result<()> {
        let marker = self.graph.datatype_marker(d)?;
        let delete = self.delete_text(Some(s), Some(p), None, None)?;
        let insert = self.insert_text(s, p, &ObjectTerm::Literal(o.clone()), Some(&marker))?;
        self.write("set_data_triple_raw_spod", &[&delete, &insert])
    }

    pub fn add_data_triple_raw_spod(&self, s: Storid, p: Storid, o: &LiteralValue, d: &Datatype) -> Result<()> {
        let marker = self.graph.datatype_marker(d)?;
        let insert = self.insert_text(s, p, &ObjectTerm::Literal(o.clone()), Some(&marker))?;
        self.write("add_data_triple_raw_spod", &[&insert])
    }

    /// Delete data triples. The value only constrains the delete when given
    /// together with its datatype.
    pub fn del_data_triple_raw_spod(
        &self,
        s: Option<Storid>,
        p: Option<Storid>,
        o: Option<&LiteralValue>,
        d: Option<&Datatype>,
    ) -> Result<()> {
        let delete = match (o, d) {
            (Some(o), Some(d)) => {
                let marker = self.graph.datatype_marker(d)?;
                self.delete_text(s, p, Some(&ObjectTerm::Literal(o.clone())), Some(&marker))?
            }
            _ => self.delete_text(s, p, None, None)?,
        };
        self.write("del_data_triple_raw_spod", &[&delete])
    }

    // ==================== READS ====================

    pub fn has_obj_triple_spo(&self, s: Option<Storid>, p: Option<Storid>, o: Option<Storid>) -> Result<bool> {
        let pattern = self.scoped(Mode::Object).subject(s).predicate(p).object_entity(o).limit(1);
        Ok(!self.graph.select_pattern("has_obj_triple_spo", &pattern)?.is_empty())
    }

    pub fn get_obj_triples_s_po(&self, s: Storid) -> Result<RowIter<'g, (Storid, Storid)>> {
        let pattern = self.scoped(Mode::Object).subject(Some(s));
        self.graph.rows("get_obj_triples_s_po", &pattern, |_, row| {
            Ok((storid_of(row, "p")?, storid_of(row, "o")?))
        })
    }

    /// Objects of `(s, p)`, each paired with this context
    pub fn get_obj_triples_sp_co(&self, s: Storid, p: Storid) -> Result<RowIter<'g, (Context, Storid)>> {
        let context = self.context;
        let pattern = self.scoped(Mode::Object).subject(Some(s)).predicate(Some(p));
        self.graph
            .rows("get_obj_triples_sp_co", &pattern, move |_, row| Ok((context, storid_of(row, "o")?)))
    }

    pub fn get_data_triples_sp_od(&self, s: Storid, p: Storid) -> Result<RowIter<'g, (String, Datatype)>> {
        let pattern = self.scoped(Mode::Data).subject(Some(s)).predicate(Some(p));
        self.graph.rows("get_data_triples_sp_od", &pattern, |_, row| literal_of(row))
    }

    pub fn get_data_triples_s_pod(&self, s: Storid) -> Result<RowIter<'g, (Storid, String, Datatype)>> {
        let pattern = self.scoped(Mode::Data).subject(Some(s));
        self.graph.rows("get_data_triples_s_pod", &pattern, |_, row| {
            let (value, datatype) = literal_of(row)?;
            Ok((storid_of(row, "p")?, value, datatype))
        })
    }

    pub fn get_obj_triples_po_s(&self, p: Storid, o: Storid) -> Result<RowIter<'g, Storid>> {
        let pattern = self.scoped(Mode::Object).predicate(Some(p)).object_entity(Some(o));
        self.graph.rows("get_obj_triples_po_s", &pattern, |_, row| storid_of(row, "s"))
    }

    pub fn iter_triples(&self, sort_by_s: bool) -> Result<RowIter<'g, (Storid, Storid, Object)>> {
        self.graph.iter_triples_in(self.context, sort_by_s)
    }

    // ==================== NOT SUPPORTED ====================

    pub fn has_data_triple_spod(
        &self,
        _s: Option<Storid>,
        _p: Option<Storid>,
        _o: Option<&LiteralValue>,
        _d: Option<&Datatype>,
    ) -> Result<bool> {
        Err(SpogError::Unimplemented("has_data_triple_spod on a sub-graph"))
    }

    pub fn get_obj_triples_spo_spo(
        &self,
        _s: Option<Storid>,
        _p: Option<Storid>,
        _o: Option<Storid>,
    ) -> Result<Vec<(Storid, Storid, Storid)>> {
        Err(SpogError::Unimplemented("get_obj_triples_spo_spo on a sub-graph"))
    }

    pub fn get_obj_triples_spi_o(&self, _s: Storid, _p: Storid, _inverse: Storid) -> Result<Vec<Storid>> {
        Err(SpogError::Unimplemented("get_obj_triples_spi_o"))
    }

    pub fn get_obj_triples_pio_s(&self, _p: Storid, _inverse: Storid, _o: Storid) -> Result<Vec<Storid>> {
        Err(SpogError::Unimplemented("get_obj_triples_pio_s"))
    }

    pub fn count(&self) -> Result<usize> {
        Err(SpogError::Unimplemented("count on a sub-graph"))
    }

    pub fn destroy(&self) -> Result<()> {
        Err(SpogError::Unimplemented("destroying a sub-graph"))
    }
}
