//! Triple-pattern reads
//!
//! Every read goes through [`SparqlGraph::select_pattern`]: a [`Pattern`]
//! says which positions are bound, which kind of objects to return and which
//! graphs to search. The named wrappers (`get_obj_triples_sp_o`, ...) only
//! choose the pattern and the shape of each result item.
//!
//! Wrappers returning [`RowIter`] execute exactly one query up front; rows
//! are abbreviated and shaped lazily as the iterator is consumed.

use std::collections::{HashMap, HashSet};
use std::vec;

use super::SparqlGraph;
use crate::client::{decode_row, RawTerm, Row, Term};
use crate::errors::{Result, SpogError};
use crate::literal::LiteralValue;
use crate::model::{Context, Datatype, Object, Storid};
use crate::query::{Binding, Mode, ObjectTerm, SelectQuery};

/// Bound object of a pattern
#[derive(Debug, Clone, PartialEq)]
pub enum PatternObject {
    Entity(Storid),
    Literal(LiteralValue),
}

/// Graphs a pattern searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Every attached named graph, with a `?g` column
    #[default]
    AllGraphs,
    /// One context's graph, queried as the default graph
    Context(Context),
}

/// Storid-level triple pattern
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub mode: Mode,
    /// Empty = unbound, one = bound, several = any of them
    pub subjects: Vec<Storid>,
    pub predicates: Vec<Storid>,
    pub object: Option<PatternObject>,
    pub datatype: Option<Datatype>,
    pub scope: Scope,
    pub distinct: bool,
    pub limit: Option<usize>,
    pub sort_by_subject: bool,
}

impl Pattern {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            subjects: Vec::new(),
            predicates: Vec::new(),
            object: None,
            datatype: None,
            scope: Scope::AllGraphs,
            distinct: false,
            limit: None,
            sort_by_subject: false,
        }
    }

    pub fn subject(mut self, subject: Option<Storid>) -> Self {
        self.subjects = subject.into_iter().collect();
        self
    }

    pub fn subjects(mut self, subjects: &[Storid]) -> Self {
        self.subjects = subjects.to_vec();
        self
    }

    pub fn predicate(mut self, predicate: Option<Storid>) -> Self {
        self.predicates = predicate.into_iter().collect();
        self
    }

    pub fn predicates(mut self, predicates: &[Storid]) -> Self {
        self.predicates = predicates.to_vec();
        self
    }

    pub fn object_entity(mut self, object: Option<Storid>) -> Self {
        self.object = object.map(PatternObject::Entity);
        self
    }

    pub fn object_literal(mut self, object: Option<&LiteralValue>) -> Self {
        self.object = object.cloned().map(PatternObject::Literal);
        self
    }

    pub fn datatype(mut self, datatype: Option<&Datatype>) -> Self {
        self.datatype = datatype.cloned();
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sorted(mut self, sort_by_subject: bool) -> Self {
        self.sort_by_subject = sort_by_subject;
        self
    }
}

type RawBinding = HashMap<String, RawTerm>;
type Shape<'a, T> = Box<dyn Fn(&SparqlGraph, &Row) -> Result<T> + 'a>;

/// Lazily decoded rows of one executed query
pub struct RowIter<'a, T> {
    graph: &'a SparqlGraph,
    bindings: vec::IntoIter<RawBinding>,
    shape: Shape<'a, T>,
}

impl<'a, T> RowIter<'a, T> {
    fn new(graph: &'a SparqlGraph, bindings: Vec<RawBinding>, shape: Shape<'a, T>) -> Self {
        Self {
            graph,
            bindings: bindings.into_iter(),
            shape,
        }
    }

    fn empty(graph: &'a SparqlGraph) -> Self {
        Self::new(graph, Vec::new(), Box::new(|_, _| Err(SpogError::Decode("no rows".to_string()))))
    }

    /// Rows not yet consumed
    pub fn remaining(&self) -> usize {
        self.bindings.len()
    }
}

impl<T> Iterator for RowIter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let binding = self.bindings.next()?;
        let graph = self.graph;
        let row = decode_row(&binding, &|iri| graph.table.get_or_insert(iri));
        Some(row.and_then(|row| (self.shape)(graph, &row)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bindings.size_hint()
    }
}

pub(super) fn storid_of(row: &Row, var: &str) -> Result<Storid> {
    row.storid(var)
        .ok_or_else(|| SpogError::Decode(format!("?{} has no storid", var)))
}

fn object_of(row: &Row) -> Result<Object> {
    row.object("o").ok_or_else(|| SpogError::Decode("?o has no storid or value".to_string()))
}

pub(super) fn literal_of(row: &Row) -> Result<(String, Datatype)> {
    match row.get("o") {
        Some(Term::Literal { value, datatype, .. }) => Ok((value.clone(), datatype.clone())),
        _ => Err(SpogError::Decode("?o is not a literal".to_string())),
    }
}

fn context_of(graph: &SparqlGraph, row: &Row) -> Result<Context> {
    let graph_iri = row.iri("g").ok_or_else(|| SpogError::Decode("?g missing".to_string()))?;
    graph
        .context_of_graph(graph_iri)
        .ok_or_else(|| SpogError::Decode(format!("graph {} is not attached", graph_iri)))
}

impl SparqlGraph {
    fn position(&self, storids: &[Storid]) -> Result<Binding> {
        match storids {
            [] => Ok(Binding::Unbound),
            [one] => Ok(Binding::One(self.node(*one)?)),
            many => Ok(Binding::Any(
                many.iter().map(|storid| self.node(*storid)).collect::<Result<Vec<_>>>()?,
            )),
        }
    }

    /// Translate and run a pattern; raw bindings of the single query sent.
    ///
    /// An all-graphs pattern with nothing attached matches nothing and sends
    /// no request.
    pub fn select_pattern(&self, label: &str, pattern: &Pattern) -> Result<Vec<HashMap<String, RawTerm>>> {
        let mut query = SelectQuery::new()
            .mode(pattern.mode)
            .subject(self.position(&pattern.subjects)?)
            .predicate(self.position(&pattern.predicates)?);
        query.object = match &pattern.object {
            Some(PatternObject::Entity(storid)) => Some(ObjectTerm::Node(self.node(*storid)?)),
            Some(PatternObject::Literal(value)) => Some(ObjectTerm::Literal(value.clone())),
            None => None,
        };
        query.datatype = pattern.datatype.as_ref().map(|d| self.datatype_marker(d)).transpose()?;
        query.distinct = pattern.distinct;
        query.limit = pattern.limit;
        if pattern.sort_by_subject {
            query.order_by = Some("asc(?s)".to_string());
        }
        match pattern.scope {
            Scope::AllGraphs => {
                let graph_iris = self.named_graph_iris();
                if graph_iris.is_empty() {
                    return Ok(Vec::new());
                }
                query.graph_iris = graph_iris;
            }
            Scope::Context(context) => {
                query.default_graph_iri = Some(self.context_ontology(context)?.graph_iri);
            }
        }

        let text = self.generator.generate_select(&query)?;
        let results = self.client.select(label, &text)?;
        Ok(results.results.map(|r| r.bindings).unwrap_or_default())
    }

    pub(crate) fn rows<'a, T>(
        &'a self,
        label: &str,
        pattern: &Pattern,
        shape: impl Fn(&SparqlGraph, &Row) -> Result<T> + 'a,
    ) -> Result<RowIter<'a, T>> {
        let bindings = self.select_pattern(label, pattern)?;
        Ok(RowIter::new(self, bindings, Box::new(shape)))
    }

    fn first<T>(&self, label: &str, pattern: Pattern, shape: impl Fn(&SparqlGraph, &Row) -> Result<T>) -> Result<Option<T>> {
        let bindings = self.select_pattern(label, &pattern.limit(1))?;
        match bindings.first() {
            Some(binding) => {
                let row = decode_row(binding, &|iri| self.table.get_or_insert(iri))?;
                shape(self, &row).map(Some)
            }
            None => Ok(None),
        }
    }

    fn exists(&self, label: &str, pattern: Pattern) -> Result<bool> {
        Ok(!self.select_pattern(label, &pattern.limit(1))?.is_empty())
    }

    fn distinct_predicates(&self, label: &str, pattern: Pattern) -> Result<Vec<Storid>> {
        let mut seen = HashSet::new();
        let mut predicates = Vec::new();
        for predicate in self.rows(label, &pattern.distinct(), |_, row| storid_of(row, "p"))? {
            let predicate = predicate?;
            if seen.insert(predicate) {
                predicates.push(predicate);
            }
        }
        Ok(predicates)
    }

    // ==================== SPO / SPOD ====================

    pub fn get_obj_triples_spo_spo(
        &self,
        s: Option<Storid>,
        p: Option<Storid>,
        o: Option<Storid>,
    ) -> Result<RowIter<'_, (Storid, Storid, Storid)>> {
        let pattern = Pattern::new(Mode::Object).subject(s).predicate(p).object_entity(o);
        self.rows("get_obj_triples_spo_spo", &pattern, |_, row| {
            Ok((storid_of(row, "s")?, storid_of(row, "p")?, storid_of(row, "o")?))
        })
    }

    pub fn get_data_triples_spod_spod(
        &self,
        s: Option<Storid>,
        p: Option<Storid>,
        o: Option<&LiteralValue>,
        d: Option<&Datatype>,
    ) -> Result<RowIter<'_, (Storid, Storid, String, Datatype)>> {
        let pattern = Pattern::new(Mode::Data).subject(s).predicate(p).object_literal(o).datatype(d);
        self.rows("get_data_triples_spod_spod", &pattern, |_, row| {
            let (value, datatype) = literal_of(row)?;
            Ok((storid_of(row, "s")?, storid_of(row, "p")?, value, datatype))
        })
    }

    /// Mixed triples; the object cannot be bound here
    pub fn get_triples_spod_spod(
        &self,
        s: Option<Storid>,
        p: Option<Storid>,
        o: Option<&LiteralValue>,
        d: Option<&Datatype>,
    ) -> Result<RowIter<'_, (Storid, Storid, Object)>> {
        if o.is_some() {
            return Err(SpogError::InvalidInput("get_triples_spod_spod takes no object".to_string()));
        }
        let pattern = Pattern::new(Mode::Mixed).subject(s).predicate(p).datatype(d);
        self.rows("get_triples_spod_spod", &pattern, |_, row| {
            Ok((storid_of(row, "s")?, storid_of(row, "p")?, object_of(row)?))
        })
    }

    pub fn get_obj_triples_cspo_cspo(
        &self,
        c: Context,
        s: Option<Storid>,
        p: Option<Storid>,
        o: Option<Storid>,
    ) -> Result<RowIter<'_, (Context, Storid, Storid, Storid)>> {
        let pattern = Pattern::new(Mode::Object)
            .subject(s)
            .predicate(p)
            .object_entity(o)
            .scope(Scope::Context(c));
        self.rows("get_obj_triples_cspo_cspo", &pattern, move |_, row| {
            Ok((c, storid_of(row, "s")?, storid_of(row, "p")?, storid_of(row, "o")?))
        })
    }

    pub fn get_obj_triples_sp_co(&self, s: Storid, p: Storid) -> Result<RowIter<'_, (Context, Storid)>> {
        let pattern = Pattern::new(Mode::Object).subject(Some(s)).predicate(Some(p));
        self.rows("get_obj_triples_sp_co", &pattern, |graph, row| {
            Ok((context_of(graph, row)?, storid_of(row, "o")?))
        })
    }

    // ==================== PREDICATE LISTS ====================

    /// Distinct predicates used with subject `s` (objects and data)
    pub fn get_triples_s_p(&self, s: Storid) -> Result<Vec<Storid>> {
        self.distinct_predicates("get_triples_s_p", Pattern::new(Mode::Mixed).subject(Some(s)))
    }

    /// Distinct predicates pointing at object `o`
    pub fn get_obj_triples_o_p(&self, o: Storid) -> Result<Vec<Storid>> {
        self.distinct_predicates("get_obj_triples_o_p", Pattern::new(Mode::Object).object_entity(Some(o)))
    }

    // ==================== PARTIAL PATTERNS ====================

    pub fn get_obj_triples_s_po(&self, s: Storid) -> Result<RowIter<'_, (Storid, Storid)>> {
        let pattern = Pattern::new(Mode::Object).subject(Some(s));
        self.rows("get_obj_triples_s_po", &pattern, |_, row| {
            Ok((storid_of(row, "p")?, storid_of(row, "o")?))
        })
    }

    pub fn get_obj_triples_sp_o(&self, s: Storid, p: Storid) -> Result<RowIter<'_, Storid>> {
        let pattern = Pattern::new(Mode::Object).subject(Some(s)).predicate(Some(p));
        self.rows("get_obj_triples_sp_o", &pattern, |_, row| storid_of(row, "o"))
    }

    pub fn get_data_triples_sp_od(&self, s: Storid, p: Storid) -> Result<RowIter<'_, (String, Datatype)>> {
        let pattern = Pattern::new(Mode::Data).subject(Some(s)).predicate(Some(p));
        self.rows("get_data_triples_sp_od", &pattern, |_, row| literal_of(row))
    }

    pub fn get_triples_sp_od(&self, s: Storid, p: Storid) -> Result<RowIter<'_, Object>> {
        let pattern = Pattern::new(Mode::Mixed).subject(Some(s)).predicate(Some(p));
        self.rows("get_triples_sp_od", &pattern, |_, row| object_of(row))
    }

    pub fn get_data_triples_s_pod(&self, s: Storid) -> Result<RowIter<'_, (Storid, String, Datatype)>> {
        let pattern = Pattern::new(Mode::Data).subject(Some(s));
        self.rows("get_data_triples_s_pod", &pattern, |_, row| {
            let (value, datatype) = literal_of(row)?;
            Ok((storid_of(row, "p")?, value, datatype))
        })
    }

    pub fn get_triples_s_pod(&self, s: Storid) -> Result<RowIter<'_, (Storid, Object)>> {
        let pattern = Pattern::new(Mode::Mixed).subject(Some(s));
        self.rows("get_triples_s_pod", &pattern, |_, row| Ok((storid_of(row, "p")?, object_of(row)?)))
    }

    pub fn get_obj_triples_po_s(&self, p: Storid, o: Storid) -> Result<RowIter<'_, Storid>> {
        let pattern = Pattern::new(Mode::Object).predicate(Some(p)).object_entity(Some(o));
        self.rows("get_obj_triples_po_s", &pattern, |_, row| storid_of(row, "s"))
    }

    // ==================== SINGLE ROW ====================

    pub fn get_obj_triple_sp_o(&self, s: Storid, p: Storid) -> Result<Option<Storid>> {
        let pattern = Pattern::new(Mode::Object).subject(Some(s)).predicate(Some(p));
        self.first("get_obj_triple_sp_o", pattern, |_, row| storid_of(row, "o"))
    }

    pub fn get_triple_sp_od(&self, s: Storid, p: Storid) -> Result<Option<Object>> {
        let pattern = Pattern::new(Mode::Mixed).subject(Some(s)).predicate(Some(p));
        self.first("get_triple_sp_od", pattern, |_, row| object_of(row))
    }

    pub fn get_data_triple_sp_od(&self, s: Storid, p: Storid) -> Result<Option<(String, Datatype)>> {
        let pattern = Pattern::new(Mode::Data).subject(Some(s)).predicate(Some(p));
        self.first("get_data_triple_sp_od", pattern, |_, row| literal_of(row))
    }

    pub fn get_obj_triple_po_s(&self, p: Storid, o: Storid) -> Result<Option<Storid>> {
        let pattern = Pattern::new(Mode::Object).predicate(Some(p)).object_entity(Some(o));
        self.first("get_obj_triple_po_s", pattern, |_, row| storid_of(row, "s"))
    }

    pub fn has_obj_triple_spo(&self, s: Option<Storid>, p: Option<Storid>, o: Option<Storid>) -> Result<bool> {
        let pattern = Pattern::new(Mode::Object).subject(s).predicate(p).object_entity(o);
        self.exists("has_obj_triple_spo", pattern)
    }

    pub fn has_data_triple_spod(
        &self,
        s: Option<Storid>,
        p: Option<Storid>,
        o: Option<&LiteralValue>,
        d: Option<&Datatype>,
    ) -> Result<bool> {
        let pattern = Pattern::new(Mode::Data).subject(s).predicate(p).object_literal(o).datatype(d);
        self.exists("has_data_triple_spod", pattern)
    }

    // ==================== TRANSITIVE ====================

    fn transitive(&self, label: &str, text: Option<String>, var: &'static str) -> Result<RowIter<'_, Storid>> {
        let Some(text) = text else {
            return Ok(RowIter::empty(self));
        };
        let bindings = self.client.select(label, &text)?.results.map(|r| r.bindings).unwrap_or_default();
        Ok(RowIter::new(self, bindings, Box::new(move |_, row| storid_of(row, var))))
    }

    /// Everything reachable from `s` through one or more `p` edges
    pub fn get_obj_triples_transitive_sp(&self, s: Storid, p: Storid) -> Result<RowIter<'_, Storid>> {
        let graph_iris = self.named_graph_iris();
        let text = if graph_iris.is_empty() {
            None
        } else {
            let subject = self.node(s)?;
            Some(self.generator.generate_transitive(Some(&subject), &self.predicate_iri(p)?, None, &graph_iris)?)
        };
        self.transitive("get_obj_triples_transitive_sp", text, "o")
    }

    /// Everything reaching `o` through one or more `p` edges
    pub fn get_obj_triples_transitive_po(&self, p: Storid, o: Storid) -> Result<RowIter<'_, Storid>> {
        let graph_iris = self.named_graph_iris();
        let text = if graph_iris.is_empty() {
            None
        } else {
            let object = self.node(o)?;
            Some(self.generator.generate_transitive(None, &self.predicate_iri(p)?, Some(&object), &graph_iris)?)
        };
        self.transitive("get_obj_triples_transitive_po", text, "s")
    }

    // ==================== BATCH / FULL SCANS ====================

    /// Quads for every subject x predicate combination, in one query
    pub fn get_quads_sp(
        &self,
        subjects: &[Storid],
        predicates: &[Storid],
    ) -> Result<RowIter<'_, (Context, Storid, Storid, Object)>> {
        if subjects.is_empty() || predicates.is_empty() {
            return Ok(RowIter::empty(self));
        }
        let pattern = Pattern::new(Mode::Mixed).subjects(subjects).predicates(predicates);
        self.rows("get_quads_sp", &pattern, |graph, row| {
            Ok((context_of(graph, row)?, storid_of(row, "s")?, storid_of(row, "p")?, object_of(row)?))
        })
    }

    pub fn iter_triples(&self, sort_by_s: bool) -> Result<RowIter<'_, (Storid, Storid, Object)>> {
        let pattern = Pattern::new(Mode::Mixed).sorted(sort_by_s);
        self.rows("iter_triples", &pattern, |_, row| {
            Ok((storid_of(row, "s")?, storid_of(row, "p")?, object_of(row)?))
        })
    }

    /// Triples of one context
    pub fn iter_triples_in(&self, c: Context, sort_by_s: bool) -> Result<RowIter<'_, (Storid, Storid, Object)>> {
        let pattern = Pattern::new(Mode::Mixed).scope(Scope::Context(c)).sorted(sort_by_s);
        self.rows("iter_triples", &pattern, |_, row| {
            Ok((storid_of(row, "s")?, storid_of(row, "p")?, object_of(row)?))
        })
    }

    pub fn iter_quads(&self, sort_by_s: bool) -> Result<RowIter<'_, (Context, Storid, Storid, Object)>> {
        let pattern = Pattern::new(Mode::Mixed).sorted(sort_by_s);
        self.rows("iter_quads", &pattern, |graph, row| {
            Ok((context_of(graph, row)?, storid_of(row, "s")?, storid_of(row, "p")?, object_of(row)?))
        })
    }

    // ==================== NOT SUPPORTED ====================

    pub fn get_obj_triples_spi_o(&self, _s: Storid, _p: Storid, _inverse: Storid) -> Result<Vec<Storid>> {
        Err(SpogError::Unimplemented("get_obj_triples_spi_o"))
    }

    pub fn get_obj_triples_pio_s(&self, _p: Storid, _inverse: Storid, _o: Storid) -> Result<Vec<Storid>> {
        Err(SpogError::Unimplemented("get_obj_triples_pio_s"))
    }

    /// Raw deletes go through a sub-graph
    pub fn del_obj_triple_raw_spo(&self, _s: Option<Storid>, _p: Option<Storid>, _o: Option<Storid>) -> Result<()> {
        Err(SpogError::Unimplemented("del_obj_triple_raw_spo on the main graph"))
    }

    pub fn del_data_triple_raw_spod(
        &self,
        _s: Option<Storid>,
        _p: Option<Storid>,
        _o: Option<&LiteralValue>,
        _d: Option<&Datatype>,
    ) -> Result<()> {
        Err(SpogError::Unimplemented("del_data_triple_raw_spod on the main graph"))
    }
}
