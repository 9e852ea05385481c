/**
 * graph module
 * Storid-level triple store facade over a SPARQL endpoint
 *
 * - mod: SparqlGraph (contexts, abbreviation, bookkeeping, write lock)
 * - patterns: generic pattern select + named triple-pattern wrappers
 * - subgraph: SparqlSubGraph (one context, mutations)
 * - bookkeeping: internal graph query text
 * - lock: re-entrant write lock
 */

pub mod bookkeeping;
pub mod lock;
pub mod patterns;
pub mod subgraph;

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};
use uuid::Uuid;

use crate::abbrev::AbbreviationTable;
use crate::client::{decode, RawKind, Row, SparqlClient, SparqlResults};
use crate::errors::{Result, SpogError};
use crate::literal::{deserialize, LiteralValue, NodeKind};
use crate::model::{Context, Datatype, QueryValue, Storid};
use crate::query::{NodeRef, QueryGenerator};
use crate::vocab::XSD_STRING;

pub use bookkeeping::{INTERNAL_GRAPH, INTERNAL_NS};
pub use lock::{WriteGuard, WriteLock};
pub use patterns::{Pattern, PatternObject, RowIter, Scope};
pub use subgraph::SparqlSubGraph;

/// Ontology handle as seen by the store: base IRI plus the named graph holding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyRef {
    pub base_iri: String,
    pub graph_iri: String,
}

impl OntologyRef {
    pub fn new(base_iri: impl Into<String>, graph_iri: impl Into<String>) -> Self {
        Self {
            base_iri: base_iri.into(),
            graph_iri: graph_iri.into(),
        }
    }
}

#[derive(Debug, Default)]
struct Contexts {
    by_context: BTreeMap<Context, OntologyRef>,
    by_graph: HashMap<String, Context>,
    /// Attach order; every pattern query spans these graphs
    named_graph_iris: Vec<String>,
}

pub struct SparqlGraph {
    client: SparqlClient,
    generator: QueryGenerator,
    table: AbbreviationTable,
    contexts: RwLock<Contexts>,
    internal_graph: String,
    lock: WriteLock,
}

impl SparqlGraph {
    pub fn new(client: SparqlClient, generator: QueryGenerator, internal_graph: impl Into<String>) -> Self {
        Self {
            client,
            generator,
            table: AbbreviationTable::new(),
            contexts: RwLock::new(Contexts::default()),
            internal_graph: internal_graph.into(),
            lock: WriteLock::new(),
        }
    }

    pub fn client(&self) -> &SparqlClient {
        &self.client
    }

    pub fn generator(&self) -> &QueryGenerator {
        &self.generator
    }

    pub fn table(&self) -> &AbbreviationTable {
        &self.table
    }

    pub fn internal_graph(&self) -> &str {
        &self.internal_graph
    }

    pub fn write_lock(&self) -> WriteGuard<'_> {
        self.lock.acquire()
    }

    pub fn has_write_lock(&self) -> bool {
        self.lock.level() > 0
    }

    pub fn write_lock_level(&self) -> usize {
        self.lock.level()
    }

    /// Named graphs of every attached ontology, in attach order
    pub fn named_graph_iris(&self) -> Vec<String> {
        self.contexts.read().named_graph_iris.clone()
    }

    // ==================== CONTEXTS ====================

    /// Register an ontology and open its sub-graph.
    ///
    /// `is_new` is false when the named graph already holds triples, or when
    /// `base_iri` is a known alias (the ontology is then redirected to the
    /// aliased base IRI and graph). Attaching the same graph twice reuses its
    /// context.
    pub fn attach(&self, ontology: OntologyRef) -> Result<(SparqlSubGraph<'_>, bool)> {
        let mut ontology = ontology;
        let found = self.client.select("attach", &bookkeeping::graph_check(&ontology.graph_iri)?)?;
        let mut is_new = found.is_empty();

        if is_new {
            let aliases = self
                .client
                .select("attach", &bookkeeping::alias_lookup(&self.internal_graph, &ontology.base_iri)?)?;
            if let Some(entry) = aliases.rows().first() {
                if let (Some(iri), Some(graph)) = (entry.get("iri"), entry.get("graph")) {
                    debug!(alias = %ontology.base_iri, iri = %iri.value, graph = %graph.value, "resolved ontology alias");
                    ontology.base_iri = iri.value.clone();
                    ontology.graph_iri = graph.value.clone();
                    is_new = false;
                }
            }
        }

        let context = {
            let mut contexts = self.contexts.write();
            let context = match contexts.by_graph.get(&ontology.graph_iri) {
                Some(context) => *context,
                None => contexts.by_context.keys().next_back().copied().unwrap_or(0) + 1,
            };
            if !contexts.named_graph_iris.contains(&ontology.graph_iri) {
                contexts.named_graph_iris.push(ontology.graph_iri.clone());
            }
            contexts.by_graph.insert(ontology.graph_iri.clone(), context);
            contexts.by_context.insert(context, ontology.clone());
            context
        };
        info!(context = context, graph = %ontology.graph_iri, is_new = is_new, "attached ontology");
        Ok((SparqlSubGraph::new(self, context, ontology), is_new))
    }

    /// Ontology registered under `context`
    pub fn context_ontology(&self, context: Context) -> Result<OntologyRef> {
        self.contexts
            .read()
            .by_context
            .get(&context)
            .cloned()
            .ok_or(SpogError::UnknownContext(context))
    }

    pub fn context_of_graph(&self, graph_iri: &str) -> Option<Context> {
        self.contexts.read().by_graph.get(graph_iri).copied()
    }

    /// (context, base IRI) of every attached ontology
    pub fn ontology_iris_by_context(&self) -> Vec<(Context, String)> {
        self.contexts
            .read()
            .by_context
            .iter()
            .map(|(context, ontology)| (*context, ontology.base_iri.clone()))
            .collect()
    }

    // ==================== BOOKKEEPING ====================

    /// Record `alias` as another name for the ontology `iri` stored in `graph_iri`.
    /// An existing entry for the same alias is replaced.
    pub fn add_ontology_alias(&self, iri: &str, alias: &str, graph_iri: &str) -> Result<()> {
        let delete = bookkeeping::alias_delete(&self.internal_graph, alias)?;
        let insert = bookkeeping::alias_insert(&self.internal_graph, alias, iri, graph_iri)?;
        let _guard = self.write_lock();
        self.client.update("add_ontology_alias", &[&delete, &insert])
    }

    /// Base IRIs of every ontology recorded in the internal graph
    pub fn ontology_iris(&self) -> Result<Vec<String>> {
        let results = self
            .client
            .select("ontology_iris", &bookkeeping::alias_list(&self.internal_graph)?)?;
        let mut iris: Vec<String> = Vec::new();
        for row in results.rows() {
            if let Some(iri) = row.get("iri") {
                if !iris.contains(&iri.value) {
                    iris.push(iri.value.clone());
                }
            }
        }
        Ok(iris)
    }

    /// Next IRI `<prefix><n>` from the counter kept in the internal graph.
    /// The counter update is one delete+insert request under the write lock.
    pub fn new_numbered_iri(&self, prefix: &str) -> Result<String> {
        let _guard = self.write_lock();
        let results = self
            .client
            .select("new_numbered_iri", &bookkeeping::counter_select(&self.internal_graph, prefix)?)?;
        let current = results
            .rows()
            .iter()
            .filter_map(|row| row.get("n").and_then(|n| n.value.trim().parse::<i64>().ok()))
            .max()
            .unwrap_or(0);
        let next = current + 1;

        let delete = bookkeeping::counter_delete(&self.internal_graph, prefix)?;
        let insert = bookkeeping::counter_insert(&self.internal_graph, prefix, next)?;
        self.client.update("new_numbered_iri", &[&delete, &insert])?;
        Ok(format!("{}{}", prefix, next))
    }

    /// Create a blank node and return its (negative) storid.
    ///
    /// A uuid marker triple is inserted into the internal graph, its internal
    /// id read back, then the marker is deleted.
    pub fn new_blank_node(&self) -> Result<Storid> {
        let node_id_predicate = self
            .generator
            .node_id_predicate()
            .ok_or_else(|| SpogError::InvalidInput("blank node creation needs a node id predicate".to_string()))?
            .to_string();
        let marker = Uuid::new_v4().to_string();

        let _guard = self.write_lock();
        self.client
            .update("new_blank_node", &[&bookkeeping::marker_insert(&self.internal_graph, &marker)?])?;
        let internal = self.marker_internal_id(&marker, &node_id_predicate);
        // the marker goes away whether or not its id could be read
        self.client
            .update("new_blank_node", &[&bookkeeping::marker_delete(&self.internal_graph, &marker)?])?;
        let internal = internal?;

        debug!(storid = -internal, "created blank node");
        Ok(-internal)
    }

    fn marker_internal_id(&self, marker: &str, node_id_predicate: &str) -> Result<i64> {
        let results = self.client.select(
            "new_blank_node",
            &bookkeeping::marker_id(&self.internal_graph, marker, node_id_predicate)?,
        )?;
        results
            .rows()
            .first()
            .and_then(|row| row.get("id"))
            .and_then(|id| id.value.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| SpogError::Decode(format!("no internal id reported for blank node marker {}", marker)))
    }

    /// Run a caller-written query and decode every cell.
    ///
    /// Cells follow the `head.vars` order; unbound cells are `None`; blank
    /// nodes get per-result-set labels `_:temp-bnode-N`. Updates return no rows.
    pub fn query_values(&self, sparql: &str) -> Result<Vec<Vec<Option<QueryValue>>>> {
        let Some(results) = self.client.execute("query_values", &[sparql], None)? else {
            return Ok(Vec::new());
        };
        let mut blank_count = 0;
        let mut values = Vec::with_capacity(results.len());
        for binding in results.rows() {
            let mut row = Vec::with_capacity(results.head.vars.len());
            for var in &results.head.vars {
                let Some(raw) = binding.get(var) else {
                    row.push(None);
                    continue;
                };
                let value = match raw.kind {
                    RawKind::Uri => QueryValue::Entity(self.table.get_or_insert(&raw.value)),
                    RawKind::Bnode => {
                        blank_count += 1;
                        QueryValue::TempBlank(format!("_:temp-bnode-{}", blank_count))
                    }
                    RawKind::Literal | RawKind::TypedLiteral => match &raw.lang {
                        Some(lang) if !lang.is_empty() => {
                            QueryValue::Literal(LiteralValue::LangString(raw.value.clone(), lang.clone()))
                        }
                        _ => QueryValue::Literal(deserialize(
                            &raw.value,
                            NodeKind::Literal,
                            Some(raw.datatype.as_deref().unwrap_or(XSD_STRING)),
                        )?),
                    },
                };
                row.push(Some(value));
            }
            values.push(row);
        }
        Ok(values)
    }

    /// Number of triples across the attached graphs
    pub fn count(&self) -> Result<usize> {
        let graph_iris = self.named_graph_iris();
        if graph_iris.is_empty() {
            return Ok(0);
        }
        let results = self.client.select("count", &self.generator.generate_count(&graph_iris)?)?;
        let rows = self.decode_rows(&results)?;
        Ok(rows
            .first()
            .and_then(|row| row.integer("count"))
            .map(|count| count.max(0) as usize)
            .unwrap_or(0))
    }

    // ==================== ABBREVIATION ====================

    pub fn abbreviate(&self, iri: &str) -> Storid {
        self.table.get_or_insert(iri)
    }

    /// Storid of `iri` only if it is already known or appears in an attached
    /// graph (one existence query); `None` otherwise.
    pub fn abbreviate_if_exists(&self, iri: &str) -> Result<Option<Storid>> {
        if let Some(storid) = self.table.lookup(iri) {
            return Ok(Some(storid));
        }
        let graph_iris = self.named_graph_iris();
        if graph_iris.is_empty() {
            return Ok(None);
        }
        let results = self
            .client
            .select("abbreviate", &self.generator.generate_existence(iri, &graph_iris)?)?;
        if results.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.table.get_or_insert(iri)))
        }
    }

    pub fn unabbreviate(&self, storid: Storid) -> Option<NodeRef> {
        self.table.resolve(storid)
    }

    /// IRI (or `@tag`) of a datatype marker
    pub fn unabbreviate_datatype(&self, datatype: &Datatype) -> Option<String> {
        match datatype {
            Datatype::Lang(tag) => Some(format!("@{}", tag)),
            Datatype::Id(storid) => self.table.iri(*storid),
        }
    }

    pub fn abbreviate_all(&self, iris: &[&str]) -> Vec<Storid> {
        self.table.get_or_insert_all(iris)
    }

    pub fn unabbreviate_all(&self, storids: &[Storid]) -> Vec<Option<NodeRef>> {
        self.table.resolve_all(storids)
    }

    pub fn restore_iri(&self, storid: Storid, iri: &str) -> Result<()> {
        self.table.restore(storid, iri)
    }

    pub fn refactor(&self, storid: Storid, new_iri: &str) -> Result<()> {
        self.table.refactor(storid, new_iri)
    }

    // ==================== NOT SUPPORTED ====================

    pub fn destroy_entity(&self, _storid: Storid) -> Result<()> {
        Err(SpogError::Unimplemented("destroy_entity"))
    }

    pub fn enable_full_text_search(&self, _predicate: Storid) -> Result<()> {
        Err(SpogError::Unimplemented("full-text search"))
    }

    pub fn disable_full_text_search(&self, _predicate: Storid) -> Result<()> {
        Err(SpogError::Unimplemented("full-text search"))
    }

    // ==================== HELPERS ====================

    pub(crate) fn decode_rows(&self, results: &SparqlResults) -> Result<Vec<Row>> {
        decode(results, &|iri| self.table.get_or_insert(iri))
    }

    /// Node for a storid that must be known
    pub(crate) fn node(&self, storid: Storid) -> Result<NodeRef> {
        self.table.resolve(storid).ok_or(SpogError::UnknownStorid(storid))
    }

    pub(crate) fn predicate_iri(&self, storid: Storid) -> Result<String> {
        match self.node(storid)? {
            NodeRef::Iri(iri) => Ok(iri),
            NodeRef::Blank(_) => Err(SpogError::InvalidInput(format!("predicate {} is a blank node", storid))),
        }
    }

    pub(crate) fn datatype_marker(&self, datatype: &Datatype) -> Result<String> {
        match datatype {
            Datatype::Lang(tag) => Ok(format!("@{}", tag)),
            Datatype::Id(storid) => self.table.iri(*storid).ok_or(SpogError::UnknownStorid(*storid)),
        }
    }
}
