/**
 * generator.rs
 * SPARQL SELECT / INSERT / DELETE text for storid-level triple patterns
 *
 * Pure: no I/O, no mutable state, same input => same text.
 * Blank nodes are addressed through the store's internal node id predicate
 * (GraphDB: http://www.ontotext.com/owlim/entity#id), never by label.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::pattern::{Binding, Mode, NodeRef, ObjectTerm, SelectQuery};
use crate::errors::{Result, SpogError};
use crate::literal::{escape_string, iri_ref, serialize};

/// GraphDB internal entity id predicate
pub const GRAPHDB_ENTITY_ID: &str = "http://www.ontotext.com/owlim/entity#id";

const LITERAL_FILTER: &str = "filter(!isIRI(?o) && !isBlank(?o))";
const NODE_FILTER: &str = "filter(isIRI(?o) || isBlank(?o))";
const INDENT: &str = "    ";

static ORDER_BY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_?() ]+$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryGenerator {
    node_id_predicate: Option<String>,
}

impl Default for QueryGenerator {
    fn default() -> Self {
        Self::graphdb()
    }
}

impl QueryGenerator {
    pub fn new(node_id_predicate: Option<String>) -> Self {
        Self { node_id_predicate }
    }

    /// Generator using the GraphDB entity id predicate
    pub fn graphdb() -> Self {
        Self::new(Some(GRAPHDB_ENTITY_ID.to_string()))
    }

    /// Generator for stores without an internal node id predicate.
    /// Blank-node positions are rejected.
    pub fn without_node_ids() -> Self {
        Self::new(None)
    }

    pub fn node_id_predicate(&self) -> Option<&str> {
        self.node_id_predicate.as_deref()
    }

    fn node_id_ref(&self, position: &str) -> Result<String> {
        match &self.node_id_predicate {
            Some(predicate) => iri_ref(predicate),
            None => Err(SpogError::InvalidInput(format!(
                "blank node in {} position needs a node id predicate",
                position
            ))),
        }
    }

    /// `?var <id> n .` lookup for a blank node
    fn blank_lookup(&self, var: &str, node: &NodeRef) -> Result<String> {
        let internal = node.internal_id().unwrap_or_default();
        Ok(format!("?{} {} {} .", var, self.node_id_ref(var)?, internal))
    }

    fn bind_node(&self, var: &str, node: &NodeRef, binds: &mut Vec<String>) -> Result<()> {
        match node {
            NodeRef::Iri(iri) => binds.push(format!("bind({} as ?{})", iri_ref(iri)?, var)),
            NodeRef::Blank(_) => {
                if var == "p" {
                    return Err(SpogError::InvalidInput("predicate cannot be a blank node".to_string()));
                }
                self.node_id_ref(var)?;
                binds.push(format!("bind({} as ?{}id)", node.internal_id().unwrap_or_default(), var));
            }
        }
        Ok(())
    }

    fn bind_position(&self, var: &str, binding: &Binding, binds: &mut Vec<String>, filters: &mut Vec<String>) -> Result<()> {
        match binding {
            Binding::Unbound => Ok(()),
            Binding::One(node) => self.bind_node(var, node, binds),
            Binding::Any(candidates) => {
                if candidates.is_empty() {
                    return Err(SpogError::InvalidInput(format!("empty candidate list for ?{}", var)));
                }
                let mut terms = Vec::with_capacity(candidates.len());
                for candidate in candidates {
                    match candidate {
                        NodeRef::Iri(iri) => terms.push(format!("?{} = {}", var, iri_ref(iri)?)),
                        NodeRef::Blank(_) if var == "p" => {
                            return Err(SpogError::InvalidInput("predicate cannot be a blank node".to_string()));
                        }
                        NodeRef::Blank(_) => {
                            self.node_id_ref(var)?;
                            terms.push(format!("?{}id = {}", var, candidate.internal_id().unwrap_or_default()));
                        }
                    }
                }
                filters.push(format!("filter({})", terms.join(" || ")));
                Ok(())
            }
        }
    }

    fn datatype_filter(datatype: &str) -> Result<String> {
        match datatype.strip_prefix('@') {
            Some(tag) => Ok(format!("filter(lang(?o) = {})", escape_string(tag))),
            None => Ok(format!("filter(datatype(?o) = {})", iri_ref(datatype)?)),
        }
    }

    fn object_constraints(&self, query: &SelectQuery, mode: Mode, binds: &mut Vec<String>, filters: &mut Vec<String>) -> Result<()> {
        let datatype = query.datatype.as_deref();
        match (mode, &query.object) {
            (Mode::Object, None) => filters.push(NODE_FILTER.to_string()),
            (Mode::Object, Some(ObjectTerm::Node(node))) => self.bind_node("o", node, binds)?,
            (Mode::Object, Some(ObjectTerm::Literal(_))) => {
                return Err(SpogError::InvalidInput("literal object given to an object-only pattern".to_string()));
            }
            (Mode::Data, Some(ObjectTerm::Node(_))) => {
                return Err(SpogError::InvalidInput("node object given to a data-only pattern".to_string()));
            }
            (Mode::Data | Mode::Mixed, Some(ObjectTerm::Literal(value))) => {
                binds.push(format!("bind({} as ?o)", serialize(value, datatype)?));
            }
            (Mode::Mixed, Some(ObjectTerm::Node(node))) => self.bind_node("o", node, binds)?,
            (Mode::Data | Mode::Mixed, None) => match datatype {
                Some(datatype) => {
                    filters.push(LITERAL_FILTER.to_string());
                    filters.push(Self::datatype_filter(datatype)?);
                }
                None if mode == Mode::Data => filters.push(LITERAL_FILTER.to_string()),
                None => {}
            },
        }
        Ok(())
    }

    fn dataset(default_graph_iri: Option<&str>, graph_iris: &[String]) -> Result<Vec<String>> {
        let mut clauses = Vec::with_capacity(graph_iris.len() + 1);
        if let Some(graph_iri) = default_graph_iri {
            clauses.push(format!("from {}", iri_ref(graph_iri)?));
        }
        for graph_iri in graph_iris {
            clauses.push(format!("from named {}", iri_ref(graph_iri)?));
        }
        Ok(clauses)
    }

    /// Build a SELECT over `?s ?p ?o` (plus `?g` across named graphs and
    /// `?sid ?oid` internal ids when available)
    ///
    /// # Example
    ///
    /// ```
    /// use spog_core::query::{NodeRef, QueryGenerator, SelectQuery};
    ///
    /// let generator = QueryGenerator::graphdb();
    /// let query = SelectQuery::new()
    ///     .objects()
    ///     .subject(NodeRef::iri("http://ex.org/A"))
    ///     .default_graph("http://ex.org/onto");
    /// let text = generator.generate_select(&query).unwrap();
    /// assert!(text.contains("bind(<http://ex.org/A> as ?s)"));
    /// assert!(text.contains("from <http://ex.org/onto>"));
    /// ```
    pub fn generate_select(&self, query: &SelectQuery) -> Result<String> {
        let mode = Mode::from_flags(query.object_mode, query.data_mode)
            .ok_or_else(|| SpogError::InvalidInput("object mode and data mode cannot both be unset".to_string()))?;
        if !query.graph_iris.is_empty() && query.default_graph_iri.is_some() {
            return Err(SpogError::InvalidInput(
                "graph_iris and default_graph_iri are mutually exclusive".to_string(),
            ));
        }

        let mut binds = Vec::new();
        let mut filters = Vec::new();
        self.bind_position("s", &query.subject, &mut binds, &mut filters)?;
        self.bind_position("p", &query.predicate, &mut binds, &mut filters)?;
        self.object_constraints(query, mode, &mut binds, &mut filters)?;

        let include_graph = !query.graph_iris.is_empty();
        let mut projection = Vec::new();
        if include_graph {
            projection.push("?g");
        }
        projection.extend(["?s", "?p", "?o"]);

        let mut body = binds;
        body.push(if include_graph {
            "graph ?g { ?s ?p ?o . }".to_string()
        } else {
            "?s ?p ?o .".to_string()
        });
        if let Some(predicate) = &self.node_id_predicate {
            let predicate = iri_ref(predicate)?;
            projection.extend(["?sid", "?oid"]);
            body.push(format!("?s {} ?sid .", predicate));
            body.push(format!("?o {} ?oid .", predicate));
        }
        body.extend(filters);

        let mut lines = vec![format!(
            "select {}{}",
            if query.distinct { "distinct " } else { "" },
            projection.join(" ")
        )];
        lines.extend(Self::dataset(query.default_graph_iri.as_deref(), &query.graph_iris)?);
        lines.push("where {".to_string());
        lines.extend(body.into_iter().map(|line| format!("{}{}", INDENT, line)));
        lines.push("}".to_string());
        if let Some(order_by) = &query.order_by {
            if !ORDER_BY.is_match(order_by) {
                return Err(SpogError::InvalidInput(format!("unsupported order by expression '{}'", order_by)));
            }
            lines.push(format!("order by {}", order_by));
        }
        if let Some(limit) = query.limit {
            lines.push(format!("limit {}", limit));
        }
        Ok(lines.join("\n"))
    }

    fn object_token(&self, object: &ObjectTerm, datatype: Option<&str>, lookups: &mut Vec<String>) -> Result<String> {
        match object {
            ObjectTerm::Node(node @ NodeRef::Blank(_)) => {
                lookups.push(self.blank_lookup("o", node)?);
                Ok("?o".to_string())
            }
            ObjectTerm::Node(NodeRef::Iri(iri)) => iri_ref(iri),
            ObjectTerm::Literal(value) => serialize(value, datatype),
        }
    }

    fn subject_token(&self, subject: &NodeRef, lookups: &mut Vec<String>) -> Result<String> {
        match subject {
            NodeRef::Iri(iri) => iri_ref(iri),
            NodeRef::Blank(_) => {
                lookups.push(self.blank_lookup("s", subject)?);
                Ok("?s".to_string())
            }
        }
    }

    /// Build an INSERT of one triple into `graph_iri`.
    ///
    /// Literal objects without a datatype are encoded from the value itself.
    pub fn generate_insert(
        &self,
        subject: &NodeRef,
        predicate: &str,
        object: &ObjectTerm,
        datatype: Option<&str>,
        graph_iri: Option<&str>,
    ) -> Result<String> {
        let graph_iri = graph_iri.ok_or_else(|| SpogError::InvalidInput("insert needs a target named graph".to_string()))?;
        let mut lookups = Vec::new();
        let triple = format!(
            "{} {} {} .",
            self.subject_token(subject, &mut lookups)?,
            iri_ref(predicate)?,
            self.object_token(object, datatype, &mut lookups)?
        );
        let graph = format!("{}graph {} {{ {} }}", INDENT, iri_ref(graph_iri)?, triple);

        if lookups.is_empty() {
            Ok(format!("insert data {{\n{}\n}}", graph))
        } else {
            let lookups: Vec<String> = lookups.into_iter().map(|line| format!("{}{}", INDENT, line)).collect();
            Ok(format!("insert {{\n{}\n}}\nwhere {{\n{}\n}}", graph, lookups.join("\n")))
        }
    }

    /// Build a DELETE scoped to `graph_iri`; unbound positions match anything.
    pub fn generate_delete(
        &self,
        subject: Option<&NodeRef>,
        predicate: Option<&str>,
        object: Option<&ObjectTerm>,
        datatype: Option<&str>,
        graph_iri: Option<&str>,
    ) -> Result<String> {
        let graph_iri = graph_iri.ok_or_else(|| SpogError::InvalidInput("delete needs a target named graph".to_string()))?;
        let mut lookups = Vec::new();
        let subject = match subject {
            Some(subject) => self.subject_token(subject, &mut lookups)?,
            None => "?s".to_string(),
        };
        let predicate = match predicate {
            Some(predicate) => iri_ref(predicate)?,
            None => "?p".to_string(),
        };
        let object = match object {
            Some(object) => self.object_token(object, datatype, &mut lookups)?,
            None => "?o".to_string(),
        };
        let graph = format!("{}graph {} {{ {} {} {} . }}", INDENT, iri_ref(graph_iri)?, subject, predicate, object);

        if lookups.is_empty() {
            Ok(format!("delete where {{\n{}\n}}", graph))
        } else {
            let lookups: Vec<String> = lookups.into_iter().map(|line| format!("{}{}", INDENT, line)).collect();
            Ok(format!("delete {{\n{}\n}}\nwhere {{\n{}\n{}\n}}", graph, graph, lookups.join("\n")))
        }
    }

    /// Build a transitive closure query (`<s> <p>+ ?o` or `?s <p>+ <o>`).
    /// Exactly one end must be bound.
    pub fn generate_transitive(
        &self,
        subject: Option<&NodeRef>,
        predicate: &str,
        object: Option<&NodeRef>,
        graph_iris: &[String],
    ) -> Result<String> {
        let mut lookups = Vec::new();
        let (path, result_var) = match (subject, object) {
            (Some(subject), None) => {
                let start = match subject {
                    NodeRef::Iri(iri) => iri_ref(iri)?,
                    NodeRef::Blank(_) => {
                        lookups.push(self.blank_lookup("start", subject)?);
                        "?start".to_string()
                    }
                };
                (format!("{} {}+ ?o .", start, iri_ref(predicate)?), "o")
            }
            (None, Some(object)) => {
                let end = match object {
                    NodeRef::Iri(iri) => iri_ref(iri)?,
                    NodeRef::Blank(_) => {
                        lookups.push(self.blank_lookup("end", object)?);
                        "?end".to_string()
                    }
                };
                (format!("?s {}+ {} .", iri_ref(predicate)?, end), "s")
            }
            _ => {
                return Err(SpogError::InvalidInput(
                    "transitive query needs exactly one bound end".to_string(),
                ))
            }
        };

        let mut projection = format!("?{}", result_var);
        let mut body = lookups;
        body.push(if graph_iris.is_empty() { path } else { format!("graph ?g {{ {} }}", path) });
        if let Some(predicate) = &self.node_id_predicate {
            projection.push_str(&format!(" ?{}id", result_var));
            body.push(format!("?{} {} ?{}id .", result_var, iri_ref(predicate)?, result_var));
        }

        let mut lines = vec![format!("select distinct {}", projection)];
        lines.extend(Self::dataset(None, graph_iris)?);
        lines.push("where {".to_string());
        lines.extend(body.into_iter().map(|line| format!("{}{}", INDENT, line)));
        lines.push("}".to_string());
        Ok(lines.join("\n"))
    }

    /// Count triples across the given named graphs
    pub fn generate_count(&self, graph_iris: &[String]) -> Result<String> {
        let mut lines = vec!["select (count(?s) as ?count)".to_string()];
        lines.extend(Self::dataset(None, graph_iris)?);
        lines.push("where {".to_string());
        lines.push(format!("{}graph ?g {{ ?s ?p ?o . }}", INDENT));
        lines.push("}".to_string());
        Ok(lines.join("\n"))
    }

    /// Does `iri` appear in any position of the given named graphs?
    pub fn generate_existence(&self, iri: &str, graph_iris: &[String]) -> Result<String> {
        let mut lines = vec!["select distinct ?uri".to_string()];
        lines.extend(Self::dataset(None, graph_iris)?);
        lines.push("where {".to_string());
        lines.push(format!("{}bind({} as ?uri)", INDENT, iri_ref(iri)?));
        lines.push(format!(
            "{}graph ?g {{ {{ ?uri ?p ?o . }} union {{ ?s ?uri ?o . }} union {{ ?s ?p ?uri . }} }}",
            INDENT
        ));
        lines.push("}".to_string());
        lines.push("limit 1".to_string());
        Ok(lines.join("\n"))
    }
}
