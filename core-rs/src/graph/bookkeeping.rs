/**
 * bookkeeping.rs
 * Query text for the internal bookkeeping graph
 *
 * Layout (namespace http://owlready2/internal#, shared with stores populated
 * by earlier tooling):
 *   [] or2:alias "alias" ; or2:iri <base iri> ; or2:graph <graph iri> .
 *   <prefix> or2:counter 12 .
 *   [] or2:uuid "..." .          (transient blank-node marker)
 */

use crate::errors::Result;
use crate::literal::{escape_string, iri_ref};

pub const INTERNAL_GRAPH: &str = "http://owlready2/internal";
pub const INTERNAL_NS: &str = "http://owlready2/internal#";

fn prologue() -> String {
    format!("prefix or2: <{}>", INTERNAL_NS)
}

/// Any triple at all in `graph_iri`?
pub fn graph_check(graph_iri: &str) -> Result<String> {
    Ok(format!(
        "select ?s\nfrom {}\nwhere {{\n    ?s ?p ?o .\n}}\nlimit 1",
        iri_ref(graph_iri)?
    ))
}

/// Alias entry for `alias` (columns ?iri ?graph)
pub fn alias_lookup(internal_graph: &str, alias: &str) -> Result<String> {
    Ok(format!(
        "{}\nselect ?iri ?graph\nfrom {}\nwhere {{\n    ?entry or2:alias {} ;\n        or2:iri ?iri ;\n        or2:graph ?graph .\n}}\nlimit 1",
        prologue(),
        iri_ref(internal_graph)?,
        escape_string(alias)
    ))
}

/// Every alias entry (columns ?alias ?iri ?graph)
pub fn alias_list(internal_graph: &str) -> Result<String> {
    Ok(format!(
        "{}\nselect distinct ?alias ?iri ?graph\nfrom {}\nwhere {{\n    ?entry or2:alias ?alias ;\n        or2:iri ?iri ;\n        or2:graph ?graph .\n}}",
        prologue(),
        iri_ref(internal_graph)?
    ))
}

pub fn alias_delete(internal_graph: &str, alias: &str) -> Result<String> {
    Ok(format!(
        "{}\ndelete where {{\n    graph {} {{ ?entry or2:alias {} ; or2:iri ?iri ; or2:graph ?graph . }}\n}}",
        prologue(),
        iri_ref(internal_graph)?,
        escape_string(alias)
    ))
}

pub fn alias_insert(internal_graph: &str, alias: &str, iri: &str, graph_iri: &str) -> Result<String> {
    Ok(format!(
        "{}\ninsert data {{\n    graph {} {{ [] or2:alias {} ; or2:iri {} ; or2:graph {} . }}\n}}",
        prologue(),
        iri_ref(internal_graph)?,
        escape_string(alias),
        iri_ref(iri)?,
        iri_ref(graph_iri)?
    ))
}

/// Current counter of `prefix` (column ?n)
pub fn counter_select(internal_graph: &str, prefix: &str) -> Result<String> {
    Ok(format!(
        "{}\nselect ?n\nfrom {}\nwhere {{\n    {} or2:counter ?n .\n}}",
        prologue(),
        iri_ref(internal_graph)?,
        iri_ref(prefix)?
    ))
}

pub fn counter_delete(internal_graph: &str, prefix: &str) -> Result<String> {
    Ok(format!(
        "{}\ndelete where {{\n    graph {} {{ {} or2:counter ?n . }}\n}}",
        prologue(),
        iri_ref(internal_graph)?,
        iri_ref(prefix)?
    ))
}

pub fn counter_insert(internal_graph: &str, prefix: &str, value: i64) -> Result<String> {
    Ok(format!(
        "{}\ninsert data {{\n    graph {} {{ {} or2:counter {} . }}\n}}",
        prologue(),
        iri_ref(internal_graph)?,
        iri_ref(prefix)?,
        value
    ))
}

pub fn marker_insert(internal_graph: &str, uuid: &str) -> Result<String> {
    Ok(format!(
        "{}\ninsert data {{\n    graph {} {{ [] or2:uuid {} . }}\n}}",
        prologue(),
        iri_ref(internal_graph)?,
        escape_string(uuid)
    ))
}

/// Internal id of the marker node (column ?id)
pub fn marker_id(internal_graph: &str, uuid: &str, node_id_predicate: &str) -> Result<String> {
    Ok(format!(
        "{}\nselect ?id\nfrom {}\nwhere {{\n    ?s or2:uuid {} .\n    ?s {} ?id .\n}}",
        prologue(),
        iri_ref(internal_graph)?,
        escape_string(uuid),
        iri_ref(node_id_predicate)?
    ))
}

pub fn marker_delete(internal_graph: &str, uuid: &str) -> Result<String> {
    Ok(format!(
        "{}\ndelete where {{\n    graph {} {{ ?s or2:uuid {} . }}\n}}",
        prologue(),
        iri_ref(internal_graph)?,
        escape_string(uuid)
    ))
}
