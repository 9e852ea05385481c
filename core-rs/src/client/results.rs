/**
 * results.rs
 * SPARQL 1.1 JSON results format and the abbreviating row decoder
 *
 * Raw bindings (`type`/`value`/`datatype`/`xml:lang`) are turned into terms:
 * - uri     -> Term::Iri with its storid
 * - bnode   -> Term::Blank, storid = -(value of the `<var>id` column) when present
 * - literal -> Term::Literal with a datatype marker (xsd:string when untyped)
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{Result, SpogError};
use crate::literal::{deserialize, LiteralValue, NodeKind};
use crate::model::{Datatype, Object, Storid};
use crate::vocab::XSD_STRING;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub head: Head,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Bindings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bindings {
    pub bindings: Vec<HashMap<String, RawTerm>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawKind {
    Uri,
    Bnode,
    Literal,
    /// SPARQL 1.0 / older endpoints
    #[serde(rename = "typed-literal")]
    TypedLiteral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTerm {
    #[serde(rename = "type")]
    pub kind: RawKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl RawTerm {
    pub fn uri(value: impl Into<String>) -> Self {
        Self { kind: RawKind::Uri, value: value.into(), datatype: None, lang: None }
    }

    pub fn bnode(label: impl Into<String>) -> Self {
        Self { kind: RawKind::Bnode, value: label.into(), datatype: None, lang: None }
    }

    pub fn literal(value: impl Into<String>, datatype: Option<String>, lang: Option<String>) -> Self {
        Self { kind: RawKind::Literal, value: value.into(), datatype, lang }
    }
}

impl SparqlResults {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SpogError::Decode(format!("invalid SPARQL JSON results: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn rows(&self) -> &[HashMap<String, RawTerm>] {
        self.results.as_ref().map(|r| r.bindings.as_slice()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

/// Decoded RDF term
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Iri {
        iri: String,
        storid: Storid,
    },
    Blank {
        label: String,
        /// Negative storid, when the store reported an internal id
        storid: Option<Storid>,
    },
    Literal {
        value: String,
        /// Datatype IRI or `@tag`
        datatype_iri: String,
        datatype: Datatype,
    },
}

impl Term {
    pub fn storid(&self) -> Option<Storid> {
        match self {
            Term::Iri { storid, .. } => Some(*storid),
            Term::Blank { storid, .. } => *storid,
            Term::Literal { .. } => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }
}

/// One decoded solution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: HashMap<String, Term>,
}

impl Row {
    pub fn get(&self, var: &str) -> Option<&Term> {
        self.cells.get(var)
    }

    pub fn storid(&self, var: &str) -> Option<Storid> {
        self.get(var).and_then(Term::storid)
    }

    pub fn iri(&self, var: &str) -> Option<&str> {
        match self.get(var) {
            Some(Term::Iri { iri, .. }) => Some(iri),
            _ => None,
        }
    }

    /// Object column: entity id, or literal value with its datatype marker
    pub fn object(&self, var: &str) -> Option<Object> {
        match self.get(var)? {
            Term::Literal { value, datatype, .. } => Some(Object::Literal {
                value: value.clone(),
                datatype: datatype.clone(),
            }),
            term => term.storid().map(Object::Id),
        }
    }

    /// Literal column decoded to its richest native value
    pub fn literal(&self, var: &str) -> Result<Option<LiteralValue>> {
        match self.get(var) {
            Some(Term::Literal { value, datatype_iri, .. }) => {
                deserialize(value, NodeKind::Literal, Some(datatype_iri)).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn integer(&self, var: &str) -> Option<i64> {
        match self.get(var) {
            Some(Term::Literal { value, .. }) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn vars(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn blank_storid(binding: &HashMap<String, RawTerm>, var: &str) -> Result<Option<Storid>> {
    let Some(id) = binding.get(&format!("{}id", var)) else {
        return Ok(None);
    };
    let internal: i64 = id
        .value
        .trim()
        .parse()
        .map_err(|_| SpogError::Decode(format!("non-numeric internal id '{}' for ?{}", id.value, var)))?;
    match internal.checked_abs() {
        Some(0) => Err(SpogError::Decode(format!("internal id 0 for ?{} would map to the reserved storid", var))),
        Some(magnitude) => Ok(Some(-magnitude)),
        None => Err(SpogError::Decode(format!("internal id {} for ?{} is out of range", internal, var))),
    }
}

/// Decode one binding, abbreviating IRIs and datatype IRIs through `abbreviate`
pub fn decode_row(binding: &HashMap<String, RawTerm>, abbreviate: &dyn Fn(&str) -> Storid) -> Result<Row> {
    let mut cells = HashMap::with_capacity(binding.len());
    for (var, raw) in binding {
        let term = match raw.kind {
            RawKind::Uri => Term::Iri {
                iri: raw.value.clone(),
                storid: abbreviate(&raw.value),
            },
            RawKind::Bnode => Term::Blank {
                label: raw.value.clone(),
                storid: blank_storid(binding, var)?,
            },
            RawKind::Literal | RawKind::TypedLiteral => match (&raw.lang, &raw.datatype) {
                (Some(lang), _) if !lang.is_empty() => Term::Literal {
                    value: raw.value.clone(),
                    datatype_iri: format!("@{}", lang),
                    datatype: Datatype::Lang(lang.clone()),
                },
                (_, Some(datatype)) => Term::Literal {
                    value: raw.value.clone(),
                    datatype_iri: datatype.clone(),
                    datatype: Datatype::Id(abbreviate(datatype)),
                },
                _ => Term::Literal {
                    value: raw.value.clone(),
                    datatype_iri: XSD_STRING.to_string(),
                    datatype: Datatype::Id(abbreviate(XSD_STRING)),
                },
            },
        };
        cells.insert(var.clone(), term);
    }
    Ok(Row { cells })
}

/// Decode every binding of a result set
pub fn decode(results: &SparqlResults, abbreviate: &dyn Fn(&str) -> Storid) -> Result<Vec<Row>> {
    results.rows().iter().map(|binding| decode_row(binding, abbreviate)).collect()
}
