/**
 * codec.rs
 * Literal codec: native values <-> SPARQL literal tokens
 *
 * Every piece of literal text that reaches a query goes through `escape_string`,
 * and every IRI placed in `<...>` goes through `iri_ref`.
 */

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::value::{float_lexical, LiteralValue, DATETIME_FORMAT, DATE_FORMAT, TIME_FORMAT};
use crate::errors::{Result, SpogError};
use crate::vocab::{OWL_REAL, XSD, XSD_BOOLEAN, XSD_DATE, XSD_DATETIME, XSD_DOUBLE, XSD_INTEGER, XSD_STRING, XSD_TIME};

const INT_TYPES: &[&str] = &[
    "integer",
    "byte",
    "short",
    "int",
    "long",
    "unsignedByte",
    "unsignedShort",
    "unsignedInt",
    "unsignedLong",
    "negativeInteger",
    "nonNegativeInteger",
    "positiveInteger",
    "nonPositiveInteger",
];

const FLOAT_TYPES: &[&str] = &["decimal", "double", "float"];

static LANGUAGE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]+(-[a-zA-Z0-9]+)*$").unwrap());
static INTEGER_LEXICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").unwrap());
static DECIMAL_LEXICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]*\.[0-9]+$").unwrap());

/// Kind of an RDF term in a result binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Uri,
    BNode,
    Literal,
}

/// Datatype family a datatype IRI (or `@tag` marker) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatatypeFamily {
    Integer,
    Float,
    Boolean,
    String,
    Date,
    Time,
    DateTime,
    Language,
    Other,
}

impl DatatypeFamily {
    pub fn of(datatype: &str) -> Self {
        if datatype.starts_with('@') {
            return DatatypeFamily::Language;
        }
        if datatype == OWL_REAL {
            return DatatypeFamily::Float;
        }
        let Some(local) = datatype.strip_prefix(XSD) else {
            return DatatypeFamily::Other;
        };
        match local {
            "boolean" => DatatypeFamily::Boolean,
            "string" => DatatypeFamily::String,
            "date" => DatatypeFamily::Date,
            "time" => DatatypeFamily::Time,
            "dateTime" => DatatypeFamily::DateTime,
            l if INT_TYPES.contains(&l) => DatatypeFamily::Integer,
            l if FLOAT_TYPES.contains(&l) => DatatypeFamily::Float,
            _ => DatatypeFamily::Other,
        }
    }
}

/// Quote `text` as a SPARQL string literal, escaping quotes, backslashes and
/// control characters
pub fn escape_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{8}' => quoted.push_str("\\b"),
            '\u{c}' => quoted.push_str("\\f"),
            c if c.is_control() => quoted.push_str(&format!("\\u{:04X}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Wrap an IRI in `<...>`, rejecting characters IRIREF does not allow
pub fn iri_ref(iri: &str) -> Result<String> {
    if iri.is_empty() {
        return Err(SpogError::InvalidInput("empty IRI".to_string()));
    }
    if let Some(bad) = iri
        .chars()
        .find(|c| matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\') || (*c as u32) <= 0x20)
    {
        return Err(SpogError::InvalidInput(format!("character {:?} not allowed in IRI '{}'", bad, iri)));
    }
    Ok(format!("<{}>", iri))
}

pub fn is_valid_language_tag(tag: &str) -> bool {
    LANGUAGE_TAG.is_match(tag)
}

fn typed(lexical: &str, datatype: &str) -> Result<String> {
    Ok(format!("{}^^{}", escape_string(lexical), iri_ref(datatype)?))
}

/// Double token that SPARQL reads back as xsd:double
fn double_token(value: f64) -> Result<String> {
    if !value.is_finite() {
        return typed(&float_lexical(value), XSD_DOUBLE);
    }
    let token = format!("{:?}", value);
    if token.contains('e') || token.contains('E') {
        Ok(token)
    } else {
        Ok(format!("{}e0", token))
    }
}

fn lang_string(text: &str, tag: &str) -> String {
    if is_valid_language_tag(tag) {
        format!("{}@{}", escape_string(text), tag)
    } else {
        warn!(tag = tag, "illegal language tag, storing value as a plain string");
        escape_string(text)
    }
}

/// Serialize `value` to a literal token, using `datatype` (an IRI or `@tag`)
/// when given and the value's own variant otherwise
pub fn serialize(value: &LiteralValue, datatype: Option<&str>) -> Result<String> {
    match datatype {
        None => serialize_inferred(value),
        Some(datatype) => serialize_with_datatype(value, datatype),
    }
}

fn serialize_inferred(value: &LiteralValue) -> Result<String> {
    match value {
        LiteralValue::String(text) => Ok(escape_string(text)),
        LiteralValue::Integer(number) => Ok(number.to_string()),
        LiteralValue::BigInteger(text) => Ok(text.clone()),
        LiteralValue::Float(number) => double_token(*number),
        LiteralValue::Boolean(flag) => Ok(flag.to_string()),
        LiteralValue::Date(_) => typed(&value.lexical_form(), XSD_DATE),
        LiteralValue::Time(_) => typed(&value.lexical_form(), XSD_TIME),
        LiteralValue::DateTime(_) | LiteralValue::DateTimeOffset(_) => typed(&value.lexical_form(), XSD_DATETIME),
        LiteralValue::LangString(text, tag) => Ok(lang_string(text, tag)),
        LiteralValue::Typed(text, datatype) => typed(text, datatype),
    }
}

fn serialize_with_datatype(value: &LiteralValue, datatype: &str) -> Result<String> {
    match DatatypeFamily::of(datatype) {
        DatatypeFamily::Language => Ok(lang_string(&value.lexical_form(), &datatype[1..])),
        DatatypeFamily::Date | DatatypeFamily::Time | DatatypeFamily::DateTime => typed(&value.lexical_form(), datatype),
        DatatypeFamily::Integer => {
            let lexical = integer_lexical(value, datatype)?;
            if datatype == XSD_INTEGER {
                Ok(lexical)
            } else {
                typed(&lexical, datatype)
            }
        }
        DatatypeFamily::Float => {
            let number = float_value(value, datatype)?;
            if !datatype.ends_with("#decimal") {
                return typed(&float_lexical(number), datatype);
            }
            let lexical = decimal_lexical(number, datatype)?;
            if DECIMAL_LEXICAL.is_match(&lexical) {
                Ok(lexical)
            } else {
                typed(&lexical, datatype)
            }
        }
        DatatypeFamily::Boolean => {
            // Only an explicit true survives; every other value becomes false.
            let flag = match value {
                LiteralValue::Boolean(flag) => *flag,
                LiteralValue::String(text) => text == "true",
                _ => false,
            };
            Ok(flag.to_string())
        }
        DatatypeFamily::String => Ok(escape_string(&value.lexical_form())),
        DatatypeFamily::Other => typed(&value.lexical_form(), datatype),
    }
}

fn integer_lexical(value: &LiteralValue, datatype: &str) -> Result<String> {
    match value {
        LiteralValue::Integer(number) => Ok(number.to_string()),
        LiteralValue::BigInteger(text) => Ok(text.clone()),
        LiteralValue::Boolean(flag) => Ok(if *flag { "1" } else { "0" }.to_string()),
        LiteralValue::Float(number) if number.is_finite() => Ok(truncated_integer(*number)),
        LiteralValue::String(text) if INTEGER_LEXICAL.is_match(text.trim()) => {
            let text = text.trim();
            Ok(text.parse::<i64>().map(|n| n.to_string()).unwrap_or_else(|_| text.to_string()))
        }
        other => Err(SpogError::UnknownType(format!(
            "cannot encode {:?} as integer datatype {}",
            other, datatype
        ))),
    }
}

/// Integer digits of a finite float, exact even outside the i64 range
fn truncated_integer(number: f64) -> String {
    let number = number.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if number >= i64::MIN as f64 && number < i64::MAX as f64 {
        (number as i64).to_string()
    } else {
        format!("{:.0}", number)
    }
}

/// Positional xsd:decimal form; decimals have no exponent and no special values
fn decimal_lexical(number: f64, datatype: &str) -> Result<String> {
    if !number.is_finite() {
        return Err(SpogError::UnknownType(format!(
            "cannot encode {} as decimal datatype {}",
            float_lexical(number),
            datatype
        )));
    }
    let lexical = format!("{}", number);
    if lexical.contains('.') {
        Ok(lexical)
    } else {
        Ok(format!("{}.0", lexical))
    }
}

fn float_value(value: &LiteralValue, datatype: &str) -> Result<f64> {
    let parsed = match value {
        LiteralValue::Float(number) => Some(*number),
        LiteralValue::Integer(number) => Some(*number as f64),
        LiteralValue::BigInteger(text) | LiteralValue::String(text) => parse_xsd_float(text.trim()),
        _ => None,
    };
    parsed.ok_or_else(|| SpogError::UnknownType(format!("cannot encode {:?} as float datatype {}", value, datatype)))
}

fn parse_xsd_float(text: &str) -> Option<f64> {
    match text {
        "INF" | "+INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => text.parse::<f64>().ok(),
    }
}

/// Decode a result binding's value text into the richest native value.
///
/// Unknown datatypes and unparseable lexical forms degrade to `String`.
pub fn deserialize(text: &str, kind: NodeKind, datatype: Option<&str>) -> Result<LiteralValue> {
    if kind != NodeKind::Literal {
        return Err(SpogError::InvalidInput(format!("cannot decode a {:?} term as a literal", kind)));
    }
    let Some(datatype) = datatype else {
        return Ok(LiteralValue::String(text.to_string()));
    };

    let decoded = match DatatypeFamily::of(datatype) {
        DatatypeFamily::Language => Some(LiteralValue::LangString(text.to_string(), datatype[1..].to_string())),
        DatatypeFamily::Date => NaiveDate::parse_from_str(text, DATE_FORMAT).ok().map(LiteralValue::Date),
        DatatypeFamily::Time => NaiveTime::parse_from_str(text, TIME_FORMAT).ok().map(LiteralValue::Time),
        DatatypeFamily::DateTime => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(LiteralValue::DateTimeOffset)
            .or_else(|| NaiveDateTime::parse_from_str(text, DATETIME_FORMAT).ok().map(LiteralValue::DateTime)),
        DatatypeFamily::Integer => match text.trim().parse::<i64>() {
            Ok(number) => Some(LiteralValue::Integer(number)),
            Err(_) if INTEGER_LEXICAL.is_match(text.trim()) => Some(LiteralValue::BigInteger(text.trim().to_string())),
            Err(_) => None,
        },
        DatatypeFamily::Float => parse_xsd_float(text.trim()).map(LiteralValue::Float),
        DatatypeFamily::Boolean => Some(LiteralValue::Boolean(text == "true" || text == "1")),
        DatatypeFamily::String | DatatypeFamily::Other => Some(LiteralValue::String(text.to_string())),
    };

    Ok(decoded.unwrap_or_else(|| {
        debug!(value = text, datatype = datatype, "unparseable lexical form, keeping raw string");
        LiteralValue::String(text.to_string())
    }))
}

/// Datatype IRI a value would be stored with when serialized without one
pub fn inferred_datatype(value: &LiteralValue) -> String {
    match value {
        LiteralValue::String(_) => XSD_STRING.to_string(),
        LiteralValue::Integer(_) | LiteralValue::BigInteger(_) => XSD_INTEGER.to_string(),
        LiteralValue::Float(_) => XSD_DOUBLE.to_string(),
        LiteralValue::Boolean(_) => XSD_BOOLEAN.to_string(),
        LiteralValue::Date(_) => XSD_DATE.to_string(),
        LiteralValue::Time(_) => XSD_TIME.to_string(),
        LiteralValue::DateTime(_) | LiteralValue::DateTimeOffset(_) => XSD_DATETIME.to_string(),
        LiteralValue::LangString(_, tag) => format!("@{}", tag),
        LiteralValue::Typed(_, datatype) => datatype.clone(),
    }
}
