//! Native literal values
//!
//! The richest Rust-side shape a store literal can decode into. `lexical_form`
//! gives the text a result binding would carry for the value.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Integer(i64),
    /// Integer outside the i64 range, kept as canonical decimal text
    BigInteger(String),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    /// Text plus language tag (without `@`)
    LangString(String, String),
    /// Text plus an arbitrary datatype IRI
    Typed(String, String),
}

pub(crate) const TIME_FORMAT: &str = "%H:%M:%S%.f";
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

impl LiteralValue {
    /// Value text as it appears in a result binding
    pub fn lexical_form(&self) -> String {
        match self {
            LiteralValue::String(text) => text.clone(),
            LiteralValue::Integer(value) => value.to_string(),
            LiteralValue::BigInteger(text) => text.clone(),
            LiteralValue::Float(value) => float_lexical(*value),
            LiteralValue::Boolean(value) => value.to_string(),
            LiteralValue::Date(date) => date.format(DATE_FORMAT).to_string(),
            LiteralValue::Time(time) => time.format(TIME_FORMAT).to_string(),
            LiteralValue::DateTime(datetime) => datetime.format(DATETIME_FORMAT).to_string(),
            LiteralValue::DateTimeOffset(datetime) => datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            LiteralValue::LangString(text, _) => text.clone(),
            LiteralValue::Typed(text, _) => text.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(text) | LiteralValue::LangString(text, _) | LiteralValue::Typed(text, _) => Some(text),
            _ => None,
        }
    }
}

/// XSD lexical form of a double (`INF`, `-INF`, `NaN` for non-finite values)
pub(crate) fn float_lexical(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "INF".to_string() } else { "-INF".to_string() }
    } else {
        format!("{:?}", value)
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::LangString(text, tag) => write!(f, "{}@{}", text, tag),
            other => f.write_str(&other.lexical_form()),
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::String(value.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        LiteralValue::String(value)
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        LiteralValue::Integer(value)
    }
}

impl From<i32> for LiteralValue {
    fn from(value: i32) -> Self {
        LiteralValue::Integer(value as i64)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        LiteralValue::Float(value)
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        LiteralValue::Boolean(value)
    }
}

impl From<NaiveDate> for LiteralValue {
    fn from(value: NaiveDate) -> Self {
        LiteralValue::Date(value)
    }
}

impl From<NaiveTime> for LiteralValue {
    fn from(value: NaiveTime) -> Self {
        LiteralValue::Time(value)
    }
}

impl From<NaiveDateTime> for LiteralValue {
    fn from(value: NaiveDateTime) -> Self {
        LiteralValue::DateTime(value)
    }
}

impl From<DateTime<FixedOffset>> for LiteralValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        LiteralValue::DateTimeOffset(value)
    }
}
