//! Literal Codec Contract Tests
//!
//! Values written by this crate are read back by other clients of the same
//! repository, and vice versa. The token forms below are that agreement.

use chrono::{DateTime, NaiveDate, NaiveTime};
use spog_core::literal::{deserialize, escape_string, inferred_datatype, is_valid_language_tag, serialize, NodeKind};
use spog_core::vocab::{XSD_BOOLEAN, XSD_DATE, XSD_DATETIME, XSD_DOUBLE, XSD_INTEGER, XSD_STRING, XSD_TIME};
use spog_core::{LiteralValue, SpogError};

fn round_trip(value: LiteralValue, datatype: &str) -> LiteralValue {
    let token = serialize(&value, Some(datatype)).unwrap();
    // strip the token back to its lexical form the way a result binding reports it
    let lexical = if let Some(rest) = token.strip_prefix('"') {
        rest.split('"').next().unwrap_or_default().to_string()
    } else {
        token
    };
    deserialize(&lexical, NodeKind::Literal, Some(datatype)).unwrap()
}

/// WHY: The canonical scenario from the data model
/// BREAKS: Every ontology using integer or language-tagged annotations
#[test]
fn integer_and_language_tokens() {
    assert_eq!(serialize(&LiteralValue::Integer(42), Some(XSD_INTEGER)).unwrap(), "42");
    assert_eq!(serialize(&LiteralValue::from("hi"), Some("@en")).unwrap(), "\"hi\"@en");
    // an illegal tag is dropped, the value kept
    assert_eq!(serialize(&LiteralValue::from("hi"), Some("@e_n")).unwrap(), "\"hi\"");
    assert!(is_valid_language_tag("en-GB"));
    assert!(!is_valid_language_tag("e_n"));
}

/// WHY: Each datatype family survives serialize -> result text -> deserialize
#[test]
fn families_round_trip() {
    assert_eq!(round_trip(LiteralValue::Integer(-7), XSD_INTEGER), LiteralValue::Integer(-7));
    assert_eq!(round_trip(LiteralValue::Float(2.5), XSD_DOUBLE), LiteralValue::Float(2.5));
    assert_eq!(round_trip(LiteralValue::Boolean(true), XSD_BOOLEAN), LiteralValue::Boolean(true));
    assert_eq!(round_trip(LiteralValue::from("plain"), XSD_STRING), LiteralValue::from("plain"));

    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(round_trip(LiteralValue::Date(date), XSD_DATE), LiteralValue::Date(date));
    let time = NaiveTime::from_hms_opt(13, 5, 9).unwrap();
    assert_eq!(round_trip(LiteralValue::Time(time), XSD_TIME), LiteralValue::Time(time));

    let datetime = date.and_hms_opt(10, 30, 0).unwrap();
    assert_eq!(round_trip(LiteralValue::DateTime(datetime), XSD_DATETIME), LiteralValue::DateTime(datetime));
    let zoned = DateTime::parse_from_rfc3339("2024-02-29T10:30:00+02:00").unwrap();
    assert_eq!(
        round_trip(LiteralValue::DateTimeOffset(zoned), XSD_DATETIME),
        LiteralValue::DateTimeOffset(zoned)
    );

    let big = LiteralValue::BigInteger("123456789012345678901234567890".to_string());
    assert_eq!(round_trip(big.clone(), XSD_INTEGER), big);

    let french = LiteralValue::LangString("bonjour".to_string(), "fr".to_string());
    assert_eq!(round_trip(french.clone(), "@fr"), french);
}

/// WHY: A float stored as an integer keeps its exact integer value
/// BREAKS: Large measurements silently clamped to the i64 range
#[test]
fn large_float_as_integer_is_exact() {
    assert_eq!(
        serialize(&LiteralValue::Float(1e30), Some(XSD_INTEGER)).unwrap(),
        "1000000000000000019884624838656"
    );
    assert_eq!(
        round_trip(LiteralValue::Float(1e30), XSD_INTEGER),
        LiteralValue::BigInteger("1000000000000000019884624838656".to_string())
    );
    assert!(matches!(
        serialize(&LiteralValue::Float(f64::INFINITY), Some(XSD_INTEGER)),
        Err(SpogError::UnknownType(_))
    ));
}

/// WHY: xsd:decimal has no exponent form and no special values
#[test]
fn decimals_are_positional() {
    let decimal = "http://www.w3.org/2001/XMLSchema#decimal";
    assert_eq!(serialize(&LiteralValue::Float(1e21), Some(decimal)).unwrap(), "1000000000000000000000.0");
    assert!(matches!(serialize(&LiteralValue::Float(f64::NAN), Some(decimal)), Err(SpogError::UnknownType(_))));
}

/// WHY: Only an explicit true is stored as true for boolean properties
#[test]
fn boolean_is_asymmetric() {
    assert_eq!(serialize(&LiteralValue::Boolean(true), Some(XSD_BOOLEAN)).unwrap(), "true");
    assert_eq!(serialize(&LiteralValue::from("yes"), Some(XSD_BOOLEAN)).unwrap(), "false");
    assert_eq!(serialize(&LiteralValue::Integer(1), Some(XSD_BOOLEAN)).unwrap(), "false");
}

/// WHY: Without a datatype the value's own kind decides the token
#[test]
fn inferred_tokens() {
    assert_eq!(serialize(&LiteralValue::from("a\"b"), None).unwrap(), "\"a\\\"b\"");
    assert_eq!(serialize(&LiteralValue::Integer(3), None).unwrap(), "3");
    assert_eq!(serialize(&LiteralValue::Boolean(false), None).unwrap(), "false");
    assert_eq!(inferred_datatype(&LiteralValue::Float(1.0)), XSD_DOUBLE);
    assert_eq!(inferred_datatype(&LiteralValue::LangString("x".into(), "de".into())), "@de");
}

/// WHY: Values that cannot be expressed in the requested datatype fail loudly
#[test]
fn unencodable_values_fail() {
    let date = LiteralValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert!(matches!(serialize(&date, Some(XSD_INTEGER)), Err(SpogError::UnknownType(_))));
    assert!(matches!(serialize(&LiteralValue::from("abc"), Some(XSD_DOUBLE)), Err(SpogError::UnknownType(_))));
}

/// WHY: Unparseable lexical forms degrade to strings instead of failing a read
#[test]
fn lenient_decoding() {
    assert_eq!(
        deserialize("not-a-number", NodeKind::Literal, Some(XSD_INTEGER)).unwrap(),
        LiteralValue::from("not-a-number")
    );
    assert_eq!(
        deserialize("x", NodeKind::Literal, Some("http://ex.org/custom")).unwrap(),
        LiteralValue::from("x")
    );
    assert!(deserialize("http://ex.org/A", NodeKind::Uri, None).is_err());
}

#[test]
fn escaping_covers_control_characters() {
    assert_eq!(escape_string("line\nbreak\ttab\\"), "\"line\\nbreak\\ttab\\\\\"");
}
