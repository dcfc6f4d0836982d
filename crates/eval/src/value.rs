//! Typed runtime values and item-value parsing.
//!
//! Each `FieldKind` implies one runtime value type; `parse_field_value`
//! is the bridge from an opaque JSON item value to that type. Parsing
//! is lenient about representation where data sets genuinely vary --
//! numbers may arrive as numeric strings, datetimes as RFC 3339
//! strings or Unix-second numbers, dictionary values as any scalar --
//! but a value that cannot be read as the declared type at all is a
//! `ValueType` error, not a silent non-match.

use std::collections::BTreeMap;

use sift_core::{parse_number, FieldKind, FieldSpec};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::EvalError;

/// A field value in the shape the field's kind implies.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    /// Unix seconds.
    Datetime(f64),
    /// An enum alternative key.
    Choice(String),
    List(Vec<FieldValue>),
    Dictionary(BTreeMap<String, String>),
    /// Nested record values stay raw; they are parsed against the
    /// nested field specifications during matching.
    Record(BTreeMap<String, serde_json::Value>),
}

impl FieldValue {
    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "number",
            FieldValue::Datetime(_) => "datetime",
            FieldValue::Choice(_) => "enum",
            FieldValue::List(_) => "array",
            FieldValue::Dictionary(_) => "dictionary",
            FieldValue::Record(_) => "record",
        }
    }
}

/// Parse an opaque item value as the type `spec`'s kind implies.
pub fn parse_field_value(
    raw: &serde_json::Value,
    spec: &FieldSpec,
) -> Result<FieldValue, EvalError> {
    match &spec.kind {
        FieldKind::Text => match raw.as_str() {
            Some(s) => Ok(FieldValue::Text(s.to_string())),
            None => Err(value_type("text", raw)),
        },
        FieldKind::Number => {
            if let Some(n) = raw.as_f64() {
                return Ok(FieldValue::Number(n));
            }
            // Numeric strings are common in loosely typed data sets.
            raw.as_str()
                .and_then(parse_number)
                .map(FieldValue::Number)
                .ok_or_else(|| value_type("number", raw))
        }
        FieldKind::Datetime => {
            if let Some(n) = raw.as_f64() {
                return Ok(FieldValue::Datetime(n));
            }
            match raw.as_str() {
                Some(s) => OffsetDateTime::parse(s, &Rfc3339)
                    .map(|dt| FieldValue::Datetime(dt.unix_timestamp() as f64))
                    .map_err(|_| value_type("datetime", raw)),
                None => Err(value_type("datetime", raw)),
            }
        }
        FieldKind::Enum { .. } => match raw.as_str() {
            Some(s) => Ok(FieldValue::Choice(s.to_string())),
            None => Err(value_type("enum", raw)),
        },
        FieldKind::Array { element } => {
            let arr = raw.as_array().ok_or_else(|| value_type("array", raw))?;
            let elements: Result<Vec<FieldValue>, EvalError> = arr
                .iter()
                .map(|item| parse_field_value(item, element))
                .collect();
            Ok(FieldValue::List(elements?))
        }
        FieldKind::Dictionary { .. } => {
            let obj = raw
                .as_object()
                .ok_or_else(|| value_type("dictionary", raw))?;
            let mut entries = BTreeMap::new();
            for (k, v) in obj {
                let flat = scalar_text(v).ok_or_else(|| value_type("dictionary", v))?;
                entries.insert(k.clone(), flat);
            }
            Ok(FieldValue::Dictionary(entries))
        }
        FieldKind::Record { .. } => {
            let obj = raw.as_object().ok_or_else(|| value_type("record", raw))?;
            Ok(FieldValue::Record(
                obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            ))
        }
    }
}

/// Flatten a scalar JSON value to its text form.
pub(crate) fn scalar_text(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_type(expected: &'static str, raw: &serde_json::Value) -> EvalError {
    EvalError::ValueType {
        expected,
        got: json_type_name(raw).to_string(),
    }
}

pub(crate) fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sift_core::Operator;

    fn spec(kind: FieldKind) -> FieldSpec {
        FieldSpec::new("Test", vec![Operator::Eq], kind)
    }

    #[test]
    fn number_accepts_numeric_strings() {
        let s = spec(FieldKind::Number);
        assert_eq!(
            parse_field_value(&json!("1,200.5"), &s).unwrap(),
            FieldValue::Number(1200.5)
        );
        assert_eq!(
            parse_field_value(&json!(7), &s).unwrap(),
            FieldValue::Number(7.0)
        );
    }

    #[test]
    fn number_rejects_non_numeric() {
        let s = spec(FieldKind::Number);
        let err = parse_field_value(&json!("seven"), &s).unwrap_err();
        assert_eq!(
            err,
            EvalError::ValueType {
                expected: "number",
                got: "string".to_string()
            }
        );
        assert!(parse_field_value(&json!(true), &s).is_err());
    }

    #[test]
    fn datetime_accepts_rfc3339_and_unix_seconds() {
        let s = spec(FieldKind::Datetime);
        assert_eq!(
            parse_field_value(&json!("1970-01-01T00:10:00Z"), &s).unwrap(),
            FieldValue::Datetime(600.0)
        );
        assert_eq!(
            parse_field_value(&json!(600), &s).unwrap(),
            FieldValue::Datetime(600.0)
        );
        assert!(parse_field_value(&json!("next tuesday"), &s).is_err());
    }

    #[test]
    fn array_parses_elements_with_element_spec() {
        let s = spec(FieldKind::Array {
            element: Box::new(spec(FieldKind::Number)),
        });
        assert_eq!(
            parse_field_value(&json!([1, "2"]), &s).unwrap(),
            FieldValue::List(vec![FieldValue::Number(1.0), FieldValue::Number(2.0)])
        );
        assert!(parse_field_value(&json!([1, "x"]), &s).is_err());
    }

    #[test]
    fn dictionary_flattens_scalars() {
        let s = spec(FieldKind::Dictionary {
            suggested_keys: vec![],
        });
        let parsed = parse_field_value(&json!({"env": "prod", "port": 8080}), &s).unwrap();
        assert_eq!(
            parsed,
            FieldValue::Dictionary(
                [
                    ("env".to_string(), "prod".to_string()),
                    ("port".to_string(), "8080".to_string()),
                ]
                .into_iter()
                .collect()
            )
        );
        assert!(parse_field_value(&json!({"nested": {"x": 1}}), &s).is_err());
    }

    #[test]
    fn record_keeps_values_raw() {
        let s = spec(FieldKind::Record {
            fields: sift_core::Fields::new(),
        });
        let parsed = parse_field_value(&json!({"host": "a", "port": 80}), &s).unwrap();
        match parsed {
            FieldValue::Record(map) => assert_eq!(map.len(), 2),
            other => panic!("expected record, got {:?}", other),
        }
    }
}
