//! Per-term matching: does one field value satisfy one operation?
//!
//! Dispatch is exhaustive over the field's kind and the operation
//! shape. An operator foreign to the kind is an `UnknownOperator`
//! error, never a silent non-match -- by the time an operation reaches
//! the evaluator it is assumed well formed, and a foreign operator
//! means the codec and the evaluator disagree about the field.

use sift_core::{FieldKind, FieldSpec, Operand, QueryOperation, SetOperand};

use crate::error::EvalError;
use crate::value::{parse_field_value, scalar_text, FieldValue};

/// Match a raw item value against one operation, interpreting the
/// value per the field's kind.
pub fn matches_field_query(
    spec: &FieldSpec,
    raw: &serde_json::Value,
    operation: &QueryOperation,
) -> Result<bool, EvalError> {
    let value = parse_field_value(raw, spec)?;
    matches_value(spec, &value, operation)
}

fn matches_value(
    spec: &FieldSpec,
    value: &FieldValue,
    operation: &QueryOperation,
) -> Result<bool, EvalError> {
    match &spec.kind {
        FieldKind::Number => {
            let FieldValue::Number(n) = value else {
                unreachable!("parse_field_value pins number fields to number values");
            };
            numeric_matches(*n, operation, "number", false)
        }
        FieldKind::Datetime => {
            let FieldValue::Datetime(t) = value else {
                unreachable!("parse_field_value pins datetime fields to datetime values");
            };
            numeric_matches(*t, operation, "datetime", true)
        }
        FieldKind::Text => {
            let FieldValue::Text(s) = value else {
                unreachable!("parse_field_value pins text fields to text values");
            };
            match operation {
                QueryOperation::Text { search } => {
                    let haystack = s.trim().to_lowercase();
                    let needle = search.trim().to_lowercase();
                    Ok(haystack.contains(&needle))
                }
                other => Err(EvalError::unknown_operator("text", other)),
            }
        }
        FieldKind::Enum { .. } => {
            let FieldValue::Choice(choice) = value else {
                unreachable!("parse_field_value pins enum fields to choice values");
            };
            match operation {
                QueryOperation::In(values) => Ok(values.iter().any(|v| v == choice)),
                QueryOperation::Nin(values) => Ok(!values.iter().any(|v| v == choice)),
                QueryOperation::Eq(Operand::Text(operand)) => Ok(choice.contains(operand)),
                QueryOperation::Ne(Operand::Text(operand)) => Ok(!choice.contains(operand)),
                other => Err(EvalError::unknown_operator("enum", other)),
            }
        }
        FieldKind::Array { element } => {
            let FieldValue::List(elements) = value else {
                unreachable!("parse_field_value pins array fields to list values");
            };
            array_matches(element, elements, operation)
        }
        FieldKind::Dictionary { .. } => {
            let FieldValue::Dictionary(entries) = value else {
                unreachable!("parse_field_value pins dictionary fields to dictionary values");
            };
            dictionary_matches(entries, operation)
        }
        FieldKind::Record { fields } => {
            let FieldValue::Record(record) = value else {
                unreachable!("parse_field_value pins record fields to record values");
            };
            record_matches(fields, record, operation)
        }
    }
}

fn numeric_matches(
    value: f64,
    operation: &QueryOperation,
    field_type: &'static str,
    allow_range: bool,
) -> Result<bool, EvalError> {
    Ok(match operation {
        QueryOperation::Eq(Operand::Number(n)) => value == *n,
        QueryOperation::Ne(Operand::Number(n)) => value != *n,
        QueryOperation::Gt(n) => value > *n,
        QueryOperation::Gte(n) => value >= *n,
        QueryOperation::Lt(n) => value < *n,
        QueryOperation::Lte(n) => value <= *n,
        // Closed interval: both endpoints inclusive.
        QueryOperation::Range(start, end) if allow_range => *start <= value && value <= *end,
        other => return Err(EvalError::unknown_operator(field_type, other)),
    })
}

fn array_matches(
    element: &FieldSpec,
    elements: &[FieldValue],
    operation: &QueryOperation,
) -> Result<bool, EvalError> {
    match operation {
        QueryOperation::Eq(operand) => {
            Ok(elements.iter().all(|e| operand_contains(operand, e)))
        }
        QueryOperation::Ne(operand) => {
            Ok(elements.iter().all(|e| !operand_contains(operand, e)))
        }
        QueryOperation::All(set) => {
            for e in elements {
                if !set_element_matches(element, e, set, "array")? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        QueryOperation::Any(set) => {
            for e in elements {
                if set_element_matches(element, e, set, "array")? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Err(EvalError::unknown_operator("array", other)),
    }
}

/// Membership test for array equality: the operand may be the usual
/// value list, or a bare string checked by containment (the shape the
/// encoder's historical default arm emits for raw text input).
fn operand_contains(operand: &Operand, element: &FieldValue) -> bool {
    match operand {
        Operand::List(values) => {
            let text = element_text(element);
            values.iter().any(|v| *v == text)
        }
        Operand::Text(s) => s.contains(&element_text(element)),
        Operand::Number(n) => matches!(element, FieldValue::Number(m) if m == n),
    }
}

fn element_text(element: &FieldValue) -> String {
    match element {
        FieldValue::Choice(s) | FieldValue::Text(s) => s.clone(),
        FieldValue::Number(n) | FieldValue::Datetime(n) => {
            if n.fract() == 0.0 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        _ => String::new(),
    }
}

/// Apply a combinator payload to one element, AND-ing or OR-ing the
/// sub-operations as the payload instructs.
fn set_element_matches(
    spec: &FieldSpec,
    value: &FieldValue,
    set: &SetOperand,
    field_type: &'static str,
) -> Result<bool, EvalError> {
    match set {
        SetOperand::And(terms) => {
            for term in terms {
                if !matches_value(spec, value, term)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        SetOperand::Or(terms) => {
            for term in terms {
                if matches_value(spec, value, term)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        SetOperand::Single(term) => matches_value(spec, value, term),
        SetOperand::Entries(_) => Err(EvalError::UnknownOperator {
            field_type,
            operator: "flat entries".to_string(),
        }),
    }
}

fn dictionary_matches(
    entries: &std::collections::BTreeMap<String, String>,
    operation: &QueryOperation,
) -> Result<bool, EvalError> {
    match operation {
        QueryOperation::All(SetOperand::Entries(operand_entries)) => {
            // The dictionary flattens to "key:value" lines; each operand
            // entry must appear in it, keyed when a key was given.
            let flat = entries
                .iter()
                .map(|(k, v)| format!("{}:{}", k, v))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(operand_entries.iter().all(|(k, v)| {
                let needle = if k.is_empty() {
                    v.clone()
                } else {
                    format!("{}:{}", k, v)
                };
                flat.contains(&needle)
            }))
        }
        other => Err(EvalError::unknown_operator("dictionary", other)),
    }
}

fn record_matches(
    fields: &sift_core::Fields,
    record: &std::collections::BTreeMap<String, serde_json::Value>,
    operation: &QueryOperation,
) -> Result<bool, EvalError> {
    match operation {
        // Flat entry payloads name a sub-field directly: every/any
        // record value must carry that sub-field with the given text.
        QueryOperation::All(SetOperand::Entries(entries)) => {
            Ok(record.values().all(|v| entries_match(v, entries)))
        }
        QueryOperation::Any(SetOperand::Entries(entries)) => {
            Ok(record.values().any(|v| entries_match(v, entries)))
        }
        QueryOperation::All(set) => {
            for (name, raw) in record {
                let Some(spec) = fields.get(name) else {
                    continue;
                };
                let value = parse_field_value(raw, spec)?;
                if !set_element_matches(spec, &value, set, "record")? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        QueryOperation::Any(set) => {
            for (name, raw) in record {
                let Some(spec) = fields.get(name) else {
                    continue;
                };
                let value = parse_field_value(raw, spec)?;
                if set_element_matches(spec, &value, set, "record")? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Err(EvalError::unknown_operator("record", other)),
    }
}

fn entries_match(
    value: &serde_json::Value,
    entries: &std::collections::BTreeMap<String, String>,
) -> bool {
    entries.iter().all(|(name, expected)| {
        value
            .get(name)
            .and_then(scalar_text)
            .map(|text| text.contains(expected))
            .unwrap_or(false)
    })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
