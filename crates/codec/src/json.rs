//! Wire interchange for queries.
//!
//! Operations serialize as single-key objects tagged by operator
//! symbol: `{"$eq": "x"}`, `{"$range": [t0, t1]}`, `{"$text":
//! {"$search": "foo"}}`, `{"$all": {"$and": [...]}}`. A field query is
//! `{"fieldName": "severity" | null, "operation": {...}}` and a filter
//! query is an array of field queries. Parsing is strict: unknown
//! operator symbols, wrong operand shapes, and mixed combinator
//! payloads are rejected with a message naming the offense.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use sift_core::{FieldQuery, FilterQuery, Operand, Operator, QueryOperation, SetOperand};

use crate::error::CodecError;

/// Serialize an operation to its wire form.
pub fn operation_to_json(operation: &QueryOperation) -> Value {
    match operation {
        QueryOperation::Eq(operand) => json!({ "$eq": operand_to_json(operand) }),
        QueryOperation::Ne(operand) => json!({ "$ne": operand_to_json(operand) }),
        QueryOperation::Gt(n) => json!({ "$gt": n }),
        QueryOperation::Gte(n) => json!({ "$gte": n }),
        QueryOperation::Lt(n) => json!({ "$lt": n }),
        QueryOperation::Lte(n) => json!({ "$lte": n }),
        QueryOperation::Range(start, end) => json!({ "$range": [start, end] }),
        QueryOperation::Text { search } => json!({ "$text": { "$search": search } }),
        QueryOperation::In(values) => json!({ "$in": values }),
        QueryOperation::Nin(values) => json!({ "$nin": values }),
        QueryOperation::All(set) => json!({ "$all": set_to_json(set) }),
        QueryOperation::Any(set) => json!({ "$any": set_to_json(set) }),
    }
}

fn operand_to_json(operand: &Operand) -> Value {
    match operand {
        Operand::Number(n) => json!(n),
        Operand::Text(s) => json!(s),
        Operand::List(values) => json!(values),
    }
}

fn set_to_json(set: &SetOperand) -> Value {
    match set {
        SetOperand::Entries(entries) => json!(entries),
        SetOperand::And(terms) => {
            json!({ "$and": terms.iter().map(operation_to_json).collect::<Vec<_>>() })
        }
        SetOperand::Or(terms) => {
            json!({ "$or": terms.iter().map(operation_to_json).collect::<Vec<_>>() })
        }
        SetOperand::Single(op) => operation_to_json(op),
    }
}

/// Parse an operation from its wire form.
pub fn operation_from_json(v: &Value) -> Result<QueryOperation, CodecError> {
    let obj = v
        .as_object()
        .filter(|o| o.len() == 1)
        .ok_or_else(|| CodecError::shape("operation must be an object with one operator key"))?;
    let (symbol, operand) = obj.iter().next().expect("length checked above");
    let operator: Operator = symbol.parse()?;

    match operator {
        Operator::Eq => Ok(QueryOperation::Eq(operand_from_json(operand)?)),
        Operator::Ne => Ok(QueryOperation::Ne(operand_from_json(operand)?)),
        Operator::Gt => Ok(QueryOperation::Gt(number_from_json(operand, "$gt")?)),
        Operator::Gte => Ok(QueryOperation::Gte(number_from_json(operand, "$gte")?)),
        Operator::Lt => Ok(QueryOperation::Lt(number_from_json(operand, "$lt")?)),
        Operator::Lte => Ok(QueryOperation::Lte(number_from_json(operand, "$lte")?)),
        Operator::Range => {
            let pair = operand.as_array().filter(|a| a.len() == 2).ok_or_else(|| {
                CodecError::shape("$range requires a two-element array")
            })?;
            let start = number_from_json(&pair[0], "$range")?;
            let end = number_from_json(&pair[1], "$range")?;
            Ok(QueryOperation::Range(start, end))
        }
        Operator::Text => {
            let search = operand
                .get("$search")
                .and_then(|s| s.as_str())
                .ok_or_else(|| CodecError::shape("$text requires a '$search' string"))?;
            Ok(QueryOperation::Text {
                search: search.to_string(),
            })
        }
        Operator::In => Ok(QueryOperation::In(string_list_from_json(operand, "$in")?)),
        Operator::Nin => Ok(QueryOperation::Nin(string_list_from_json(operand, "$nin")?)),
        Operator::All => Ok(QueryOperation::All(set_from_json(operand)?)),
        Operator::Any => Ok(QueryOperation::Any(set_from_json(operand)?)),
    }
}

fn operand_from_json(v: &Value) -> Result<Operand, CodecError> {
    if let Some(s) = v.as_str() {
        return Ok(Operand::Text(s.to_string()));
    }
    if let Some(n) = v.as_f64() {
        return Ok(Operand::Number(n));
    }
    if v.is_array() {
        return Ok(Operand::List(string_list_from_json(v, "equality operand")?));
    }
    Err(CodecError::shape(
        "equality operand must be a string, number, or string array",
    ))
}

fn number_from_json(v: &Value, context: &str) -> Result<f64, CodecError> {
    v.as_f64()
        .ok_or_else(|| CodecError::shape(format!("{} requires a numeric operand", context)))
}

fn string_list_from_json(v: &Value, context: &str) -> Result<Vec<String>, CodecError> {
    let arr = v
        .as_array()
        .ok_or_else(|| CodecError::shape(format!("{} requires an array", context)))?;
    arr.iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| CodecError::shape(format!("{} items must be strings", context)))
        })
        .collect()
}

fn set_from_json(v: &Value) -> Result<SetOperand, CodecError> {
    let obj = v
        .as_object()
        .ok_or_else(|| CodecError::shape("combinator payload must be an object"))?;

    let has_operator_keys = obj.keys().any(|k| k.starts_with('$'));
    if !has_operator_keys {
        // Flat key-to-value form (dictionary and record fields).
        let mut entries = BTreeMap::new();
        for (k, value) in obj {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(CodecError::shape(
                        "combinator entries must be scalar values",
                    ));
                }
            };
            entries.insert(k.clone(), value);
        }
        return Ok(SetOperand::Entries(entries));
    }

    if obj.len() != 1 {
        return Err(CodecError::shape(
            "combinator payload must carry exactly one operator key",
        ));
    }
    if let Some(terms) = obj.get("$and") {
        return Ok(SetOperand::And(sub_operations_from_json(terms, "$and")?));
    }
    if let Some(terms) = obj.get("$or") {
        return Ok(SetOperand::Or(sub_operations_from_json(terms, "$or")?));
    }
    // A bare sub-operation: {"$gte": 5}.
    Ok(SetOperand::Single(Box::new(operation_from_json(v)?)))
}

fn sub_operations_from_json(v: &Value, context: &str) -> Result<Vec<QueryOperation>, CodecError> {
    let arr = v
        .as_array()
        .ok_or_else(|| CodecError::shape(format!("{} requires an array", context)))?;
    arr.iter().map(operation_from_json).collect()
}

/// Serialize a field query to `{"fieldName": ..., "operation": ...}`.
pub fn field_query_to_json(field_query: &FieldQuery) -> Value {
    json!({
        "fieldName": field_query.field_name,
        "operation": operation_to_json(&field_query.operation),
    })
}

/// Parse a field query from its wire form. A missing or null
/// `fieldName` is a free-text term.
pub fn field_query_from_json(v: &Value) -> Result<FieldQuery, CodecError> {
    let obj = v
        .as_object()
        .ok_or_else(|| CodecError::shape("field query must be a JSON object"))?;
    let field_name = match obj.get("fieldName") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.clone()),
        Some(_) => return Err(CodecError::shape("'fieldName' must be a string or null")),
    };
    let operation = obj
        .get("operation")
        .ok_or_else(|| CodecError::shape("field query missing 'operation'"))?;
    Ok(FieldQuery {
        field_name,
        operation: operation_from_json(operation)?,
    })
}

/// Serialize a whole filter query to a JSON array.
pub fn filter_query_to_json(query: &FilterQuery) -> Value {
    Value::Array(query.iter().map(field_query_to_json).collect())
}

/// Parse a whole filter query from a JSON array.
pub fn filter_query_from_json(v: &Value) -> Result<FilterQuery, CodecError> {
    let arr = v
        .as_array()
        .ok_or_else(|| CodecError::shape("filter query must be a JSON array"))?;
    arr.iter().map(field_query_from_json).collect()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(operation: QueryOperation) {
        let wire = operation_to_json(&operation);
        let parsed = operation_from_json(&wire).unwrap();
        assert_eq!(parsed, operation, "wire form was {}", wire);
    }

    #[test]
    fn operations_round_trip_through_wire_form() {
        round_trip(QueryOperation::Eq(Operand::Text("x".to_string())));
        round_trip(QueryOperation::Eq(Operand::Number(4.5)));
        round_trip(QueryOperation::Ne(Operand::List(vec![
            "a".to_string(),
            "b".to_string(),
        ])));
        round_trip(QueryOperation::Gt(10.0));
        round_trip(QueryOperation::Range(100.0, 200.0));
        round_trip(QueryOperation::Text {
            search: "needle".to_string(),
        });
        round_trip(QueryOperation::In(vec!["WARNING".to_string()]));
        round_trip(QueryOperation::Nin(vec!["INFO".to_string()]));
        round_trip(QueryOperation::All(SetOperand::Entries(
            [("env".to_string(), "prod".to_string())].into_iter().collect(),
        )));
        round_trip(QueryOperation::All(SetOperand::And(vec![
            QueryOperation::Ne(Operand::Text("X".to_string())),
        ])));
        round_trip(QueryOperation::Any(SetOperand::Or(vec![
            QueryOperation::Eq(Operand::Text("a".to_string())),
            QueryOperation::Eq(Operand::Text("b".to_string())),
        ])));
        round_trip(QueryOperation::Any(SetOperand::Single(Box::new(
            QueryOperation::Gte(5.0),
        ))));
    }

    #[test]
    fn text_wire_shape_nests_search() {
        let wire = operation_to_json(&QueryOperation::Text {
            search: "foo".to_string(),
        });
        assert_eq!(wire, serde_json::json!({"$text": {"$search": "foo"}}));
    }

    #[test]
    fn unknown_operator_symbol_is_rejected() {
        let err = operation_from_json(&serde_json::json!({"$between": [1, 2]})).unwrap_err();
        assert!(err.to_string().contains("unknown operator symbol"));
    }

    #[test]
    fn range_requires_two_numbers() {
        assert!(operation_from_json(&serde_json::json!({"$range": [1]})).is_err());
        assert!(operation_from_json(&serde_json::json!({"$range": [1, "x"]})).is_err());
    }

    #[test]
    fn text_requires_search_key() {
        assert!(operation_from_json(&serde_json::json!({"$text": "foo"})).is_err());
    }

    #[test]
    fn multi_key_operation_is_rejected() {
        let err =
            operation_from_json(&serde_json::json!({"$eq": "a", "$ne": "b"})).unwrap_err();
        assert!(err.to_string().contains("one operator key"));
    }

    #[test]
    fn mixed_combinator_payload_is_rejected() {
        let err = operation_from_json(
            &serde_json::json!({"$all": {"$and": [], "env": "prod"}}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("exactly one operator key"));
    }

    #[test]
    fn entries_coerce_scalars_to_strings() {
        let parsed =
            operation_from_json(&serde_json::json!({"$all": {"port": 8080}})).unwrap();
        assert_eq!(
            parsed,
            QueryOperation::All(SetOperand::Entries(
                [("port".to_string(), "8080".to_string())].into_iter().collect()
            ))
        );
    }

    #[test]
    fn field_query_wire_form() {
        let fq = FieldQuery::new(
            Some("severity"),
            QueryOperation::In(vec!["WARNING".to_string()]),
        );
        let wire = field_query_to_json(&fq);
        assert_eq!(
            wire,
            serde_json::json!({
                "fieldName": "severity",
                "operation": {"$in": ["WARNING"]}
            })
        );
        assert_eq!(field_query_from_json(&wire).unwrap(), fq);
    }

    #[test]
    fn free_text_field_query_serializes_null_name() {
        let fq = FieldQuery::new(
            None,
            QueryOperation::Text {
                search: "foo".to_string(),
            },
        );
        let wire = field_query_to_json(&fq);
        assert_eq!(wire["fieldName"], Value::Null);
        assert_eq!(field_query_from_json(&wire).unwrap(), fq);
    }

    #[test]
    fn filter_query_round_trips_in_order() {
        let query = vec![
            FieldQuery::new(Some("count"), QueryOperation::Gte(5.0)),
            FieldQuery::new(
                None,
                QueryOperation::Text {
                    search: "foo".to_string(),
                },
            ),
        ];
        let wire = filter_query_to_json(&query);
        assert_eq!(filter_query_from_json(&wire).unwrap(), query);
    }
}
