//! Decoding: `FieldQuery` back to a human-displayable tuple.
//!
//! Applied filters are shown to the user as removable tags ("severity
//! in WARNING, ERROR"). Decoding recovers the operator, its display
//! symbol, and a flat operand from the encoded operation. The pair is
//! lossy-tolerant rather than exact: operator defaulting on the encode
//! side is not undone, but re-encoding the decoded operand with the
//! decoded operator always reproduces the same operation.
//!
//! The array and record paths accept some nested shapes the encoder
//! never emits (a bare sub-operation, flat entry operands). Queries
//! loaded from interchange JSON can carry them, so they are decoded
//! rather than rejected.

use std::collections::BTreeMap;

use serde::Serialize;
use sift_core::{
    FieldKind, FieldQuery, Fields, Operand, Operator, QueryOperation, SetOperand,
};

use crate::error::CodecError;

/// Flat, display-ready operand of a decoded query term.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedOperand {
    Text(String),
    Number(f64),
    List(Vec<String>),
    Span([f64; 2]),
    Entries(BTreeMap<String, String>),
}

/// A decoded query term: what a filter tag renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedFieldQuery {
    pub field_name: Option<String>,
    pub operator: Operator,
    pub operator_symbol: String,
    pub operand: DecodedOperand,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_operator: Option<Operator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_operator_symbol: Option<String>,
}

/// Decode one query term for display.
///
/// Terms bound to enum, array, number, and datetime fields get
/// type-specific treatment; everything else -- text, dictionary,
/// record, free-text terms, and names absent from `fields` -- goes
/// through the generic single-operator extraction.
pub fn decode_field_query(
    field_query: &FieldQuery,
    fields: &Fields,
) -> Result<DecodedFieldQuery, CodecError> {
    let spec = field_query
        .field_name
        .as_deref()
        .and_then(|name| fields.get(name));
    let operation = &field_query.operation;

    let (operator, operand, sub) = match spec.map(|s| &s.kind) {
        Some(FieldKind::Enum { .. }) => decode_enum(operation)?,
        Some(FieldKind::Array { .. }) => decode_array(operation)?,
        Some(FieldKind::Number) => decode_numeric(operation, "number")?,
        Some(FieldKind::Datetime) => decode_numeric(operation, "datetime")?,
        _ => decode_generic(operation)?,
    };

    let operator_symbol = match spec {
        Some(spec) => spec.operator_label(operator),
        None => operator.symbol().to_string(),
    };
    let sub_operator_symbol = sub.map(|sub_op| match spec.map(|s| &s.kind) {
        Some(FieldKind::Array { element }) => element.operator_label(sub_op),
        _ => sub_op.symbol().to_string(),
    });

    Ok(DecodedFieldQuery {
        field_name: field_query.field_name.clone(),
        operator,
        operator_symbol,
        operand,
        sub_operator: sub,
        sub_operator_symbol,
    })
}

type Decoded = (Operator, DecodedOperand, Option<Operator>);

fn decode_enum(operation: &QueryOperation) -> Result<Decoded, CodecError> {
    match operation {
        QueryOperation::In(values) => Ok((Operator::In, DecodedOperand::List(values.clone()), None)),
        QueryOperation::Nin(values) => {
            Ok((Operator::Nin, DecodedOperand::List(values.clone()), None))
        }
        QueryOperation::Eq(Operand::Text(v)) => {
            Ok((Operator::Eq, DecodedOperand::Text(v.clone()), None))
        }
        QueryOperation::Ne(Operand::Text(v)) => {
            Ok((Operator::Ne, DecodedOperand::Text(v.clone()), None))
        }
        QueryOperation::Eq(_) | QueryOperation::Ne(_) => {
            Err(CodecError::shape("enum equality requires a text operand"))
        }
        other => Err(CodecError::unknown_operator("enum", other.operator())),
    }
}

fn decode_array(operation: &QueryOperation) -> Result<Decoded, CodecError> {
    match operation {
        QueryOperation::Eq(operand) => {
            Ok((Operator::Eq, decode_operand(operand), None))
        }
        QueryOperation::Ne(operand) => {
            Ok((Operator::Ne, decode_operand(operand), None))
        }
        QueryOperation::All(set) => {
            let (sub, operand) = decode_set(set)?;
            Ok((Operator::All, operand, sub))
        }
        QueryOperation::Any(set) => {
            let (sub, operand) = decode_set(set)?;
            Ok((Operator::Any, operand, sub))
        }
        other => Err(CodecError::unknown_operator("array", other.operator())),
    }
}

fn decode_numeric(
    operation: &QueryOperation,
    field_type: &'static str,
) -> Result<Decoded, CodecError> {
    let numeric = |op: Operator, n: f64| Ok((op, DecodedOperand::Number(n), None));
    match operation {
        QueryOperation::Gt(n) => numeric(Operator::Gt, *n),
        QueryOperation::Gte(n) => numeric(Operator::Gte, *n),
        QueryOperation::Lt(n) => numeric(Operator::Lt, *n),
        QueryOperation::Lte(n) => numeric(Operator::Lte, *n),
        QueryOperation::Eq(Operand::Number(n)) => numeric(Operator::Eq, *n),
        QueryOperation::Ne(Operand::Number(n)) => numeric(Operator::Ne, *n),
        QueryOperation::Range(start, end) if field_type == "datetime" => {
            Ok((Operator::Range, DecodedOperand::Span([*start, *end]), None))
        }
        QueryOperation::Eq(_) | QueryOperation::Ne(_) => Err(CodecError::shape(format!(
            "{} equality requires a numeric operand",
            field_type
        ))),
        other => Err(CodecError::unknown_operator(field_type, other.operator())),
    }
}

/// Extract the sole operator and operand of an operation, unwrapping
/// `$text: {$search}` to the raw search string.
fn decode_generic(operation: &QueryOperation) -> Result<Decoded, CodecError> {
    match operation {
        QueryOperation::Text { search } => {
            Ok((Operator::Text, DecodedOperand::Text(search.clone()), None))
        }
        QueryOperation::Eq(operand) => Ok((Operator::Eq, decode_operand(operand), None)),
        QueryOperation::Ne(operand) => Ok((Operator::Ne, decode_operand(operand), None)),
        QueryOperation::In(values) => Ok((Operator::In, DecodedOperand::List(values.clone()), None)),
        QueryOperation::Nin(values) => {
            Ok((Operator::Nin, DecodedOperand::List(values.clone()), None))
        }
        QueryOperation::Gt(n) => Ok((Operator::Gt, DecodedOperand::Number(*n), None)),
        QueryOperation::Gte(n) => Ok((Operator::Gte, DecodedOperand::Number(*n), None)),
        QueryOperation::Lt(n) => Ok((Operator::Lt, DecodedOperand::Number(*n), None)),
        QueryOperation::Lte(n) => Ok((Operator::Lte, DecodedOperand::Number(*n), None)),
        QueryOperation::Range(start, end) => {
            Ok((Operator::Range, DecodedOperand::Span([*start, *end]), None))
        }
        QueryOperation::All(set) => {
            let (sub, operand) = decode_set(set)?;
            Ok((Operator::All, operand, sub))
        }
        QueryOperation::Any(set) => {
            let (sub, operand) = decode_set(set)?;
            Ok((Operator::Any, operand, sub))
        }
    }
}

/// Reverse-engineer a combinator payload into a flat operand plus a
/// sub-operator: `$or`/`$and` of uniform `$eq` terms reads back as
/// `$in`, of uniform `$ne` terms as `$nin`. Anything mixed falls back
/// to the first sub-operation; a bare sub-operation decodes directly.
fn decode_set(set: &SetOperand) -> Result<(Option<Operator>, DecodedOperand), CodecError> {
    match set {
        SetOperand::Entries(entries) => Ok((None, DecodedOperand::Entries(entries.clone()))),
        SetOperand::Single(op) => Ok((Some(op.operator()), sub_operand(op)?)),
        SetOperand::And(terms) | SetOperand::Or(terms) => {
            if terms.is_empty() {
                return Err(CodecError::shape("empty combinator payload"));
            }
            let eq_values: Option<Vec<String>> = terms
                .iter()
                .map(|t| match t {
                    QueryOperation::Eq(Operand::Text(v)) => Some(v.clone()),
                    _ => None,
                })
                .collect();
            if let Some(values) = eq_values {
                return Ok((Some(Operator::In), DecodedOperand::List(values)));
            }
            let ne_values: Option<Vec<String>> = terms
                .iter()
                .map(|t| match t {
                    QueryOperation::Ne(Operand::Text(v)) => Some(v.clone()),
                    _ => None,
                })
                .collect();
            if let Some(values) = ne_values {
                return Ok((Some(Operator::Nin), DecodedOperand::List(values)));
            }
            let first = &terms[0];
            Ok((Some(first.operator()), sub_operand(first)?))
        }
    }
}

fn sub_operand(op: &QueryOperation) -> Result<DecodedOperand, CodecError> {
    match op {
        QueryOperation::Eq(operand) | QueryOperation::Ne(operand) => Ok(decode_operand(operand)),
        QueryOperation::Gt(n)
        | QueryOperation::Gte(n)
        | QueryOperation::Lt(n)
        | QueryOperation::Lte(n) => Ok(DecodedOperand::Number(*n)),
        QueryOperation::Range(start, end) => Ok(DecodedOperand::Span([*start, *end])),
        QueryOperation::Text { search } => Ok(DecodedOperand::Text(search.clone())),
        QueryOperation::In(values) | QueryOperation::Nin(values) => {
            Ok(DecodedOperand::List(values.clone()))
        }
        QueryOperation::All(_) | QueryOperation::Any(_) => {
            Err(CodecError::shape("combinators do not nest"))
        }
    }
}

fn decode_operand(operand: &Operand) -> DecodedOperand {
    match operand {
        Operand::Number(n) => DecodedOperand::Number(*n),
        Operand::Text(s) => DecodedOperand::Text(s.clone()),
        Operand::List(values) => DecodedOperand::List(values.clone()),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_field_query;
    use sift_core::{FieldSpec, QueryInput};

    fn test_fields() -> Fields {
        Fields::new()
            .with(
                "severity",
                FieldSpec::new(
                    "Severity",
                    vec![Operator::In, Operator::Nin, Operator::Eq, Operator::Ne],
                    FieldKind::Enum {
                        alternatives: [
                            ("WARNING".to_string(), "Warning".to_string()),
                            ("ERROR".to_string(), "Error".to_string()),
                        ]
                        .into_iter()
                        .collect(),
                    },
                ),
            )
            .with(
                "count",
                FieldSpec::new(
                    "Count",
                    vec![Operator::Eq, Operator::Gt, Operator::Gte, Operator::Ne],
                    FieldKind::Number,
                ),
            )
            .with(
                "seen",
                FieldSpec::new(
                    "Last seen",
                    vec![Operator::Eq, Operator::Range],
                    FieldKind::Datetime,
                ),
            )
            .with(
                "tags",
                FieldSpec::new(
                    "Tags",
                    vec![Operator::Any, Operator::All, Operator::Ne],
                    FieldKind::Array {
                        element: Box::new(FieldSpec::new(
                            "Tag",
                            vec![Operator::In, Operator::Nin, Operator::Eq, Operator::Ne],
                            FieldKind::Enum {
                                alternatives: [("red".to_string(), "Red".to_string())]
                                    .into_iter()
                                    .collect(),
                            },
                        )),
                    },
                ),
            )
            .with(
                "message",
                FieldSpec::new("Message", vec![Operator::Text], FieldKind::Text),
            )
            .with(
                "labels",
                FieldSpec::new(
                    "Labels",
                    vec![Operator::All],
                    FieldKind::Dictionary {
                        suggested_keys: vec![],
                    },
                ),
            )
    }

    #[test]
    fn enum_in_decodes_to_list() {
        let fields = test_fields();
        let fq = FieldQuery::new(
            Some("severity"),
            QueryOperation::In(vec!["WARNING".to_string(), "ERROR".to_string()]),
        );
        let decoded = decode_field_query(&fq, &fields).unwrap();
        assert_eq!(decoded.operator, Operator::In);
        assert_eq!(decoded.operator_symbol, "in");
        assert_eq!(
            decoded.operand,
            DecodedOperand::List(vec!["WARNING".to_string(), "ERROR".to_string()])
        );
        assert_eq!(decoded.sub_operator, None);
    }

    #[test]
    fn array_or_of_eq_reads_back_as_in() {
        let fields = test_fields();
        let fq = encode_field_query(
            Some("tags"),
            &QueryInput::Choices(vec!["red".to_string(), "blue".to_string()]),
            Some(Operator::Any),
            Some(Operator::In),
            &fields,
            None,
        )
        .unwrap();
        let decoded = decode_field_query(&fq, &fields).unwrap();
        assert_eq!(decoded.operator, Operator::Any);
        assert_eq!(decoded.sub_operator, Some(Operator::In));
        assert_eq!(decoded.sub_operator_symbol.as_deref(), Some("in"));
        assert_eq!(
            decoded.operand,
            DecodedOperand::List(vec!["red".to_string(), "blue".to_string()])
        );
    }

    #[test]
    fn array_and_of_ne_reads_back_as_nin() {
        let fields = test_fields();
        let fq = FieldQuery::new(
            Some("tags"),
            QueryOperation::All(SetOperand::And(vec![
                QueryOperation::Ne(Operand::Text("red".to_string())),
                QueryOperation::Ne(Operand::Text("blue".to_string())),
            ])),
        );
        let decoded = decode_field_query(&fq, &fields).unwrap();
        assert_eq!(decoded.operator, Operator::All);
        assert_eq!(decoded.sub_operator, Some(Operator::Nin));
    }

    #[test]
    fn array_bare_sub_operation_decodes_directly() {
        let fields = test_fields();
        let fq = FieldQuery::new(
            Some("tags"),
            QueryOperation::All(SetOperand::Single(Box::new(QueryOperation::Gte(5.0)))),
        );
        let decoded = decode_field_query(&fq, &fields).unwrap();
        assert_eq!(decoded.operator, Operator::All);
        assert_eq!(decoded.sub_operator, Some(Operator::Gte));
        assert_eq!(decoded.operand, DecodedOperand::Number(5.0));
    }

    #[test]
    fn array_mixed_combinator_falls_back_to_first_term() {
        let fields = test_fields();
        let fq = FieldQuery::new(
            Some("tags"),
            QueryOperation::Any(SetOperand::Or(vec![
                QueryOperation::Eq(Operand::Text("red".to_string())),
                QueryOperation::Ne(Operand::Text("blue".to_string())),
            ])),
        );
        let decoded = decode_field_query(&fq, &fields).unwrap();
        assert_eq!(decoded.sub_operator, Some(Operator::Eq));
        assert_eq!(decoded.operand, DecodedOperand::Text("red".to_string()));
    }

    #[test]
    fn text_search_unwraps_to_raw_string() {
        let fields = test_fields();
        let fq = FieldQuery::new(
            Some("message"),
            QueryOperation::Text {
                search: "disk full".to_string(),
            },
        );
        let decoded = decode_field_query(&fq, &fields).unwrap();
        assert_eq!(decoded.operator, Operator::Text);
        assert_eq!(decoded.operator_symbol, "contains");
        assert_eq!(decoded.operand, DecodedOperand::Text("disk full".to_string()));
    }

    #[test]
    fn datetime_range_decodes_to_span() {
        let fields = test_fields();
        let fq = FieldQuery::new(Some("seen"), QueryOperation::Range(100.0, 200.0));
        let decoded = decode_field_query(&fq, &fields).unwrap();
        assert_eq!(decoded.operator, Operator::Range);
        assert_eq!(decoded.operator_symbol, "between");
        assert_eq!(decoded.operand, DecodedOperand::Span([100.0, 200.0]));
    }

    #[test]
    fn dictionary_entries_decode_whole() {
        let fields = test_fields();
        let fq = FieldQuery::new(
            Some("labels"),
            QueryOperation::All(SetOperand::Entries(
                [("env".to_string(), "prod".to_string())].into_iter().collect(),
            )),
        );
        let decoded = decode_field_query(&fq, &fields).unwrap();
        assert_eq!(decoded.operator, Operator::All);
        assert_eq!(decoded.operator_symbol, "has");
        assert_eq!(
            decoded.operand,
            DecodedOperand::Entries(
                [("env".to_string(), "prod".to_string())].into_iter().collect()
            )
        );
    }

    #[test]
    fn operator_info_overrides_symbol() {
        let mut fields = test_fields();
        fields.insert(
            "count",
            FieldSpec::new(
                "Count",
                vec![Operator::Gt],
                FieldKind::Number,
            )
            .with_operator_info(Operator::Gt, "more than"),
        );
        let fq = FieldQuery::new(Some("count"), QueryOperation::Gt(5.0));
        let decoded = decode_field_query(&fq, &fields).unwrap();
        assert_eq!(decoded.operator_symbol, "more than");
    }

    #[test]
    fn free_text_term_uses_wire_symbol() {
        let fields = test_fields();
        let fq = FieldQuery::new(
            None,
            QueryOperation::Text {
                search: "foo".to_string(),
            },
        );
        let decoded = decode_field_query(&fq, &fields).unwrap();
        assert_eq!(decoded.field_name, None);
        assert_eq!(decoded.operator_symbol, "$text");
    }

    #[test]
    fn operator_foreign_to_field_type_is_an_error() {
        let fields = test_fields();
        let fq = FieldQuery::new(Some("count"), QueryOperation::Range(1.0, 2.0));
        let err = decode_field_query(&fq, &fields).unwrap_err();
        assert!(err
            .to_string()
            .contains("unknown query operator $range for number field"));

        let fq = FieldQuery::new(
            Some("severity"),
            QueryOperation::Text {
                search: "x".to_string(),
            },
        );
        assert!(decode_field_query(&fq, &fields).is_err());
    }

    /// Decoding then re-encoding with the decoded operator reproduces
    /// the original operation.
    #[test]
    fn decode_reencode_is_stable() {
        let fields = test_fields();
        let cases = vec![
            encode_field_query(
                Some("severity"),
                &QueryInput::Choices(vec!["WARNING".to_string(), "ERROR".to_string()]),
                Some(Operator::In),
                None,
                &fields,
                None,
            )
            .unwrap(),
            encode_field_query(
                Some("count"),
                &QueryInput::Text("42".to_string()),
                Some(Operator::Gte),
                None,
                &fields,
                None,
            )
            .unwrap(),
            encode_field_query(
                Some("seen"),
                &QueryInput::Span(100.0, 200.0),
                None,
                None,
                &fields,
                None,
            )
            .unwrap(),
            encode_field_query(
                Some("tags"),
                &QueryInput::Choices(vec!["red".to_string()]),
                Some(Operator::All),
                Some(Operator::Nin),
                &fields,
                None,
            )
            .unwrap(),
            encode_field_query(
                Some("message"),
                &QueryInput::Text("disk".to_string()),
                Some(Operator::Text),
                None,
                &fields,
                None,
            )
            .unwrap(),
        ];

        for original in cases {
            let decoded = decode_field_query(&original, &fields).unwrap();
            let input = match &decoded.operand {
                DecodedOperand::Text(s) => QueryInput::Text(s.clone()),
                DecodedOperand::Number(n) => QueryInput::Text(n.to_string()),
                DecodedOperand::List(values) => QueryInput::Choices(values.clone()),
                DecodedOperand::Span([a, b]) => QueryInput::Span(*a, *b),
                DecodedOperand::Entries(_) => unreachable!("no dictionary case here"),
            };
            let reencoded = encode_field_query(
                decoded.field_name.as_deref(),
                &input,
                Some(decoded.operator),
                decoded.sub_operator,
                &fields,
                None,
            )
            .unwrap();
            assert_eq!(reencoded.operation, original.operation);
        }
    }
}
