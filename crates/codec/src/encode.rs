//! Encoding: raw UI input to `FieldQuery`.
//!
//! The encoder is deliberately silent about bad input. A half-typed
//! number, an empty selection, or an operator the field does not offer
//! all answer `None` -- "do not add this filter" -- because partially
//! constructed queries are the normal state of an interactive surface.
//! Validation messages for the user come from
//! `sift_core::validate_field_query`, not from here.

use sift_core::{
    parse_number, FieldKind, FieldQuery, FieldSpec, Fields, Operand, Operator, QueryInput,
    QueryOperation, SetOperand,
};

/// Encode one query term from UI state.
///
/// `field_name` of `None`, or a name absent from `fields`, produces a
/// free-text term (`field_name: None`, `$text` operation) so global
/// search input flows through the same path as field-bound input.
/// `key` is consumed by dictionary fields only.
pub fn encode_field_query(
    field_name: Option<&str>,
    input: &QueryInput,
    selected_operator: Option<Operator>,
    selected_sub_operator: Option<Operator>,
    fields: &Fields,
    key: Option<&str>,
) -> Option<FieldQuery> {
    let spec = match field_name {
        Some(name) => match fields.get(name) {
            Some(spec) => spec,
            None => return free_text_query(input),
        },
        None => return free_text_query(input),
    };

    if let Some(op) = selected_operator {
        if !spec.supports(op) {
            return None;
        }
    }

    let operation = encode_operation(spec, input, selected_operator, selected_sub_operator, key)?;
    Some(FieldQuery::new(field_name, operation))
}

fn free_text_query(input: &QueryInput) -> Option<FieldQuery> {
    match input {
        QueryInput::Text(s) if !s.trim().is_empty() => Some(FieldQuery::new(
            None,
            QueryOperation::Text {
                search: s.clone(),
            },
        )),
        _ => None,
    }
}

fn encode_operation(
    spec: &FieldSpec,
    input: &QueryInput,
    selected_operator: Option<Operator>,
    selected_sub_operator: Option<Operator>,
    key: Option<&str>,
) -> Option<QueryOperation> {
    match &spec.kind {
        FieldKind::Enum { .. } => encode_enum(input, selected_operator),
        FieldKind::Array { .. } => encode_array(input, selected_operator, selected_sub_operator),
        FieldKind::Text => encode_text(input, selected_operator),
        FieldKind::Number => encode_number(input, selected_operator),
        FieldKind::Datetime => encode_datetime(spec, input, selected_operator),
        FieldKind::Dictionary { .. } => encode_dictionary(input, key),
        // Record queries originate outside the interactive surface
        // (loaded from interchange JSON); there is nothing to encode.
        FieldKind::Record { .. } => None,
    }
}

fn encode_enum(input: &QueryInput, selected_operator: Option<Operator>) -> Option<QueryOperation> {
    let QueryInput::Choices(values) = input else {
        return None;
    };
    if values.is_empty() {
        return None;
    }
    Some(match selected_operator {
        Some(Operator::In) => QueryOperation::In(values.clone()),
        Some(Operator::Nin) => QueryOperation::Nin(values.clone()),
        Some(Operator::Ne) => QueryOperation::Ne(Operand::Text(values[0].clone())),
        _ => QueryOperation::Eq(Operand::Text(values[0].clone())),
    })
}

fn encode_array(
    input: &QueryInput,
    selected_operator: Option<Operator>,
    selected_sub_operator: Option<Operator>,
) -> Option<QueryOperation> {
    match input {
        QueryInput::Choices(values) => {
            if values.is_empty() {
                return None;
            }
            Some(match (selected_operator, selected_sub_operator) {
                (Some(Operator::Ne), _) => QueryOperation::Ne(Operand::List(values.clone())),
                (Some(Operator::Any), Some(Operator::In)) => {
                    QueryOperation::Any(SetOperand::Or(eq_terms(values)))
                }
                (Some(Operator::Any), Some(Operator::Nin)) => {
                    QueryOperation::Any(SetOperand::Or(ne_terms(values)))
                }
                (Some(Operator::All), Some(Operator::In)) => {
                    QueryOperation::All(SetOperand::And(eq_terms(values)))
                }
                (Some(Operator::All), Some(Operator::Nin)) => {
                    QueryOperation::All(SetOperand::And(ne_terms(values)))
                }
                _ => QueryOperation::Eq(Operand::List(values.clone())),
            })
        }
        // Numeric element comparisons arrive as raw text.
        QueryInput::Text(raw) => {
            if raw.trim().is_empty() {
                return None;
            }
            match (selected_operator, selected_sub_operator) {
                (Some(op @ (Operator::Any | Operator::All)), Some(sub_op))
                    if is_numeric_comparator(sub_op) =>
                {
                    let n = parse_number(raw)?;
                    let sub = Box::new(numeric_operation(sub_op, n)?);
                    Some(match op {
                        Operator::Any => QueryOperation::Any(SetOperand::Single(sub)),
                        _ => QueryOperation::All(SetOperand::Single(sub)),
                    })
                }
                _ => Some(QueryOperation::Eq(Operand::Text(raw.clone()))),
            }
        }
        _ => None,
    }
}

fn eq_terms(values: &[String]) -> Vec<QueryOperation> {
    values
        .iter()
        .map(|v| QueryOperation::Eq(Operand::Text(v.clone())))
        .collect()
}

fn ne_terms(values: &[String]) -> Vec<QueryOperation> {
    values
        .iter()
        .map(|v| QueryOperation::Ne(Operand::Text(v.clone())))
        .collect()
}

fn encode_text(input: &QueryInput, selected_operator: Option<Operator>) -> Option<QueryOperation> {
    let QueryInput::Text(s) = input else {
        return None;
    };
    if s.is_empty() {
        return None;
    }
    Some(match selected_operator {
        Some(Operator::Text) => QueryOperation::Text { search: s.clone() },
        _ => QueryOperation::Eq(Operand::Text(s.clone())),
    })
}

fn encode_number(
    input: &QueryInput,
    selected_operator: Option<Operator>,
) -> Option<QueryOperation> {
    let QueryInput::Text(raw) = input else {
        return None;
    };
    let n = parse_number(raw)?;
    let op = selected_operator.unwrap_or(Operator::Eq);
    numeric_operation(op, n).or(Some(QueryOperation::Eq(Operand::Number(n))))
}

fn encode_datetime(
    spec: &FieldSpec,
    input: &QueryInput,
    selected_operator: Option<Operator>,
) -> Option<QueryOperation> {
    match input {
        QueryInput::Span(start, end) => {
            if *start != 0.0 && *end != 0.0 && spec.supports(Operator::Range) {
                Some(QueryOperation::Range(*start, *end))
            } else {
                None
            }
        }
        QueryInput::Stamp(t) => {
            let op = selected_operator.unwrap_or(Operator::Eq);
            numeric_operation(op, *t).or(Some(QueryOperation::Eq(Operand::Number(*t))))
        }
        _ => None,
    }
}

fn encode_dictionary(input: &QueryInput, key: Option<&str>) -> Option<QueryOperation> {
    let QueryInput::Text(value) = input else {
        return None;
    };
    let mut entries = std::collections::BTreeMap::new();
    entries.insert(key.unwrap_or("").to_string(), value.clone());
    Some(QueryOperation::All(SetOperand::Entries(entries)))
}

fn is_numeric_comparator(op: Operator) -> bool {
    matches!(
        op,
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte | Operator::Eq | Operator::Ne
    )
}

/// Build the numeric comparison operation for `op`, or `None` when the
/// operator is not a numeric comparator.
pub(crate) fn numeric_operation(op: Operator, n: f64) -> Option<QueryOperation> {
    Some(match op {
        Operator::Gt => QueryOperation::Gt(n),
        Operator::Gte => QueryOperation::Gte(n),
        Operator::Lt => QueryOperation::Lt(n),
        Operator::Lte => QueryOperation::Lte(n),
        Operator::Ne => QueryOperation::Ne(Operand::Number(n)),
        Operator::Eq => QueryOperation::Eq(Operand::Number(n)),
        _ => return None,
    })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
