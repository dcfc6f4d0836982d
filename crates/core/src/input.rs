//! UI-side candidate buffers and their validation.
//!
//! `QueryInput` is what an interactive surface holds while the user is
//! still typing or selecting: raw text, a list of picked values, or
//! timestamp endpoints. Validation never fails loudly -- a bad buffer
//! produces a `Validity` verdict with a message for the surface to
//! display, and the codec silently refuses to encode it.

use crate::field::{FieldKind, FieldSpec};

/// A candidate value buffer, shaped by the field variant being edited.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryInput {
    /// Raw text: text fields, number fields, dictionary values.
    Text(String),
    /// Picked values: enum and array fields.
    Choices(Vec<String>),
    /// A single timestamp, Unix seconds.
    Stamp(f64),
    /// A `[start, end]` timestamp pair, Unix seconds.
    Span(f64, f64),
}

/// Type guard for the `[start, end]` pair shape.
pub fn is_range_operation_value(input: &QueryInput) -> bool {
    matches!(input, QueryInput::Span(_, _))
}

/// Validation verdict for a candidate buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validity {
    pub is_valid: bool,
    pub message: Option<String>,
}

impl Validity {
    pub fn ok() -> Self {
        Validity {
            is_valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Validity {
            is_valid: false,
            message: Some(message.into()),
        }
    }
}

/// Per-field validation hook.
pub type Validator = fn(&QueryInput) -> Validity;

/// Parse a user-typed number, tolerating spaces and thousands commas.
/// Returns `None` for anything that does not parse to a finite float.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ' ' && *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Validate a candidate buffer against a field specification.
///
/// Runs the built-in per-type check first, then the field's custom
/// validator when one is configured.
pub fn validate_field_query(spec: &FieldSpec, input: &QueryInput) -> Validity {
    let builtin = builtin_validity(spec, input);
    if !builtin.is_valid {
        return builtin;
    }
    match spec.validator {
        Some(validator) => validator(input),
        None => builtin,
    }
}

fn builtin_validity(spec: &FieldSpec, input: &QueryInput) -> Validity {
    match &spec.kind {
        FieldKind::Text | FieldKind::Dictionary { .. } => match input {
            QueryInput::Text(s) if !s.trim().is_empty() => Validity::ok(),
            QueryInput::Text(_) => Validity::invalid("enter a value"),
            _ => Validity::invalid("expected a text value"),
        },
        FieldKind::Number => match input {
            QueryInput::Text(raw) => match parse_number(raw) {
                Some(_) => Validity::ok(),
                None => Validity::invalid(format!("'{}' is not a number", raw)),
            },
            _ => Validity::invalid("expected a numeric value"),
        },
        FieldKind::Datetime => match input {
            QueryInput::Stamp(_) => Validity::ok(),
            QueryInput::Span(start, end) => {
                if *start != 0.0 && *end != 0.0 {
                    Validity::ok()
                } else {
                    Validity::invalid("both range endpoints are required")
                }
            }
            _ => Validity::invalid("expected a timestamp"),
        },
        FieldKind::Enum { .. } => match input {
            QueryInput::Choices(values) if !values.is_empty() => Validity::ok(),
            QueryInput::Choices(_) => Validity::invalid("select at least one value"),
            _ => Validity::invalid("expected a selection"),
        },
        FieldKind::Array { element } => match input {
            QueryInput::Choices(values) if !values.is_empty() => Validity::ok(),
            QueryInput::Choices(_) => Validity::invalid("select at least one value"),
            // Numeric element comparisons arrive as raw text.
            QueryInput::Text(raw) => match &element.kind {
                FieldKind::Number => match parse_number(raw) {
                    Some(_) => Validity::ok(),
                    None => Validity::invalid(format!("'{}' is not a number", raw)),
                },
                _ => Validity::invalid("expected a selection"),
            },
            _ => Validity::invalid("expected a selection"),
        },
        // Record queries are not constructed interactively.
        FieldKind::Record { .. } => Validity::ok(),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Operator;

    fn number_field() -> FieldSpec {
        FieldSpec::new(
            "Count",
            vec![Operator::Eq, Operator::Gt, Operator::Gte],
            FieldKind::Number,
        )
    }

    #[test]
    fn range_guard_matches_only_spans() {
        assert!(is_range_operation_value(&QueryInput::Span(1.0, 2.0)));
        assert!(!is_range_operation_value(&QueryInput::Stamp(1.0)));
        assert!(!is_range_operation_value(&QueryInput::Text(
            "1,2".to_string()
        )));
    }

    #[test]
    fn parse_number_strips_spaces_and_commas() {
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("-0.5"), Some(-0.5));
    }

    #[test]
    fn parse_number_rejects_garbage() {
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn number_validation_reports_bad_input() {
        let spec = number_field();
        let v = validate_field_query(&spec, &QueryInput::Text("12x".to_string()));
        assert!(!v.is_valid);
        assert_eq!(v.message.as_deref(), Some("'12x' is not a number"));
        assert!(validate_field_query(&spec, &QueryInput::Text("1,200".to_string())).is_valid);
    }

    #[test]
    fn datetime_span_requires_both_endpoints() {
        let spec = FieldSpec::new(
            "Seen",
            vec![Operator::Eq, Operator::Range],
            FieldKind::Datetime,
        );
        assert!(!validate_field_query(&spec, &QueryInput::Span(0.0, 100.0)).is_valid);
        assert!(validate_field_query(&spec, &QueryInput::Span(50.0, 100.0)).is_valid);
    }

    #[test]
    fn empty_selection_is_invalid() {
        let spec = FieldSpec::new(
            "Severity",
            vec![Operator::In],
            FieldKind::Enum {
                alternatives: [("INFO".to_string(), "Info".to_string())]
                    .into_iter()
                    .collect(),
            },
        );
        assert!(!validate_field_query(&spec, &QueryInput::Choices(vec![])).is_valid);
    }

    #[test]
    fn custom_validator_runs_after_builtin() {
        fn no_zero(input: &QueryInput) -> Validity {
            match input {
                QueryInput::Text(s) if parse_number(s) == Some(0.0) => {
                    Validity::invalid("zero is not allowed")
                }
                _ => Validity::ok(),
            }
        }
        let spec = number_field().with_validator(no_zero);
        assert!(validate_field_query(&spec, &QueryInput::Text("5".to_string())).is_valid);
        let v = validate_field_query(&spec, &QueryInput::Text("0".to_string()));
        assert_eq!(v.message.as_deref(), Some("zero is not allowed"));
        // Builtin still rejects unparseable input before the custom hook.
        assert!(!validate_field_query(&spec, &QueryInput::Text("x".to_string())).is_valid);
    }
}
