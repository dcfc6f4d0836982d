//! Evaluator errors.
//!
//! These are internal contract violations, not user-input failures:
//! the codec never produces an operation whose operator is foreign to
//! the field's type, so meeting one here means the codec and the
//! evaluator have fallen out of sync. They propagate to the caller and
//! fail the whole evaluation; there is no partial result.

use std::fmt;

use sift_core::QueryOperation;

/// Errors that can occur while applying a filter query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// An operation carries an operator the field's type does not admit.
    UnknownOperator {
        field_type: &'static str,
        operator: String,
    },
    /// A query names a field with no specification.
    UnknownField { field: String },
    /// A term has no field name and no accessor to retrieve a value with.
    MissingAccessor,
    /// An item value is present but does not parse as the field's value type.
    ValueType {
        expected: &'static str,
        got: String,
    },
}

impl EvalError {
    pub(crate) fn unknown_operator(field_type: &'static str, operation: &QueryOperation) -> Self {
        EvalError::UnknownOperator {
            field_type,
            operator: operation.operator().symbol().to_string(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnknownOperator {
                field_type,
                operator,
            } => {
                write!(
                    f,
                    "unknown query operator {} for {} field",
                    operator, field_type
                )
            }
            EvalError::UnknownField { field } => {
                write!(f, "unknown field type: no specification for '{}'", field)
            }
            EvalError::MissingAccessor => {
                write!(f, "term has no field name and no accessor")
            }
            EvalError::ValueType { expected, got } => {
                write!(f, "expected {} value, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for EvalError {}
