//! Codec error type.
//!
//! Only internal contract violations surface here: interchange JSON
//! that does not follow the wire shapes, and operations whose operator
//! is foreign to the field's declared type. Incomplete user input is
//! not an error -- the encoder answers `None` for it.

use sift_core::UnknownOperatorSymbol;

/// Errors from decoding queries.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An operation carries an operator the field's type family does
    /// not admit. The encoder never produces such shapes.
    #[error("unknown query operator {operator} for {field_type} field")]
    UnknownOperator {
        field_type: &'static str,
        operator: String,
    },

    /// Interchange JSON that does not follow the wire shapes.
    #[error("malformed query: {0}")]
    Shape(String),

    /// An operator symbol outside the closed vocabulary.
    #[error(transparent)]
    Symbol(#[from] UnknownOperatorSymbol),
}

impl CodecError {
    pub(crate) fn unknown_operator(
        field_type: &'static str,
        operator: sift_core::Operator,
    ) -> Self {
        CodecError::UnknownOperator {
            field_type,
            operator: operator.symbol().to_string(),
        }
    }

    pub(crate) fn shape(message: impl Into<String>) -> Self {
        CodecError::Shape(message.into())
    }
}
