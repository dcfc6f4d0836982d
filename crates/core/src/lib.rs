//! sift-core: the field specification model for the sift query engine.
//!
//! Declares the queryable surface of a data set -- field type families,
//! the operator vocabulary each admits, display metadata, and candidate
//! input validation -- plus the query operation shapes the codec builds
//! and the evaluator matches. Everything here is plain data and pure
//! functions; construction of queries lives in sift-codec and matching
//! lives in sift-eval.

pub mod field;
pub mod input;
pub mod operator;
pub mod query;

pub use field::{Accessor, FieldKind, FieldSpec, Fields, SpecError};
pub use input::{
    is_range_operation_value, parse_number, validate_field_query, QueryInput, Validator, Validity,
};
pub use operator::{Operator, UnknownOperatorSymbol};
pub use query::{AddFilterHook, FieldQuery, FilterQuery, Operand, QueryOperation, SetOperand};
