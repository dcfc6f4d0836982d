//! Query operation trees and filter query lists.
//!
//! A `QueryOperation` is one encoded predicate shape; a `FieldQuery`
//! binds it to a field name (or to no field, for free-text terms); a
//! `FilterQuery` is an ordered list of field queries with implicit AND
//! semantics. These are plain data -- construction lives in the codec,
//! matching lives in the evaluator.

use std::collections::BTreeMap;

use crate::operator::Operator;

/// A scalar or list operand carried by `$eq`/`$ne`.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

/// The payload of an `$all`/`$any` combinator.
///
/// `Entries` is the flat key-to-value form used for dictionary fields
/// and as the named-sub-field form for record fields. `And`/`Or` carry
/// per-element sub-operations. `Single` is a bare sub-operation applied
/// to each element (numeric comparisons on array elements).
#[derive(Debug, Clone, PartialEq)]
pub enum SetOperand {
    Entries(BTreeMap<String, String>),
    And(Vec<QueryOperation>),
    Or(Vec<QueryOperation>),
    Single(Box<QueryOperation>),
}

/// One encoded predicate, tagged by operator.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperation {
    Eq(Operand),
    Ne(Operand),
    Gt(f64),
    Gte(f64),
    Lt(f64),
    Lte(f64),
    /// Closed interval, both endpoints inclusive.
    Range(f64, f64),
    Text { search: String },
    In(Vec<String>),
    Nin(Vec<String>),
    All(SetOperand),
    Any(SetOperand),
}

impl QueryOperation {
    /// The operator tag of this operation.
    pub fn operator(&self) -> Operator {
        match self {
            QueryOperation::Eq(_) => Operator::Eq,
            QueryOperation::Ne(_) => Operator::Ne,
            QueryOperation::Gt(_) => Operator::Gt,
            QueryOperation::Gte(_) => Operator::Gte,
            QueryOperation::Lt(_) => Operator::Lt,
            QueryOperation::Lte(_) => Operator::Lte,
            QueryOperation::Range(_, _) => Operator::Range,
            QueryOperation::Text { .. } => Operator::Text,
            QueryOperation::In(_) => Operator::In,
            QueryOperation::Nin(_) => Operator::Nin,
            QueryOperation::All(_) => Operator::All,
            QueryOperation::Any(_) => Operator::Any,
        }
    }
}

/// One query term: an operation bound to a field name, or a free-text
/// term when `field_name` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldQuery {
    pub field_name: Option<String>,
    pub operation: QueryOperation,
}

impl FieldQuery {
    pub fn new(field_name: Option<&str>, operation: QueryOperation) -> Self {
        FieldQuery {
            field_name: field_name.map(str::to_owned),
            operation,
        }
    }
}

/// An ordered, implicitly AND-combined list of field queries.
/// The empty list matches everything.
pub type FilterQuery = Vec<FieldQuery>;

/// Hook run on a freshly encoded query before it is inserted into a
/// `FilterQuery`.
pub type AddFilterHook = fn(FieldQuery) -> FieldQuery;

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
