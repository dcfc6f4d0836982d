//! sift-codec: bidirectional mapping between UI-level selections and
//! encoded filter queries.
//!
//! `encode_field_query` turns raw input (a field name, a candidate
//! buffer, chosen operators) into a `FieldQuery`, answering `None` for
//! anything not yet constructible. `decode_field_query` turns an
//! applied query back into the tuple a removable filter tag displays.
//! The `json` module carries the wire form. Filter query lists are
//! updated functionally: every change produces a new list so consumers
//! relying on reference identity observe it.

pub mod decode;
pub mod encode;
pub mod error;
pub mod json;

pub use decode::{decode_field_query, DecodedFieldQuery, DecodedOperand};
pub use encode::encode_field_query;
pub use error::CodecError;
pub use json::{
    field_query_from_json, field_query_to_json, filter_query_from_json, filter_query_to_json,
    operation_from_json, operation_to_json,
};

use sift_core::{FieldQuery, Fields, FilterQuery};

/// A fresh, empty filter query. Matches everything.
pub fn create_filter_query() -> FilterQuery {
    Vec::new()
}

/// Append a term, running the target field's `on_add_filter` hook
/// first. The input list is left untouched.
pub fn add_filter(query: &FilterQuery, field_query: FieldQuery, fields: &Fields) -> FilterQuery {
    let hook = field_query
        .field_name
        .as_deref()
        .and_then(|name| fields.get(name))
        .and_then(|spec| spec.on_add_filter);
    let field_query = match hook {
        Some(hook) => hook(field_query),
        None => field_query,
    };
    let mut next = query.clone();
    next.push(field_query);
    next
}

/// Remove the term at `index`. Out-of-range indexes return an
/// unchanged copy.
pub fn remove_filter(query: &FilterQuery, index: usize) -> FilterQuery {
    let mut next = query.clone();
    if index < next.len() {
        next.remove(index);
    }
    next
}

/// Drop every term.
pub fn remove_all_filters(_query: &FilterQuery) -> FilterQuery {
    Vec::new()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
