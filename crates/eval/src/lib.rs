//! sift-eval: applies a filter query to an in-memory record set.
//!
//! `filter_by_query` takes the field specifications, a keyed item map,
//! and an ordered filter query, and returns the sub-map of items
//! matching every term. Evaluation is synchronous, pure, and complete:
//! no memoization, no partial results -- either every retained item
//! matched every term, or the call failed with an `EvalError`.

pub mod error;
pub mod matches;
pub mod value;

pub use error::EvalError;
pub use matches::matches_field_query;
pub use value::{parse_field_value, FieldValue};

use indexmap::IndexMap;
use sift_core::{FieldQuery, Fields, FilterQuery, QueryOperation};

/// Items keyed by an opaque identifier.
pub type Items = IndexMap<String, serde_json::Value>;

/// Apply every term of `query` to every item, retaining the items that
/// match all of them.
///
/// The empty query is the identity: a shallow copy of `items` in the
/// original order.
pub fn filter_by_query(
    fields: &Fields,
    items: &Items,
    query: &FilterQuery,
) -> Result<Items, EvalError> {
    if query.is_empty() {
        return Ok(items.clone());
    }
    let mut kept = IndexMap::new();
    'items: for (id, item) in items {
        for term in query {
            if !matches_term(fields, item, term)? {
                continue 'items;
            }
        }
        kept.insert(id.clone(), item.clone());
    }
    Ok(kept)
}

/// Evaluate one term against one item.
///
/// Terms bound to a specified field retrieve the value through the
/// field's accessor when configured, else by direct property lookup;
/// an absent value simply fails the term. Free-text terms match the
/// item's flattened scalar content. A term naming an unspecified field
/// cannot be interpreted and is an error.
fn matches_term(
    fields: &Fields,
    item: &serde_json::Value,
    term: &FieldQuery,
) -> Result<bool, EvalError> {
    let Some(name) = term.field_name.as_deref() else {
        return match &term.operation {
            QueryOperation::Text { search } => Ok(item_contains(item, search)),
            _ => Err(EvalError::MissingAccessor),
        };
    };
    let Some(spec) = fields.get(name) else {
        return Err(EvalError::UnknownField {
            field: name.to_string(),
        });
    };
    let raw = match spec.accessor {
        Some(accessor) => accessor(item),
        None => item.get(name).cloned(),
    };
    match raw {
        Some(raw) => matches_field_query(spec, &raw, &term.operation),
        None => Ok(false),
    }
}

/// Case-insensitive containment over every scalar in the item.
fn item_contains(item: &serde_json::Value, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    scalar_contains(item, &needle)
}

fn scalar_contains(v: &serde_json::Value, needle: &str) -> bool {
    match v {
        serde_json::Value::String(s) => s.to_lowercase().contains(needle),
        serde_json::Value::Number(n) => n.to_string().contains(needle),
        serde_json::Value::Bool(b) => b.to_string().contains(needle),
        serde_json::Value::Array(arr) => arr.iter().any(|item| scalar_contains(item, needle)),
        serde_json::Value::Object(obj) => obj.values().any(|item| scalar_contains(item, needle)),
        serde_json::Value::Null => false,
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
