//! Field specifications: the declarative description of what can be
//! queried and how.
//!
//! A `FieldSpec` pairs display metadata and an operator list with a
//! `FieldKind` variant that fixes the runtime value type the evaluator
//! expects: string for text, float for number, Unix seconds for
//! datetime, an alternative key for enum, a list of the element kind's
//! values for array, string-keyed strings for dictionary, and a nested
//! field map for record. Specifications are plain data; loading them
//! from JSON covers everything except the code hooks (`accessor`,
//! `validator`, `on_add_filter`), which stay `None` on loaded specs.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::input::Validator;
use crate::operator::Operator;
use crate::query::AddFilterHook;

/// Pulls a field's value out of an opaque item record, overriding the
/// default direct property lookup by field name.
pub type Accessor = fn(&serde_json::Value) -> Option<serde_json::Value>;

/// The type family of a field, with the variant-specific data.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Text,
    Number,
    Datetime,
    Enum {
        /// Admissible values, value key to display label, in declaration order.
        alternatives: IndexMap<String, String>,
    },
    Array {
        /// Element specification. Only enum and number elements are
        /// expressible; the nesting stops at one level.
        element: Box<FieldSpec>,
    },
    Dictionary {
        suggested_keys: Vec<String>,
    },
    Record {
        fields: Fields,
    },
}

/// One queryable field: type family, operator list, display metadata,
/// and optional behavior hooks.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub label: String,
    /// Operators offered for this field, in display order. Must be
    /// non-empty and drawn from the type family's admissible set.
    pub operators: Vec<Operator>,
    pub placeholder: Option<String>,
    /// Per-field display label overrides for operators.
    pub operator_info: BTreeMap<Operator, String>,
    pub accessor: Option<Accessor>,
    pub validator: Option<Validator>,
    pub on_add_filter: Option<AddFilterHook>,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(label: impl Into<String>, operators: Vec<Operator>, kind: FieldKind) -> Self {
        FieldSpec {
            label: label.into(),
            operators,
            placeholder: None,
            operator_info: BTreeMap::new(),
            accessor: None,
            validator: None,
            on_add_filter: None,
            kind,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_operator_info(mut self, operator: Operator, label: impl Into<String>) -> Self {
        self.operator_info.insert(operator, label.into());
        self
    }

    pub fn with_accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = Some(accessor);
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_on_add_filter(mut self, hook: AddFilterHook) -> Self {
        self.on_add_filter = Some(hook);
        self
    }

    /// The lowercase type tag of this field's kind.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Datetime => "datetime",
            FieldKind::Enum { .. } => "enum",
            FieldKind::Array { .. } => "array",
            FieldKind::Dictionary { .. } => "dictionary",
            FieldKind::Record { .. } => "record",
        }
    }

    /// The closed operator set the type family admits. A field's
    /// declared `operators` list must be a subset of this.
    pub fn admissible_operators(&self) -> &'static [Operator] {
        match &self.kind {
            FieldKind::Enum { .. } => {
                &[Operator::In, Operator::Nin, Operator::Eq, Operator::Ne]
            }
            FieldKind::Array { .. } => {
                &[Operator::Eq, Operator::Ne, Operator::All, Operator::Any]
            }
            FieldKind::Text => &[Operator::Eq, Operator::Text],
            FieldKind::Number => &[
                Operator::Eq,
                Operator::Gt,
                Operator::Gte,
                Operator::Lt,
                Operator::Lte,
                Operator::Ne,
            ],
            FieldKind::Dictionary { .. } => &[Operator::All],
            FieldKind::Record { .. } => &[Operator::All, Operator::Any],
            FieldKind::Datetime => &[
                Operator::Eq,
                Operator::Gt,
                Operator::Gte,
                Operator::Lt,
                Operator::Lte,
                Operator::Ne,
                Operator::Range,
            ],
        }
    }

    /// Whether this field declares `operator` in its operator list.
    pub fn supports(&self, operator: Operator) -> bool {
        self.operators.contains(&operator)
    }

    /// Human display label for an operator on this field: the
    /// per-field override when present, else the type family default.
    pub fn operator_label(&self, operator: Operator) -> String {
        if let Some(label) = self.operator_info.get(&operator) {
            return label.clone();
        }
        default_operator_label(&self.kind, operator).to_string()
    }
}

fn default_operator_label(kind: &FieldKind, operator: Operator) -> &'static str {
    match kind {
        FieldKind::Text => match operator {
            Operator::Eq => "is",
            Operator::Text => "contains",
            other => other.symbol(),
        },
        FieldKind::Number => match operator {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            other => other.symbol(),
        },
        FieldKind::Datetime => match operator {
            Operator::Eq => "at",
            Operator::Ne => "not at",
            Operator::Gt => "after",
            Operator::Gte => "at or after",
            Operator::Lt => "before",
            Operator::Lte => "at or before",
            Operator::Range => "between",
            other => other.symbol(),
        },
        FieldKind::Enum { .. } => match operator {
            Operator::Eq => "is",
            Operator::Ne => "is not",
            Operator::In => "in",
            Operator::Nin => "not in",
            other => other.symbol(),
        },
        FieldKind::Array { .. } => match operator {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::All => "all",
            Operator::Any => "any",
            other => other.symbol(),
        },
        FieldKind::Dictionary { .. } => match operator {
            Operator::All => "has",
            other => other.symbol(),
        },
        FieldKind::Record { .. } => match operator {
            Operator::All => "all",
            Operator::Any => "any",
            other => other.symbol(),
        },
    }
}

/// Error loading a field specification from JSON.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("field specifications must be a JSON object")]
    NotAnObject,
    #[error("field '{field}': {message}")]
    Field { field: String, message: String },
}

impl SpecError {
    fn field(name: &str, message: impl Into<String>) -> Self {
        SpecError::Field {
            field: name.to_string(),
            message: message.into(),
        }
    }
}

/// The complete queryable surface of one data set: an insertion-ordered
/// map from field name to specification.
#[derive(Debug, Clone, Default)]
pub struct Fields(IndexMap<String, FieldSpec>);

impl Fields {
    pub fn new() -> Self {
        Fields(IndexMap::new())
    }

    /// Builder-style insert, preserving declaration order.
    pub fn with(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.0.insert(name.into(), spec);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
        self.0.insert(name.into(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSpec)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Load a field map from its declarative JSON form. Hooks are not
    /// expressible in JSON and stay unset.
    pub fn from_json(v: &serde_json::Value) -> Result<Self, SpecError> {
        let obj = v.as_object().ok_or(SpecError::NotAnObject)?;
        let mut fields = Fields::new();
        for (name, spec_json) in obj {
            let mut spec = FieldSpec::from_json(name, spec_json)?;
            if spec.label.is_empty() {
                spec.label = name.clone();
            }
            fields.insert(name.clone(), spec);
        }
        Ok(fields)
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a FieldSpec);
    type IntoIter = indexmap::map::Iter<'a, String, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FieldSpec {
    /// Parse one field specification from its declarative JSON form.
    pub fn from_json(name: &str, v: &serde_json::Value) -> Result<Self, SpecError> {
        let obj = v
            .as_object()
            .ok_or_else(|| SpecError::field(name, "specification must be a JSON object"))?;

        let type_tag = obj
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| SpecError::field(name, "missing 'type' tag"))?;

        let kind = match type_tag {
            "text" => FieldKind::Text,
            "number" => FieldKind::Number,
            "datetime" => FieldKind::Datetime,
            "enum" => {
                let alternatives_json = obj
                    .get("alternatives")
                    .and_then(|a| a.as_object())
                    .ok_or_else(|| SpecError::field(name, "enum requires 'alternatives'"))?;
                let mut alternatives = IndexMap::new();
                for (value, meta) in alternatives_json {
                    let label = meta
                        .get("label")
                        .and_then(|l| l.as_str())
                        .unwrap_or(value.as_str());
                    alternatives.insert(value.clone(), label.to_string());
                }
                FieldKind::Enum { alternatives }
            }
            "array" => {
                let element_json = obj
                    .get("element")
                    .ok_or_else(|| SpecError::field(name, "array requires 'element'"))?;
                let element = FieldSpec::from_json(name, element_json)?;
                match element.kind {
                    FieldKind::Enum { .. } | FieldKind::Number => {}
                    _ => {
                        return Err(SpecError::field(
                            name,
                            format!(
                                "array element must be enum or number, got {}",
                                element.type_name()
                            ),
                        ));
                    }
                }
                FieldKind::Array {
                    element: Box::new(element),
                }
            }
            "dictionary" => {
                let suggested_keys = obj
                    .get("suggestedKeys")
                    .and_then(|k| k.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|k| k.as_str().map(str::to_owned))
                            .collect()
                    })
                    .unwrap_or_default();
                FieldKind::Dictionary { suggested_keys }
            }
            "record" => {
                let fields_json = obj
                    .get("fields")
                    .ok_or_else(|| SpecError::field(name, "record requires 'fields'"))?;
                let fields = Fields::from_json(fields_json)
                    .map_err(|e| SpecError::field(name, e.to_string()))?;
                FieldKind::Record { fields }
            }
            other => {
                return Err(SpecError::field(
                    name,
                    format!("unknown field type '{}'", other),
                ));
            }
        };

        let operators_json = obj
            .get("operators")
            .and_then(|o| o.as_array())
            .ok_or_else(|| SpecError::field(name, "missing 'operators' list"))?;
        if operators_json.is_empty() {
            return Err(SpecError::field(name, "'operators' must be non-empty"));
        }
        let mut operators = Vec::with_capacity(operators_json.len());
        for op_json in operators_json {
            let symbol = op_json
                .as_str()
                .ok_or_else(|| SpecError::field(name, "operators must be strings"))?;
            let op: Operator = symbol
                .parse()
                .map_err(|e: crate::operator::UnknownOperatorSymbol| {
                    SpecError::field(name, e.to_string())
                })?;
            operators.push(op);
        }

        let label = obj
            .get("label")
            .and_then(|l| l.as_str())
            .unwrap_or("")
            .to_string();
        let mut spec = FieldSpec::new(label, operators, kind);

        for op in &spec.operators {
            if !spec.admissible_operators().contains(op) {
                return Err(SpecError::field(
                    name,
                    format!(
                        "operator {} is not admissible for {} fields",
                        op.symbol(),
                        spec.type_name()
                    ),
                ));
            }
        }

        if let Some(placeholder) = obj.get("placeholder").and_then(|p| p.as_str()) {
            spec.placeholder = Some(placeholder.to_string());
        }
        if let Some(info) = obj.get("operatorInfo").and_then(|i| i.as_object()) {
            for (symbol, label) in info {
                let op: Operator = symbol
                    .parse()
                    .map_err(|e: crate::operator::UnknownOperatorSymbol| {
                        SpecError::field(name, e.to_string())
                    })?;
                let label = label
                    .as_str()
                    .ok_or_else(|| SpecError::field(name, "operatorInfo labels must be strings"))?;
                spec.operator_info.insert(op, label.to_string());
            }
        }

        Ok(spec)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
