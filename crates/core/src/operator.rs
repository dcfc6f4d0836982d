//! Query operator vocabulary.
//!
//! A closed set of comparison and combinator tags. Which operators are
//! admissible for a field is decided by the field's type family (see
//! `FieldSpec::admissible_operators`); which are offered to the user is
//! decided by the field's declared operator list.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// A comparison or combinator operator tag.
///
/// The wire symbol is the `$`-prefixed form (`$eq`, `$range`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    Eq,
    Ne,
    In,
    Nin,
    All,
    Any,
    Text,
    Gt,
    Gte,
    Lt,
    Lte,
    Range,
}

impl Operator {
    /// Every operator, in display order.
    pub const ALL: [Operator; 12] = [
        Operator::Eq,
        Operator::Ne,
        Operator::In,
        Operator::Nin,
        Operator::All,
        Operator::Any,
        Operator::Text,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Range,
    ];

    /// The `$`-prefixed wire symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::All => "$all",
            Operator::Any => "$any",
            Operator::Text => "$text",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Range => "$range",
        }
    }
}

impl FromStr for Operator {
    type Err = UnknownOperatorSymbol;

    /// Accepts the wire symbol with or without the leading `$`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('$').unwrap_or(s) {
            "eq" => Ok(Operator::Eq),
            "ne" => Ok(Operator::Ne),
            "in" => Ok(Operator::In),
            "nin" => Ok(Operator::Nin),
            "all" => Ok(Operator::All),
            "any" => Ok(Operator::Any),
            "text" => Ok(Operator::Text),
            "gt" => Ok(Operator::Gt),
            "gte" => Ok(Operator::Gte),
            "lt" => Ok(Operator::Lt),
            "lte" => Ok(Operator::Lte),
            "range" => Ok(Operator::Range),
            _ => Err(UnknownOperatorSymbol(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

/// Parse error for an operator symbol outside the closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator symbol '{0}'")]
pub struct UnknownOperatorSymbol(pub String);

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_round_trip() {
        for op in Operator::ALL {
            assert_eq!(op.symbol().parse::<Operator>().unwrap(), op);
        }
    }

    #[test]
    fn parse_without_dollar_prefix() {
        assert_eq!("gte".parse::<Operator>().unwrap(), Operator::Gte);
        assert_eq!("$gte".parse::<Operator>().unwrap(), Operator::Gte);
    }

    #[test]
    fn parse_unknown_symbol() {
        let err = "$between".parse::<Operator>().unwrap_err();
        assert_eq!(err.to_string(), "unknown operator symbol '$between'");
    }

    #[test]
    fn display_matches_symbol() {
        assert_eq!(Operator::Range.to_string(), "$range");
    }
}
