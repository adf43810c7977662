//! Classical guard conditions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::qubit::MeasurementKey;

/// Comparison operator of a [`Condition::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Comparison {
    /// Operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }

    /// Parse an operator symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "==" => Comparison::Eq,
            "!=" => Comparison::Ne,
            "<" => Comparison::Lt,
            "<=" => Comparison::Le,
            ">" => Comparison::Gt,
            ">=" => Comparison::Ge,
            _ => return None,
        })
    }
}

/// A condition on classical measurement results.
///
/// The core never evaluates conditions; it only carries them through
/// scheduling, mapping and serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// True when the measurement under the key is non-zero.
    Key(MeasurementKey),
    /// Compares the integer value of a measurement with a constant.
    Compare {
        /// Measurement key.
        key: MeasurementKey,
        /// Comparison operator.
        comparison: Comparison,
        /// Right-hand side.
        value: i64,
    },
}

impl Condition {
    /// The measurement key this condition reads.
    pub fn key(&self) -> &MeasurementKey {
        match self {
            Condition::Key(key) | Condition::Compare { key, .. } => key,
        }
    }

    /// Replace the key, keeping the rest of the condition.
    #[must_use]
    pub fn with_key(&self, key: MeasurementKey) -> Self {
        match self {
            Condition::Key(_) => Condition::Key(key),
            Condition::Compare {
                comparison, value, ..
            } => Condition::Compare {
                key,
                comparison: *comparison,
                value: *value,
            },
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Key(key) => write!(f, "{key}"),
            Condition::Compare {
                key,
                comparison,
                value,
            } => write!(f, "{key} {} {value}", comparison.symbol()),
        }
    }
}
