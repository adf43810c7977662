//! Typed argument values for extension gates and tags.

use ndarray::ArrayD;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::mapping::ArgMap;
use crate::parameter::ParameterExpression;

/// A single scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    /// Single-precision float.
    Float(f32),
    /// Double-precision float.
    Double(f64),
    /// Signed integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Complex number.
    Complex(Complex64),
}

/// A homogeneous array of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Repeated {
    /// Single-precision floats.
    Floats(Vec<f32>),
    /// Double-precision floats.
    Doubles(Vec<f64>),
    /// Integers.
    Ints(Vec<i64>),
    /// Booleans.
    Bools(Vec<bool>),
    /// Strings.
    Strings(Vec<String>),
}

/// An N-dimensional numeric array, typed by element kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NdArray {
    /// 64-bit floats.
    Float64(ArrayD<f64>),
    /// 64-bit integers.
    Int64(ArrayD<i64>),
    /// 128-bit complex numbers.
    Complex128(ArrayD<Complex64>),
    /// Booleans.
    Bool(ArrayD<bool>),
}

impl NdArray {
    /// The array shape.
    pub fn shape(&self) -> &[usize] {
        match self {
            NdArray::Float64(a) => a.shape(),
            NdArray::Int64(a) => a.shape(),
            NdArray::Complex128(a) => a.shape(),
            NdArray::Bool(a) => a.shape(),
        }
    }
}

/// The collection kind a heterogeneous sequence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SequenceKind {
    /// Ordered, mutable list.
    #[default]
    List,
    /// Ordered tuple.
    Tuple,
    /// Unordered set.
    Set,
    /// Unordered immutable set.
    FrozenSet,
}

/// A typed argument value.
///
/// `Expr` carries symbols and function applications. A constant expression
/// is the same value as `Scalar(Double)`: the two compare equal, and
/// [`Arg::expr`] and [`Arg::substitute`] produce the scalar form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Arg {
    /// A scalar literal.
    Scalar(Scalar),
    /// A homogeneous array.
    Repeated(Repeated),
    /// An N-dimensional array.
    NdArray(NdArray),
    /// A heterogeneous sequence.
    Sequence {
        /// Origin collection kind.
        kind: SequenceKind,
        /// The elements.
        items: Vec<Arg>,
    },
    /// A symbolic expression.
    Expr(ParameterExpression),
}

impl Arg {
    /// Wrap an expression, normalising constants to doubles.
    pub fn expr(expr: ParameterExpression) -> Self {
        match expr {
            ParameterExpression::Constant(v) => Arg::Scalar(Scalar::Double(v)),
            other => Arg::Expr(other),
        }
    }

    /// Whether the value contains free symbols.
    pub fn is_symbolic(&self) -> bool {
        match self {
            Arg::Expr(e) => e.is_symbolic(),
            Arg::Sequence { items, .. } => items.iter().any(Arg::is_symbolic),
            _ => false,
        }
    }

    /// All free symbols.
    pub fn symbols(&self) -> HashSet<String> {
        let mut set = HashSet::new();
        self.collect_symbols(&mut set);
        set
    }

    fn collect_symbols(&self, set: &mut HashSet<String>) {
        match self {
            Arg::Expr(e) => e.collect_symbols(set),
            Arg::Sequence { items, .. } => items.iter().for_each(|a| a.collect_symbols(set)),
            _ => {}
        }
    }

    /// Apply a symbol substitution.
    pub fn substitute(&self, map: &ArgMap) -> Self {
        match self {
            Arg::Expr(e) => Arg::expr(e.substitute(map)),
            Arg::Sequence { kind, items } => Arg::Sequence {
                kind: *kind,
                items: items.iter().map(|a| a.substitute(map)).collect(),
            },
            other => other.clone(),
        }
    }
}

impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Arg::Expr(ParameterExpression::Constant(a)), Arg::Scalar(Scalar::Double(b)))
            | (Arg::Scalar(Scalar::Double(a)), Arg::Expr(ParameterExpression::Constant(b))) => a == b,
            (Arg::Scalar(a), Arg::Scalar(b)) => a == b,
            (Arg::Repeated(a), Arg::Repeated(b)) => a == b,
            (Arg::NdArray(a), Arg::NdArray(b)) => a == b,
            (
                Arg::Sequence { kind, items },
                Arg::Sequence {
                    kind: other_kind,
                    items: other_items,
                },
            ) => kind == other_kind && items == other_items,
            (Arg::Expr(a), Arg::Expr(b)) => a == b,
            _ => false,
        }
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Scalar(Scalar::Double(v))
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Scalar(Scalar::Int(v))
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Scalar(Scalar::Bool(v))
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Scalar(Scalar::String(v.to_string()))
    }
}

impl From<Complex64> for Arg {
    fn from(v: Complex64) -> Self {
        Arg::Scalar(Scalar::Complex(v))
    }
}

impl From<ParameterExpression> for Arg {
    fn from(e: ParameterExpression) -> Self {
        Arg::expr(e)
    }
}
