//! Conversions between IR argument values and their wire form.
//!
//! Expressions are written as function applications over sub-arguments,
//! conditions as a measurement key or a comparison function over a key and
//! an integer. Decoding is bounded by a maximum nesting depth.

use ndarray::{ArrayD, IxDyn};
use num_complex::Complex64;
use tracing::warn;

use qslice_ir::{
    Arg, Comparison, Condition, KEY_PATH_SEPARATOR, MeasurementKey, NdArray, ParameterExpression,
    Repeated, Scalar, SequenceKind,
};

use crate::error::{WireError, WireResult};
use crate::proto;
use crate::proto::arg::Arg as ArgKind;
use crate::proto::arg_value::ArgValue as Value;

const FN_ADD: &str = "add";
const FN_SUB: &str = "sub";
const FN_MUL: &str = "mul";
const FN_DIV: &str = "div";
const FN_POW: &str = "pow";
const FN_NEG: &str = "neg";

/// Interns a string, returning its constant index when it should be
/// referenced instead of inlined.
pub(crate) type StringInterner<'a> = dyn FnMut(&str) -> Option<i32> + 'a;

/// Source of string constants referenced by index.
pub(crate) trait StringTable {
    fn string(&self, index: i32) -> WireResult<String>;
}

fn arg(kind: ArgKind) -> proto::Arg {
    proto::Arg { arg: Some(kind) }
}

fn value(value: Value) -> proto::Arg {
    arg(ArgKind::ArgValue(proto::ArgValue {
        arg_value: Some(value),
    }))
}

fn function(name: &str, args: Vec<proto::Arg>) -> proto::ArgFunction {
    proto::ArgFunction {
        r#type: name.to_string(),
        args,
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Gate parameter.
pub(crate) fn float_arg(expr: &ParameterExpression) -> proto::FloatArg {
    use proto::float_arg::Arg as F;
    let arg = match expr {
        ParameterExpression::Constant(v) => Some(F::DoubleValue(*v)),
        ParameterExpression::Symbol(name) => Some(F::Symbol(name.clone())),
        other => expr_function(other).map(F::Func),
    };
    proto::FloatArg { arg }
}

/// Expression as a generic argument.
pub(crate) fn expr_arg(expr: &ParameterExpression) -> proto::Arg {
    match expr {
        ParameterExpression::Constant(v) => value(Value::DoubleValue(*v)),
        ParameterExpression::Symbol(name) => arg(ArgKind::Symbol(name.clone())),
        other => proto::Arg {
            arg: expr_function(other).map(ArgKind::Func),
        },
    }
}

/// Function form of a composite expression; `None` for leaves.
fn expr_function(expr: &ParameterExpression) -> Option<proto::ArgFunction> {
    let binary = |name: &str, a: &ParameterExpression, b: &ParameterExpression| {
        Some(function(name, vec![expr_arg(a), expr_arg(b)]))
    };
    match expr {
        ParameterExpression::Neg(a) => Some(function(FN_NEG, vec![expr_arg(a)])),
        ParameterExpression::Add(a, b) => binary(FN_ADD, a, b),
        ParameterExpression::Sub(a, b) => binary(FN_SUB, a, b),
        ParameterExpression::Mul(a, b) => binary(FN_MUL, a, b),
        ParameterExpression::Div(a, b) => binary(FN_DIV, a, b),
        ParameterExpression::Pow(a, b) => binary(FN_POW, a, b),
        ParameterExpression::Constant(_) | ParameterExpression::Symbol(_) => None,
    }
}

/// Escapes a separator or escape character inside one path segment.
const KEY_ESCAPE: char = '\\';

/// Qualified `"outer:inner:name"` string. Separators inside a segment are
/// escaped so that only scope boundaries split on decode; keys without `:`
/// or `\` are written unchanged.
pub(crate) fn qualified_key(key: &MeasurementKey) -> String {
    let mut out = String::new();
    for (i, segment) in key.path.iter().chain(std::iter::once(&key.name)).enumerate() {
        if i > 0 {
            out.push(KEY_PATH_SEPARATOR);
        }
        for c in segment.chars() {
            if c == KEY_PATH_SEPARATOR || c == KEY_ESCAPE {
                out.push(KEY_ESCAPE);
            }
            out.push(c);
        }
    }
    out
}

/// Inverse of [`qualified_key`]. A trailing lone escape is kept literally.
pub(crate) fn parse_key(qualified: &str) -> MeasurementKey {
    let mut path = Vec::new();
    let mut segment = String::new();
    let mut chars = qualified.chars();
    while let Some(c) = chars.next() {
        match c {
            KEY_ESCAPE => segment.push(chars.next().unwrap_or(KEY_ESCAPE)),
            KEY_PATH_SEPARATOR => path.push(std::mem::take(&mut segment)),
            c => segment.push(c),
        }
    }
    MeasurementKey::new(segment).with_path(path)
}

pub(crate) fn key_message(key: &MeasurementKey) -> proto::MeasurementKey {
    proto::MeasurementKey {
        string_key: qualified_key(key),
        index: key.index,
    }
}

pub(crate) fn key_arg(key: &MeasurementKey) -> proto::Arg {
    arg(ArgKind::MeasurementKey(key_message(key)))
}

pub(crate) fn condition_arg(condition: &Condition) -> proto::Arg {
    match condition {
        Condition::Key(key) => key_arg(key),
        Condition::Compare {
            key,
            comparison,
            value: rhs,
        } => arg(ArgKind::Func(function(
            comparison.symbol(),
            vec![key_arg(key), value(Value::Int64Value(*rhs))],
        ))),
    }
}

pub(crate) fn sequence_type(kind: SequenceKind) -> proto::tuple::SequenceType {
    use proto::tuple::SequenceType;
    match kind {
        SequenceKind::List => SequenceType::List,
        SequenceKind::Tuple => SequenceType::Tuple,
        SequenceKind::Set => SequenceType::Set,
        SequenceKind::FrozenSet => SequenceType::Frozenset,
    }
}

fn nd_array(array: &NdArray) -> proto::NdArray {
    use proto::nd_array::Data;
    let shape = array.shape().iter().map(|&d| d as u64).collect();
    let data = match array {
        NdArray::Float64(a) => Data::Float64Array(proto::RepeatedDouble {
            values: a.iter().copied().collect(),
        }),
        NdArray::Int64(a) => Data::Int64Array(proto::RepeatedInt64 {
            values: a.iter().copied().collect(),
        }),
        NdArray::Complex128(a) => Data::Complex128Array(proto::RepeatedComplex {
            values: a
                .iter()
                .map(|c| proto::Complex {
                    real_value: c.re,
                    imaginary_value: c.im,
                })
                .collect(),
        }),
        NdArray::Bool(a) => Data::BoolArray(proto::RepeatedBoolean {
            values: a.iter().copied().collect(),
        }),
    };
    proto::NdArray {
        shape,
        data: Some(data),
    }
}

/// Generic argument. Long strings go through `intern`.
pub(crate) fn value_arg(a: &Arg, intern: &mut StringInterner<'_>) -> proto::Arg {
    match a {
        Arg::Scalar(scalar) => match scalar {
            Scalar::Float(v) => value(Value::FloatValue(*v)),
            Scalar::Double(v) => value(Value::DoubleValue(*v)),
            Scalar::Int(v) => value(Value::Int64Value(*v)),
            Scalar::Bool(v) => value(Value::BoolValue(*v)),
            Scalar::String(s) => match intern(s) {
                Some(index) => arg(ArgKind::ConstantIndex(index)),
                None => value(Value::StringValue(s.clone())),
            },
            Scalar::Bytes(b) => value(Value::BytesValue(b.clone())),
            Scalar::Complex(c) => value(Value::ComplexValue(proto::Complex {
                real_value: c.re,
                imaginary_value: c.im,
            })),
        },
        Arg::Repeated(repeated) => value(match repeated {
            Repeated::Floats(v) => Value::RepeatedFloatValues(proto::RepeatedFloat { values: v.clone() }),
            Repeated::Doubles(v) => {
                Value::RepeatedDoubleValues(proto::RepeatedDouble { values: v.clone() })
            }
            Repeated::Ints(v) => Value::RepeatedInt64Values(proto::RepeatedInt64 { values: v.clone() }),
            Repeated::Bools(v) => {
                Value::RepeatedBooleanValues(proto::RepeatedBoolean { values: v.clone() })
            }
            Repeated::Strings(v) => {
                Value::RepeatedStringValues(proto::RepeatedString { values: v.clone() })
            }
        }),
        Arg::NdArray(array) => value(Value::NdarrayValue(nd_array(array))),
        Arg::Sequence { kind, items } => value(Value::TupleValue(proto::Tuple {
            sequence_type: sequence_type(*kind) as i32,
            values: items.iter().map(|item| value_arg(item, intern)).collect(),
        })),
        Arg::Expr(expr) => expr_arg(expr),
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decodes arguments, resolving string constants and bounding recursion.
pub(crate) struct ArgDecoder<'a> {
    max_depth: usize,
    strings: &'a dyn StringTable,
}

impl<'a> ArgDecoder<'a> {
    pub(crate) fn new(max_depth: usize, strings: &'a dyn StringTable) -> Self {
        Self { max_depth, strings }
    }

    fn enter(&self, depth: usize) -> WireResult<usize> {
        if depth >= self.max_depth {
            return Err(WireError::ArgumentTooDeep {
                max: self.max_depth,
            });
        }
        Ok(depth + 1)
    }

    /// Gate parameter. An absent parameter reads as zero.
    pub(crate) fn float_arg(&self, msg: Option<&proto::FloatArg>) -> WireResult<ParameterExpression> {
        use proto::float_arg::Arg as F;
        match msg.and_then(|m| m.arg.as_ref()) {
            None => Ok(ParameterExpression::Constant(0.0)),
            Some(F::FloatValue(v)) => Ok(ParameterExpression::Constant(f64::from(*v))),
            Some(F::DoubleValue(v)) => Ok(ParameterExpression::Constant(*v)),
            Some(F::Symbol(name)) => Ok(ParameterExpression::Symbol(name.clone())),
            Some(F::Func(func)) => self.function_expr(func, 1),
        }
    }

    /// Numeric or symbolic expression.
    pub(crate) fn expr(&self, msg: &proto::Arg, depth: usize) -> WireResult<ParameterExpression> {
        let depth = self.enter(depth)?;
        match msg.arg.as_ref() {
            Some(ArgKind::Symbol(name)) => Ok(ParameterExpression::Symbol(name.clone())),
            Some(ArgKind::Func(func)) => self.function_expr(func, depth),
            Some(ArgKind::ArgValue(v)) => match v.arg_value.as_ref() {
                Some(Value::FloatValue(x)) => Ok(ParameterExpression::Constant(f64::from(*x))),
                Some(Value::DoubleValue(x)) => Ok(ParameterExpression::Constant(*x)),
                Some(Value::Int64Value(x)) => Ok(ParameterExpression::Constant(*x as f64)),
                _ => Err(WireError::InvalidArgument(
                    "expected a numeric value in an expression".into(),
                )),
            },
            _ => Err(WireError::InvalidArgument(
                "expected a number, symbol or function".into(),
            )),
        }
    }

    fn function_expr(&self, func: &proto::ArgFunction, depth: usize) -> WireResult<ParameterExpression> {
        let depth = self.enter(depth)?;
        let operands = func
            .args
            .iter()
            .map(|a| self.expr(a, depth))
            .collect::<WireResult<Vec<_>>>()?;
        let name = func.r#type.as_str();
        match (name, operands.as_slice()) {
            (FN_NEG, [a]) => Ok(ParameterExpression::Neg(Box::new(a.clone()))),
            (FN_ADD | FN_SUB | FN_MUL | FN_DIV | FN_POW, [a, b]) => {
                let (a, b) = (Box::new(a.clone()), Box::new(b.clone()));
                Ok(match name {
                    FN_ADD => ParameterExpression::Add(a, b),
                    FN_SUB => ParameterExpression::Sub(a, b),
                    FN_MUL => ParameterExpression::Mul(a, b),
                    FN_DIV => ParameterExpression::Div(a, b),
                    _ => ParameterExpression::Pow(a, b),
                })
            }
            (FN_NEG | FN_ADD | FN_SUB | FN_MUL | FN_DIV | FN_POW, _) => Err(
                WireError::InvalidArgument(format!(
                    "function '{name}' called with {} arguments",
                    operands.len()
                )),
            ),
            _ => Err(WireError::UnsupportedVariant(format!(
                "argument function '{name}'"
            ))),
        }
    }

    /// Measurement key, as a key message or a legacy qualified string.
    pub(crate) fn key(&self, msg: &proto::Arg) -> WireResult<MeasurementKey> {
        match msg.arg.as_ref() {
            Some(ArgKind::MeasurementKey(key)) => {
                Ok(parse_key(&key.string_key).with_index(key.index))
            }
            Some(ArgKind::ArgValue(proto::ArgValue {
                arg_value: Some(Value::StringValue(s)),
            })) => Ok(parse_key(s)),
            Some(ArgKind::ConstantIndex(index)) => Ok(parse_key(&self.strings.string(*index)?)),
            _ => Err(WireError::InvalidArgument("expected a measurement key".into())),
        }
    }

    pub(crate) fn condition(&self, msg: &proto::Arg) -> WireResult<Condition> {
        let Some(ArgKind::Func(func)) = msg.arg.as_ref() else {
            return Ok(Condition::Key(self.key(msg)?));
        };
        let comparison = Comparison::from_symbol(&func.r#type).ok_or_else(|| {
            WireError::UnsupportedVariant(format!("condition function '{}'", func.r#type))
        })?;
        let [lhs, rhs] = func.args.as_slice() else {
            return Err(WireError::InvalidArgument(format!(
                "comparison '{}' needs two arguments",
                func.r#type
            )));
        };
        let rhs = match self.arg(rhs, 1)? {
            Arg::Scalar(Scalar::Int(v)) => v,
            other => {
                return Err(WireError::InvalidArgument(format!(
                    "comparison value must be an integer, got {other:?}"
                )));
            }
        };
        Ok(Condition::Compare {
            key: self.key(lhs)?,
            comparison,
            value: rhs,
        })
    }

    /// Generic argument.
    pub(crate) fn arg(&self, msg: &proto::Arg, depth: usize) -> WireResult<Arg> {
        match msg.arg.as_ref() {
            Some(ArgKind::ArgValue(v)) => self.value(v, depth),
            Some(ArgKind::ConstantIndex(index)) => {
                Ok(Arg::Scalar(Scalar::String(self.strings.string(*index)?)))
            }
            Some(ArgKind::Symbol(_) | ArgKind::Func(_)) => Ok(Arg::expr(self.expr(msg, depth)?)),
            Some(ArgKind::MeasurementKey(key)) => {
                warn!(
                    key = %key.string_key,
                    index = key.index,
                    "measurement key in a generic argument read as its string"
                );
                Ok(Arg::Scalar(Scalar::String(key.string_key.clone())))
            }
            None => Err(WireError::MissingField("arg")),
        }
    }

    fn value(&self, msg: &proto::ArgValue, depth: usize) -> WireResult<Arg> {
        let depth = self.enter(depth)?;
        let Some(v) = msg.arg_value.as_ref() else {
            return Err(WireError::MissingField("arg_value"));
        };
        Ok(match v {
            Value::FloatValue(x) => Arg::Scalar(Scalar::Float(*x)),
            Value::DoubleValue(x) => Arg::Scalar(Scalar::Double(*x)),
            Value::Int64Value(x) => Arg::Scalar(Scalar::Int(*x)),
            Value::BoolValue(x) => Arg::Scalar(Scalar::Bool(*x)),
            Value::StringValue(s) => Arg::Scalar(Scalar::String(s.clone())),
            Value::BytesValue(b) => Arg::Scalar(Scalar::Bytes(b.clone())),
            Value::ComplexValue(c) => {
                Arg::Scalar(Scalar::Complex(Complex64::new(c.real_value, c.imaginary_value)))
            }
            Value::RepeatedFloatValues(r) => Arg::Repeated(Repeated::Floats(r.values.clone())),
            Value::RepeatedDoubleValues(r) => Arg::Repeated(Repeated::Doubles(r.values.clone())),
            Value::RepeatedInt64Values(r) => Arg::Repeated(Repeated::Ints(r.values.clone())),
            Value::RepeatedBooleanValues(r) => Arg::Repeated(Repeated::Bools(r.values.clone())),
            Value::RepeatedStringValues(r) => Arg::Repeated(Repeated::Strings(r.values.clone())),
            Value::NdarrayValue(array) => Arg::NdArray(nd_array_from_proto(array)?),
            Value::TupleValue(tuple) => Arg::Sequence {
                kind: sequence_kind(tuple.sequence_type),
                items: tuple
                    .values
                    .iter()
                    .map(|item| self.arg(item, depth))
                    .collect::<WireResult<Vec<_>>>()?,
            },
        })
    }
}

fn sequence_kind(raw: i32) -> SequenceKind {
    use proto::tuple::SequenceType;
    match SequenceType::try_from(raw) {
        Ok(SequenceType::Tuple) => SequenceKind::Tuple,
        Ok(SequenceType::Set) => SequenceKind::Set,
        Ok(SequenceType::Frozenset) => SequenceKind::FrozenSet,
        _ => SequenceKind::List,
    }
}

fn nd_array_from_proto(msg: &proto::NdArray) -> WireResult<NdArray> {
    use proto::nd_array::Data;
    let shape: Vec<usize> = msg.shape.iter().map(|&d| d as usize).collect();
    let shape_err = |e: ndarray::ShapeError| WireError::InvalidArgument(format!("ndarray: {e}"));
    let array = match msg.data.as_ref() {
        Some(Data::Float64Array(d)) => {
            NdArray::Float64(ArrayD::from_shape_vec(IxDyn(&shape), d.values.clone()).map_err(shape_err)?)
        }
        Some(Data::Int64Array(d)) => {
            NdArray::Int64(ArrayD::from_shape_vec(IxDyn(&shape), d.values.clone()).map_err(shape_err)?)
        }
        Some(Data::Complex128Array(d)) => {
            let values = d
                .values
                .iter()
                .map(|c| Complex64::new(c.real_value, c.imaginary_value))
                .collect();
            NdArray::Complex128(ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(shape_err)?)
        }
        Some(Data::BoolArray(d)) => {
            NdArray::Bool(ArrayD::from_shape_vec(IxDyn(&shape), d.values.clone()).map_err(shape_err)?)
        }
        None => return Err(WireError::MissingField("ndarray data")),
    };
    Ok(array)
}
