//! Protobuf schema of the wire format.
//!
//! Messages are declared with `prost` derives so the crate builds without a
//! protoc toolchain. Field numbers are part of the format and must never be
//! reused.

use std::collections::BTreeMap;

/// Gate set name written into [`Language::gate_set`].
pub const GATE_SET: &str = "v2_5";

/// Legacy argument-function language, written for compatibility.
pub const ARG_FUNCTION_LANGUAGE: &str = "exp";

// =============================================================================
// Program and constant table
// =============================================================================

/// Top-level message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Program {
    /// Legacy language descriptor.
    #[prost(message, optional, tag = "1")]
    pub language: Option<Language>,
    /// The program body.
    #[prost(oneof = "program::Program", tags = "2")]
    pub program: Option<program::Program>,
    /// Values referenced by index from the body and from later constants.
    #[prost(message, repeated, tag = "3")]
    pub constants: Vec<Constant>,
}

/// Nested types of [`Program`].
pub mod program {
    /// The program body.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Program {
        /// A circuit.
        #[prost(message, tag = "2")]
        Circuit(super::Circuit),
    }
}

/// Language descriptor.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Language {
    #[prost(string, tag = "1")]
    pub gate_set: String,
    #[prost(string, tag = "2")]
    pub arg_function_language: String,
}

/// One entry of the constant table.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Constant {
    #[prost(oneof = "constant::ConstValue", tags = "1, 2, 3, 4, 5, 6")]
    pub const_value: Option<constant::ConstValue>,
}

/// Nested types of [`Constant`].
pub mod constant {
    /// The constant's value.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ConstValue {
        #[prost(string, tag = "1")]
        StringValue(String),
        #[prost(message, tag = "2")]
        CircuitValue(super::Circuit),
        #[prost(message, tag = "3")]
        Qubit(super::Qubit),
        #[prost(message, tag = "4")]
        MomentValue(super::Moment),
        #[prost(message, tag = "5")]
        OperationValue(super::Operation),
        #[prost(message, tag = "6")]
        TagValue(super::Tag),
    }
}

// =============================================================================
// Circuits, moments, operations
// =============================================================================

/// A circuit: either inline moments or moment constant indices.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Circuit {
    #[prost(enumeration = "circuit::SchedulingStrategy", tag = "1")]
    pub scheduling_strategy: i32,
    #[prost(message, repeated, tag = "2")]
    pub moments: Vec<Moment>,
    #[prost(int32, repeated, tag = "3")]
    pub moment_indices: Vec<i32>,
    #[prost(int32, repeated, tag = "4")]
    pub tag_indices: Vec<i32>,
    #[prost(message, repeated, tag = "5")]
    pub tags: Vec<Tag>,
}

/// Nested types of [`Circuit`].
pub mod circuit {
    /// How moments are timed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum SchedulingStrategy {
        /// Unset.
        Unspecified = 0,
        /// Each moment lasts as long as its longest operation.
        MomentByMoment = 1,
    }
}

/// A moment.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Moment {
    #[prost(message, repeated, tag = "1")]
    pub operations: Vec<Operation>,
    #[prost(message, repeated, tag = "2")]
    pub circuit_operations: Vec<CircuitOperation>,
    #[prost(int32, repeated, tag = "3")]
    pub operation_indices: Vec<i32>,
}

/// A qubit, by canonical id.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Qubit {
    #[prost(string, tag = "1")]
    pub id: String,
}

/// A gate applied to qubits.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Operation {
    #[prost(
        oneof = "operation::GateValue",
        tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16"
    )]
    pub gate_value: Option<operation::GateValue>,
    #[prost(message, repeated, tag = "20")]
    pub qubits: Vec<Qubit>,
    #[prost(int32, repeated, tag = "21")]
    pub qubit_constant_index: Vec<i32>,
    /// Legacy calibration token.
    #[prost(oneof = "operation::Token", tags = "22, 23")]
    pub token: Option<operation::Token>,
    #[prost(message, repeated, tag = "24")]
    pub tags: Vec<Tag>,
    #[prost(int32, repeated, tag = "25")]
    pub tag_indices: Vec<i32>,
    #[prost(message, repeated, tag = "26")]
    pub conditioned_on: Vec<Arg>,
}

/// Nested types of [`Operation`].
pub mod operation {
    /// The gate.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum GateValue {
        #[prost(message, tag = "1")]
        Xpowgate(super::XPowGate),
        #[prost(message, tag = "2")]
        Ypowgate(super::YPowGate),
        #[prost(message, tag = "3")]
        Zpowgate(super::ZPowGate),
        #[prost(message, tag = "4")]
        Hpowgate(super::HPowGate),
        #[prost(message, tag = "5")]
        Phasedxpowgate(super::PhasedXPowGate),
        #[prost(message, tag = "6")]
        Phasedxzgate(super::PhasedXzGate),
        #[prost(message, tag = "7")]
        Czpowgate(super::CzPowGate),
        #[prost(message, tag = "8")]
        Iswappowgate(super::ISwapPowGate),
        #[prost(message, tag = "9")]
        Fsimgate(super::FSimGate),
        #[prost(message, tag = "10")]
        Couplerpulsegate(super::CouplerPulseGate),
        #[prost(message, tag = "11")]
        Measurementgate(super::MeasurementGate),
        #[prost(message, tag = "12")]
        Waitgate(super::WaitGate),
        #[prost(message, tag = "13")]
        Resetgate(super::ResetGate),
        #[prost(message, tag = "14")]
        Identitygate(super::IdentityGate),
        #[prost(message, tag = "15")]
        Internalgate(super::InternalGate),
        #[prost(message, tag = "16")]
        Noisechannel(super::NoiseChannel),
    }

    /// Legacy calibration token, inline or by string constant.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Token {
        #[prost(string, tag = "22")]
        TokenValue(String),
        #[prost(int32, tag = "23")]
        TokenConstantIndex(i32),
    }
}

// =============================================================================
// Gates
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct XPowGate {
    #[prost(message, optional, tag = "1")]
    pub exponent: Option<FloatArg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct YPowGate {
    #[prost(message, optional, tag = "1")]
    pub exponent: Option<FloatArg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ZPowGate {
    #[prost(message, optional, tag = "1")]
    pub exponent: Option<FloatArg>,
    /// Legacy physical-Z marker.
    #[prost(bool, tag = "2")]
    pub is_physical_z: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HPowGate {
    #[prost(message, optional, tag = "1")]
    pub exponent: Option<FloatArg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PhasedXPowGate {
    #[prost(message, optional, tag = "1")]
    pub phase_exponent: Option<FloatArg>,
    #[prost(message, optional, tag = "2")]
    pub exponent: Option<FloatArg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PhasedXzGate {
    #[prost(message, optional, tag = "1")]
    pub x_exponent: Option<FloatArg>,
    #[prost(message, optional, tag = "2")]
    pub z_exponent: Option<FloatArg>,
    #[prost(message, optional, tag = "3")]
    pub axis_phase_exponent: Option<FloatArg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CzPowGate {
    #[prost(message, optional, tag = "1")]
    pub exponent: Option<FloatArg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ISwapPowGate {
    #[prost(message, optional, tag = "1")]
    pub exponent: Option<FloatArg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FSimGate {
    #[prost(message, optional, tag = "1")]
    pub theta: Option<FloatArg>,
    #[prost(message, optional, tag = "2")]
    pub phi: Option<FloatArg>,
    /// Legacy model-translation marker.
    #[prost(bool, tag = "3")]
    pub translate_via_model: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CouplerPulseGate {
    #[prost(message, optional, tag = "1")]
    pub hold_time_ps: Option<FloatArg>,
    #[prost(message, optional, tag = "2")]
    pub rise_time_ps: Option<FloatArg>,
    #[prost(message, optional, tag = "3")]
    pub padding_time_ps: Option<FloatArg>,
    #[prost(message, optional, tag = "4")]
    pub coupling_mhz: Option<FloatArg>,
    #[prost(message, optional, tag = "5")]
    pub q0_detune_mhz: Option<FloatArg>,
    #[prost(message, optional, tag = "6")]
    pub q1_detune_mhz: Option<FloatArg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeasurementGate {
    /// A measurement key, or a legacy qualified string.
    #[prost(message, optional, tag = "1")]
    pub key: Option<Arg>,
    /// Repeated booleans; absent when empty.
    #[prost(message, optional, tag = "2")]
    pub invert_mask: Option<Arg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WaitGate {
    #[prost(message, optional, tag = "1")]
    pub duration_nanos: Option<FloatArg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResetGate {
    #[prost(btree_map = "string, message", tag = "1")]
    pub arguments: BTreeMap<String, Arg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IdentityGate {
    #[prost(uint32, repeated, tag = "1")]
    pub qid_shape: Vec<u32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InternalGate {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub module: String,
    #[prost(int32, tag = "3")]
    pub num_qubits: i32,
    #[prost(btree_map = "string, message", tag = "4")]
    pub gate_args: BTreeMap<String, Arg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NoiseChannel {
    #[prost(oneof = "noise_channel::ChannelValue", tags = "1, 2")]
    pub channel_value: Option<noise_channel::ChannelValue>,
}

/// Nested types of [`NoiseChannel`].
pub mod noise_channel {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ChannelValue {
        #[prost(message, tag = "1")]
        Depolarizingchannel(super::DepolarizingChannel),
        #[prost(message, tag = "2")]
        Randomgatechannel(super::RandomGateChannel),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DepolarizingChannel {
    #[prost(message, optional, tag = "1")]
    pub probability: Option<FloatArg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RandomGateChannel {
    #[prost(message, optional, tag = "1")]
    pub probability: Option<FloatArg>,
    /// Only the gate of this operation is used.
    #[prost(message, optional, tag = "2")]
    pub sub_gate: Option<Box<Operation>>,
}

// =============================================================================
// Sub-circuit calls
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CircuitOperation {
    #[prost(oneof = "circuit_operation::CircuitRef", tags = "1, 2")]
    pub circuit_ref: Option<circuit_operation::CircuitRef>,
    #[prost(message, optional, tag = "3")]
    pub repetition_specification: Option<RepetitionSpecification>,
    #[prost(message, optional, tag = "4")]
    pub qubit_map: Option<QubitMapping>,
    #[prost(message, optional, tag = "5")]
    pub measurement_key_map: Option<MeasurementKeyMapping>,
    #[prost(message, optional, tag = "6")]
    pub arg_map: Option<ArgMapping>,
    #[prost(message, repeated, tag = "7")]
    pub conditioned_on: Vec<Arg>,
    #[prost(message, optional, tag = "8")]
    pub repeat_until: Option<Arg>,
    #[prost(string, repeated, tag = "9")]
    pub parent_path: Vec<String>,
    /// Absent means true.
    #[prost(bool, optional, tag = "10")]
    pub use_repetition_ids: Option<bool>,
    #[prost(message, repeated, tag = "11")]
    pub tags: Vec<Tag>,
    #[prost(int32, repeated, tag = "12")]
    pub tag_indices: Vec<i32>,
}

/// Nested types of [`CircuitOperation`].
pub mod circuit_operation {
    /// The called circuit, by constant index or inline.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum CircuitRef {
        #[prost(int32, tag = "1")]
        CircuitConstantIndex(i32),
        #[prost(message, tag = "2")]
        CircuitValue(super::Circuit),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RepetitionSpecification {
    #[prost(oneof = "repetition_specification::RepetitionValue", tags = "1, 2")]
    pub repetition_value: Option<repetition_specification::RepetitionValue>,
}

/// Nested types of [`RepetitionSpecification`].
pub mod repetition_specification {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum RepetitionValue {
        #[prost(int32, tag = "1")]
        RepetitionCount(i32),
        #[prost(message, tag = "2")]
        RepetitionIds(super::RepetitionIds),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RepetitionIds {
    #[prost(string, repeated, tag = "1")]
    pub ids: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QubitMapping {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<QubitMappingEntry>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QubitMappingEntry {
    #[prost(message, optional, tag = "1")]
    pub key: Option<Qubit>,
    #[prost(message, optional, tag = "2")]
    pub value: Option<Qubit>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeasurementKeyMapping {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<MeasurementKeyMappingEntry>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeasurementKeyMappingEntry {
    #[prost(message, optional, tag = "1")]
    pub key: Option<MeasurementKey>,
    #[prost(message, optional, tag = "2")]
    pub value: Option<MeasurementKey>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ArgMapping {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<ArgMappingEntry>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ArgMappingEntry {
    /// A symbol.
    #[prost(message, optional, tag = "1")]
    pub key: Option<Arg>,
    #[prost(message, optional, tag = "2")]
    pub value: Option<Arg>,
}

// =============================================================================
// Arguments
// =============================================================================

/// A gate parameter.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FloatArg {
    #[prost(oneof = "float_arg::Arg", tags = "1, 2, 3, 4")]
    pub arg: Option<float_arg::Arg>,
}

/// Nested types of [`FloatArg`].
pub mod float_arg {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Arg {
        /// Accepted on decode only.
        #[prost(float, tag = "1")]
        FloatValue(f32),
        #[prost(double, tag = "2")]
        DoubleValue(f64),
        #[prost(string, tag = "3")]
        Symbol(String),
        #[prost(message, tag = "4")]
        Func(super::ArgFunction),
    }
}

/// A generic argument.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Arg {
    #[prost(oneof = "arg::Arg", tags = "1, 2, 3, 4, 5")]
    pub arg: Option<arg::Arg>,
}

/// Nested types of [`Arg`].
pub mod arg {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Arg {
        #[prost(message, tag = "1")]
        ArgValue(super::ArgValue),
        #[prost(string, tag = "2")]
        Symbol(String),
        #[prost(message, tag = "3")]
        Func(super::ArgFunction),
        #[prost(message, tag = "4")]
        MeasurementKey(super::MeasurementKey),
        /// Index of a string constant.
        #[prost(int32, tag = "5")]
        ConstantIndex(i32),
    }
}

/// Function application over sub-arguments.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ArgFunction {
    #[prost(string, tag = "1")]
    pub r#type: String,
    #[prost(message, repeated, tag = "2")]
    pub args: Vec<Arg>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeasurementKey {
    /// Qualified name, path components joined by `:`.
    #[prost(string, tag = "1")]
    pub string_key: String,
    #[prost(int32, tag = "2")]
    pub index: i32,
}

/// A literal argument value.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ArgValue {
    #[prost(
        oneof = "arg_value::ArgValue",
        tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14"
    )]
    pub arg_value: Option<arg_value::ArgValue>,
}

/// Nested types of [`ArgValue`].
pub mod arg_value {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ArgValue {
        #[prost(float, tag = "1")]
        FloatValue(f32),
        #[prost(double, tag = "2")]
        DoubleValue(f64),
        #[prost(int64, tag = "3")]
        Int64Value(i64),
        #[prost(bool, tag = "4")]
        BoolValue(bool),
        #[prost(string, tag = "5")]
        StringValue(String),
        #[prost(bytes = "vec", tag = "6")]
        BytesValue(Vec<u8>),
        #[prost(message, tag = "7")]
        ComplexValue(super::Complex),
        #[prost(message, tag = "8")]
        RepeatedFloatValues(super::RepeatedFloat),
        #[prost(message, tag = "9")]
        RepeatedDoubleValues(super::RepeatedDouble),
        #[prost(message, tag = "10")]
        RepeatedInt64Values(super::RepeatedInt64),
        #[prost(message, tag = "11")]
        RepeatedBooleanValues(super::RepeatedBoolean),
        #[prost(message, tag = "12")]
        RepeatedStringValues(super::RepeatedString),
        #[prost(message, tag = "13")]
        NdarrayValue(super::NdArray),
        #[prost(message, tag = "14")]
        TupleValue(super::Tuple),
    }
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Complex {
    #[prost(double, tag = "1")]
    pub real_value: f64,
    #[prost(double, tag = "2")]
    pub imaginary_value: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RepeatedFloat {
    #[prost(float, repeated, tag = "1")]
    pub values: Vec<f32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RepeatedDouble {
    #[prost(double, repeated, tag = "1")]
    pub values: Vec<f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RepeatedInt64 {
    #[prost(int64, repeated, tag = "1")]
    pub values: Vec<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RepeatedBoolean {
    #[prost(bool, repeated, tag = "1")]
    pub values: Vec<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RepeatedString {
    #[prost(string, repeated, tag = "1")]
    pub values: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RepeatedComplex {
    #[prost(message, repeated, tag = "1")]
    pub values: Vec<Complex>,
}

/// N-dimensional array in row-major order.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NdArray {
    #[prost(uint64, repeated, tag = "1")]
    pub shape: Vec<u64>,
    #[prost(oneof = "nd_array::Data", tags = "2, 3, 4, 5")]
    pub data: Option<nd_array::Data>,
}

/// Nested types of [`NdArray`].
pub mod nd_array {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Data {
        #[prost(message, tag = "2")]
        Float64Array(super::RepeatedDouble),
        #[prost(message, tag = "3")]
        Int64Array(super::RepeatedInt64),
        #[prost(message, tag = "4")]
        Complex128Array(super::RepeatedComplex),
        #[prost(message, tag = "5")]
        BoolArray(super::RepeatedBoolean),
    }
}

/// Heterogeneous sequence.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Tuple {
    #[prost(enumeration = "tuple::SequenceType", tag = "1")]
    pub sequence_type: i32,
    #[prost(message, repeated, tag = "2")]
    pub values: Vec<Arg>,
}

/// Nested types of [`Tuple`].
pub mod tuple {
    /// Collection the sequence came from.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum SequenceType {
        Unspecified = 0,
        List = 1,
        Tuple = 2,
        Set = 3,
        Frozenset = 4,
    }
}

// =============================================================================
// Tags
// =============================================================================

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Tag {
    #[prost(oneof = "tag::Tag", tags = "1, 2, 3, 4, 5, 6")]
    pub tag: Option<tag::Tag>,
}

/// Nested types of [`Tag`].
pub mod tag {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Tag {
        #[prost(message, tag = "1")]
        NoSync(super::NoSyncTag),
        #[prost(message, tag = "2")]
        CalibrationTag(super::CalibrationTag),
        #[prost(message, tag = "3")]
        PhysicalZ(super::PhysicalZTag),
        #[prost(message, tag = "4")]
        FsimViaModel(super::FSimViaModelTag),
        #[prost(message, tag = "5")]
        DynamicalDecoupling(super::DynamicalDecouplingTag),
        #[prost(message, tag = "6")]
        InternalTag(super::InternalTag),
    }
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct NoSyncTag {
    #[prost(uint32, tag = "1")]
    pub forward: u32,
    #[prost(uint32, tag = "2")]
    pub backward: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CalibrationTag {
    #[prost(string, tag = "1")]
    pub token: String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct PhysicalZTag {}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct FSimViaModelTag {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DynamicalDecouplingTag {
    #[prost(string, tag = "1")]
    pub protocol: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InternalTag {
    #[prost(string, tag = "1")]
    pub tag_name: String,
    #[prost(string, tag = "2")]
    pub tag_package: String,
    #[prost(btree_map = "string, message", tag = "3")]
    pub tag_args: BTreeMap<String, Arg>,
}
