//! Wire-format to circuit decoder.
//!
//! Constants are resolved in table order; while entry `i` is being decoded
//! only entries `0..i` exist, which rejects forward and cyclic references.
//! Inline and by-index forms of the same record decode identically. Any
//! failure aborts the whole decode.

use std::collections::BTreeMap;
use std::sync::Arc;

use prost::Message;
use tracing::{debug, instrument, warn};

use qslice_ir::{
    Arg, ArgMap, Circuit, CircuitOperation, CouplerPulse, FrozenCircuit, Gate, InternalGate,
    InternalTag, KeyMap, Moment, NoiseChannel, Operation, QubitId, QubitMap, Repeated,
    Repetitions, Scalar, StandardGate, Tag,
};

use crate::args::{ArgDecoder, StringTable};
use crate::config::DecodingLimits;
use crate::error::{WireError, WireResult};
use crate::proto;
use crate::proto::constant::ConstValue;
use crate::proto::operation::GateValue;

/// A decoded constant-table entry.
enum Resolved {
    String(String),
    Circuit(FrozenCircuit),
    Qubit(QubitId),
    Moment(Moment),
    Operation(Operation),
    /// `None` for a tag kind this decoder does not know.
    Tag(Option<Tag>),
    Unknown,
}

impl Resolved {
    fn kind(&self) -> &'static str {
        match self {
            Resolved::String(_) => "string",
            Resolved::Circuit(_) => "circuit",
            Resolved::Qubit(_) => "qubit",
            Resolved::Moment(_) => "moment",
            Resolved::Operation(_) => "operation",
            Resolved::Tag(_) => "tag",
            Resolved::Unknown => "unknown constant",
        }
    }
}

/// Decodes programs under a set of [`DecodingLimits`].
pub struct Decoder<'l> {
    limits: &'l DecodingLimits,
}

impl<'l> Decoder<'l> {
    /// Create a decoder.
    pub fn new(limits: &'l DecodingLimits) -> Self {
        Self { limits }
    }

    /// Decode a serialized program.
    pub fn decode_bytes(&self, bytes: &[u8]) -> WireResult<Circuit> {
        if bytes.len() > self.limits.max_message_size_bytes {
            return Err(WireError::MessageTooLarge {
                size: bytes.len(),
                max: self.limits.max_message_size_bytes,
            });
        }
        let program = proto::Program::decode(bytes)?;
        self.decode(&program)
    }

    /// Decode a program message.
    #[instrument(skip_all, fields(constants = program.constants.len()))]
    pub fn decode(&self, program: &proto::Program) -> WireResult<Circuit> {
        if let Some(language) = &program.language {
            if !language.gate_set.is_empty() && language.gate_set != proto::GATE_SET {
                warn!(gate_set = %language.gate_set, "unexpected gate set, decoding anyway");
            }
            if !language.arg_function_language.is_empty()
                && language.arg_function_language != proto::ARG_FUNCTION_LANGUAGE
            {
                warn!(
                    language = %language.arg_function_language,
                    "unexpected argument function language, decoding anyway"
                );
            }
        }

        let total = program.constants.len();
        let mut resolved = Vec::with_capacity(total);
        for (at, constant) in program.constants.iter().enumerate() {
            let scope = Scope {
                limits: self.limits,
                resolved: &resolved,
                total,
            };
            let value = scope.constant(constant, at)?;
            resolved.push(value);
        }

        let scope = Scope {
            limits: self.limits,
            resolved: &resolved,
            total,
        };
        let circuit = match &program.program {
            Some(proto::program::Program::Circuit(circuit)) => scope.circuit(circuit)?,
            None => return Err(WireError::MissingField("circuit")),
        };
        debug!(moments = circuit.len(), "decoded program");
        Ok(circuit)
    }
}

/// The constants visible at one point of the decode.
struct Scope<'a> {
    limits: &'a DecodingLimits,
    resolved: &'a [Resolved],
    total: usize,
}

impl StringTable for Scope<'_> {
    fn string(&self, index: i32) -> WireResult<String> {
        match self.get(index)? {
            Resolved::String(s) => Ok(s.clone()),
            _ => Err(WireError::ConstantTypeMismatch {
                index,
                expected: "string",
            }),
        }
    }
}

impl Scope<'_> {
    fn args(&self) -> ArgDecoder<'_> {
        ArgDecoder::new(self.limits.max_arg_depth, self)
    }

    fn get(&self, index: i32) -> WireResult<&Resolved> {
        let i = usize::try_from(index).map_err(|_| WireError::IndexOutOfRange {
            index,
            len: self.total,
        })?;
        if let Some(value) = self.resolved.get(i) {
            return Ok(value);
        }
        if i < self.total {
            return Err(WireError::ForwardReference {
                index,
                at: self.resolved.len(),
            });
        }
        Err(WireError::IndexOutOfRange {
            index,
            len: self.total,
        })
    }

    fn mismatch(index: i32, expected: &'static str, found: &Resolved) -> WireError {
        debug!(index, found = found.kind(), expected, "constant kind mismatch");
        WireError::ConstantTypeMismatch { index, expected }
    }

    fn constant(&self, constant: &proto::Constant, at: usize) -> WireResult<Resolved> {
        Ok(match &constant.const_value {
            Some(ConstValue::StringValue(s)) => Resolved::String(s.clone()),
            Some(ConstValue::CircuitValue(c)) => Resolved::Circuit(Arc::new(self.circuit(c)?)),
            Some(ConstValue::Qubit(q)) => Resolved::Qubit(QubitId::from_proto_id(&q.id)),
            Some(ConstValue::MomentValue(m)) => Resolved::Moment(self.moment(m)?),
            Some(ConstValue::OperationValue(o)) => Resolved::Operation(self.operation(o)?),
            Some(ConstValue::TagValue(t)) => Resolved::Tag(self.tag(t)?),
            None => {
                warn!(index = at, "unrecognized constant type, ignoring");
                Resolved::Unknown
            }
        })
    }

    // =========================================================================
    // Structure
    // =========================================================================

    fn circuit(&self, msg: &proto::Circuit) -> WireResult<Circuit> {
        if !msg.moments.is_empty() && !msg.moment_indices.is_empty() {
            return Err(WireError::MixedMomentForms);
        }
        match proto::circuit::SchedulingStrategy::try_from(msg.scheduling_strategy) {
            Ok(_) => {}
            Err(_) => warn!(
                strategy = msg.scheduling_strategy,
                "unknown scheduling strategy, treating as moment-by-moment"
            ),
        }

        let mut moments = Vec::with_capacity(msg.moments.len() + msg.moment_indices.len());
        for moment in &msg.moments {
            moments.push(self.moment(moment)?);
        }
        for &index in &msg.moment_indices {
            match self.get(index)? {
                Resolved::Moment(moment) => moments.push(moment.clone()),
                other => return Err(Self::mismatch(index, "moment", other)),
            }
        }

        let tags = self.tags(&msg.tag_indices, &msg.tags)?;
        Ok(Circuit::from_moments(moments).with_tags(tags))
    }

    fn moment(&self, msg: &proto::Moment) -> WireResult<Moment> {
        let mut ops = Vec::with_capacity(
            msg.operations.len() + msg.operation_indices.len() + msg.circuit_operations.len(),
        );
        for op in &msg.operations {
            ops.push(self.operation(op)?);
        }
        for &index in &msg.operation_indices {
            match self.get(index)? {
                Resolved::Operation(op) => ops.push(op.clone()),
                other => return Err(Self::mismatch(index, "operation", other)),
            }
        }
        for call in &msg.circuit_operations {
            ops.push(self.circuit_operation(call)?);
        }
        Ok(Moment::from_operations(ops)?)
    }

    fn qubit(&self, index: i32) -> WireResult<QubitId> {
        match self.get(index)? {
            Resolved::Qubit(q) => Ok(q.clone()),
            other => Err(Self::mismatch(index, "qubit", other)),
        }
    }

    fn tags(&self, indices: &[i32], inline: &[proto::Tag]) -> WireResult<Vec<Tag>> {
        let mut tags = Vec::new();
        for &index in indices {
            match self.get(index)? {
                Resolved::Tag(Some(tag)) => tags.push(tag.clone()),
                Resolved::Tag(None) => {}
                other => return Err(Self::mismatch(index, "tag", other)),
            }
        }
        for tag in inline {
            tags.extend(self.tag(tag)?);
        }
        Ok(tags)
    }

    fn operation(&self, msg: &proto::Operation) -> WireResult<Operation> {
        let mut qubits = Vec::with_capacity(msg.qubit_constant_index.len() + msg.qubits.len());
        for &index in &msg.qubit_constant_index {
            qubits.push(self.qubit(index)?);
        }
        qubits.extend(msg.qubits.iter().map(|q| QubitId::from_proto_id(&q.id)));

        let gate = self.gate(msg.gate_value.as_ref(), qubits.len())?;

        // Legacy carriers of tags.
        let mut legacy = Vec::new();
        match &msg.token {
            Some(proto::operation::Token::TokenValue(token)) => legacy.push(Tag::Calibration {
                token: token.clone(),
            }),
            Some(proto::operation::Token::TokenConstantIndex(index)) => {
                legacy.push(Tag::Calibration {
                    token: self.string(*index)?,
                });
            }
            None => {}
        }
        match &msg.gate_value {
            Some(GateValue::Zpowgate(z)) if z.is_physical_z => legacy.push(Tag::PhysicalZ),
            Some(GateValue::Fsimgate(f)) if f.translate_via_model => legacy.push(Tag::FSimViaModel),
            _ => {}
        }

        let args = self.args();
        let conditions = msg
            .conditioned_on
            .iter()
            .map(|c| args.condition(c))
            .collect::<WireResult<Vec<_>>>()?;

        Ok(Operation::new(gate, qubits)?
            .with_tags(self.tags(&msg.tag_indices, &msg.tags)?)
            .with_tags(legacy)
            .with_conditions(conditions))
    }

    fn circuit_operation(&self, msg: &proto::CircuitOperation) -> WireResult<Operation> {
        use proto::circuit_operation::CircuitRef;
        use proto::repetition_specification::RepetitionValue;

        let circuit: FrozenCircuit = match &msg.circuit_ref {
            Some(CircuitRef::CircuitConstantIndex(index)) => match self.get(*index)? {
                Resolved::Circuit(circuit) => Arc::clone(circuit),
                other => return Err(Self::mismatch(*index, "circuit", other)),
            },
            Some(CircuitRef::CircuitValue(circuit)) => Arc::new(self.circuit(circuit)?),
            None => return Err(WireError::MissingField("circuit_ref")),
        };

        let repetitions = match msg
            .repetition_specification
            .as_ref()
            .and_then(|spec| spec.repetition_value.as_ref())
        {
            None => Repetitions::default(),
            Some(RepetitionValue::RepetitionCount(n)) => {
                Repetitions::Count(u32::try_from(*n).map_err(|_| {
                    WireError::InvalidArgument(format!("negative repetition count {n}"))
                })?)
            }
            Some(RepetitionValue::RepetitionIds(ids)) => Repetitions::Ids(ids.ids.clone()),
        };

        let qubit_map = match &msg.qubit_map {
            Some(mapping) => QubitMap::from_pairs(
                mapping
                    .entries
                    .iter()
                    .map(|e| {
                        let key = e.key.as_ref().ok_or(WireError::MissingField("qubit map key"))?;
                        let value =
                            e.value.as_ref().ok_or(WireError::MissingField("qubit map value"))?;
                        Ok((QubitId::from_proto_id(&key.id), QubitId::from_proto_id(&value.id)))
                    })
                    .collect::<WireResult<Vec<_>>>()?,
            )?,
            None => QubitMap::new(),
        };

        let key_map = match &msg.measurement_key_map {
            Some(mapping) => KeyMap::from_pairs(
                mapping
                    .entries
                    .iter()
                    .map(|e| {
                        let key = e.key.as_ref().ok_or(WireError::MissingField("key map key"))?;
                        let value =
                            e.value.as_ref().ok_or(WireError::MissingField("key map value"))?;
                        Ok((key.string_key.clone(), value.string_key.clone()))
                    })
                    .collect::<WireResult<Vec<_>>>()?,
            )?,
            None => KeyMap::new(),
        };

        let args = self.args();
        let arg_map = match &msg.arg_map {
            Some(mapping) => ArgMap::from_pairs(
                mapping
                    .entries
                    .iter()
                    .map(|e| {
                        let symbol = match e.key.as_ref().and_then(|k| k.arg.as_ref()) {
                            Some(proto::arg::Arg::Symbol(s)) => s.clone(),
                            _ => {
                                return Err(WireError::InvalidArgument(
                                    "argument map keys must be symbols".into(),
                                ));
                            }
                        };
                        let value = e.value.as_ref().ok_or(WireError::MissingField("arg map value"))?;
                        Ok((symbol, args.expr(value, 0)?))
                    })
                    .collect::<WireResult<Vec<_>>>()?,
            )?,
            None => ArgMap::new(),
        };

        let mut call = CircuitOperation::new(circuit)
            .with_repetitions(repetitions)?
            .with_use_repetition_ids(msg.use_repetition_ids.unwrap_or(true))
            .with_qubit_map(qubit_map)?
            .with_measurement_key_map(key_map)
            .with_arg_map(arg_map)
            .with_parent_path(msg.parent_path.clone());
        if let Some(condition) = &msg.repeat_until {
            call = call.with_repeat_until(args.condition(condition)?)?;
        }

        let conditions = msg
            .conditioned_on
            .iter()
            .map(|c| args.condition(c))
            .collect::<WireResult<Vec<_>>>()?;

        Ok(Operation::circuit(call)
            .with_tags(self.tags(&msg.tag_indices, &msg.tags)?)
            .with_conditions(conditions))
    }

    // =========================================================================
    // Gates and tags
    // =========================================================================

    fn gate(&self, value: Option<&GateValue>, num_qubits: usize) -> WireResult<Gate> {
        let args = self.args();
        let f = |a: &Option<proto::FloatArg>| args.float_arg(a.as_ref());
        let gate = match value {
            Some(GateValue::Xpowgate(g)) => StandardGate::XPow(f(&g.exponent)?),
            Some(GateValue::Ypowgate(g)) => StandardGate::YPow(f(&g.exponent)?),
            Some(GateValue::Zpowgate(g)) => StandardGate::ZPow(f(&g.exponent)?),
            Some(GateValue::Hpowgate(g)) => StandardGate::HPow(f(&g.exponent)?),
            Some(GateValue::Phasedxpowgate(g)) => StandardGate::PhasedXPow {
                exponent: f(&g.exponent)?,
                phase_exponent: f(&g.phase_exponent)?,
            },
            Some(GateValue::Phasedxzgate(g)) => StandardGate::PhasedXZ {
                x_exponent: f(&g.x_exponent)?,
                z_exponent: f(&g.z_exponent)?,
                axis_phase_exponent: f(&g.axis_phase_exponent)?,
            },
            Some(GateValue::Czpowgate(g)) => StandardGate::CZPow(f(&g.exponent)?),
            Some(GateValue::Iswappowgate(g)) => StandardGate::ISwapPow(f(&g.exponent)?),
            Some(GateValue::Fsimgate(g)) => StandardGate::FSim {
                theta: f(&g.theta)?,
                phi: f(&g.phi)?,
            },
            Some(GateValue::Couplerpulsegate(g)) => StandardGate::CouplerPulse(Box::new(CouplerPulse {
                hold_time_ps: f(&g.hold_time_ps)?,
                rise_time_ps: f(&g.rise_time_ps)?,
                padding_time_ps: f(&g.padding_time_ps)?,
                coupling_mhz: f(&g.coupling_mhz)?,
                q0_detune_mhz: f(&g.q0_detune_mhz)?,
                q1_detune_mhz: f(&g.q1_detune_mhz)?,
            })),
            Some(GateValue::Measurementgate(g)) => {
                let key = g
                    .key
                    .as_ref()
                    .ok_or(WireError::MissingField("measurement key"))?;
                let invert_mask = match &g.invert_mask {
                    None => vec![],
                    Some(mask) => match args.arg(mask, 0)? {
                        Arg::Repeated(Repeated::Bools(bits)) => bits,
                        Arg::Repeated(Repeated::Ints(bits)) => bits.iter().map(|&b| b != 0).collect(),
                        other => {
                            return Err(WireError::InvalidArgument(format!(
                                "invert mask must be booleans, got {other:?}"
                            )));
                        }
                    },
                };
                StandardGate::Measurement {
                    key: args.key(key)?,
                    invert_mask,
                }
            }
            Some(GateValue::Waitgate(g)) => StandardGate::Wait {
                duration_nanos: f(&g.duration_nanos)?,
            },
            Some(GateValue::Resetgate(g)) => {
                let dimension = match g.arguments.get("dimension") {
                    None => 2,
                    Some(a) => match args.arg(a, 0)? {
                        Arg::Scalar(Scalar::Int(d)) => u32::try_from(d).map_err(|_| {
                            WireError::InvalidArgument(format!("reset dimension {d}"))
                        })?,
                        other => {
                            return Err(WireError::InvalidArgument(format!(
                                "reset dimension must be an integer, got {other:?}"
                            )));
                        }
                    },
                };
                StandardGate::Reset { dimension }
            }
            Some(GateValue::Identitygate(_)) => StandardGate::Identity,
            Some(GateValue::Internalgate(g)) => {
                let declared = u32::try_from(g.num_qubits).map_err(|_| {
                    WireError::InvalidArgument(format!("internal gate qubit count {}", g.num_qubits))
                })?;
                return Ok(Gate::Internal(InternalGate {
                    name: g.name.clone(),
                    module: g.module.clone(),
                    num_qubits: declared,
                    args: self.arg_map(&g.gate_args)?,
                }));
            }
            Some(GateValue::Noisechannel(channel)) => {
                use proto::noise_channel::ChannelValue;
                let channel = match &channel.channel_value {
                    Some(ChannelValue::Depolarizingchannel(c)) => NoiseChannel::Depolarizing {
                        p: f(&c.probability)?,
                    },
                    Some(ChannelValue::Randomgatechannel(c)) => {
                        let sub = c
                            .sub_gate
                            .as_ref()
                            .ok_or(WireError::MissingField("random gate sub_gate"))?;
                        NoiseChannel::RandomGate {
                            probability: f(&c.probability)?,
                            sub_gate: Box::new(self.gate(sub.gate_value.as_ref(), num_qubits)?),
                        }
                    }
                    None => {
                        return Err(WireError::UnsupportedVariant(
                            "noise channel of unknown type".into(),
                        ));
                    }
                };
                return Ok(Gate::Noise(channel));
            }
            None => {
                return Err(WireError::UnsupportedVariant(
                    "operation without a recognized gate".into(),
                ));
            }
        };
        Ok(Gate::Standard(gate))
    }

    fn arg_map(&self, map: &BTreeMap<String, proto::Arg>) -> WireResult<BTreeMap<String, Arg>> {
        let args = self.args();
        map.iter()
            .map(|(name, value)| Ok((name.clone(), args.arg(value, 0)?)))
            .collect()
    }

    fn tag(&self, msg: &proto::Tag) -> WireResult<Option<Tag>> {
        use proto::tag::Tag as T;
        Ok(Some(match &msg.tag {
            Some(T::NoSync(t)) => Tag::NoSync {
                forward: t.forward,
                backward: t.backward,
            },
            Some(T::CalibrationTag(t)) => Tag::Calibration {
                token: t.token.clone(),
            },
            Some(T::PhysicalZ(_)) => Tag::PhysicalZ,
            Some(T::FsimViaModel(_)) => Tag::FSimViaModel,
            Some(T::DynamicalDecoupling(t)) => Tag::DynamicalDecoupling {
                protocol: t.protocol.clone(),
            },
            Some(T::InternalTag(t)) => Tag::Internal(InternalTag {
                name: t.tag_name.clone(),
                namespace: t.tag_package.clone(),
                args: self.arg_map(&t.tag_args)?,
            }),
            None => {
                warn!("unknown tag, ignoring");
                return Ok(None);
            }
        }))
    }
}
