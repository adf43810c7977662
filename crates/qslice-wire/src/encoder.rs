//! Circuit to wire-format encoder.
//!
//! Values are appended to the constant table after everything they
//! reference, so every index points backwards. Entries are deduplicated by
//! their encoded bytes: equal content is written once however many times it
//! is referenced.

use std::collections::BTreeMap;
use std::sync::Arc;

use prost::Message;
use rustc_hash::FxHashMap;
use tracing::{debug, instrument, trace};

use qslice_ir::{
    Arg, Circuit, CircuitOperation, Gate, MeasurementKey, Moment, NoiseChannel, Operation,
    OperationKind, ParameterExpression, QubitId, Repeated, Repetitions, StandardGate, Tag,
};

use crate::args;
use crate::config::EncodingPolicy;
use crate::proto;
use crate::proto::constant::ConstValue;
use crate::proto::operation::GateValue;

/// Builds one [`proto::Program`]. One encoder per encode call.
pub struct Encoder<'p> {
    policy: &'p EncodingPolicy,
    constants: Vec<proto::Constant>,
    index: FxHashMap<Vec<u8>, i32>,
    /// Constant index of each frozen circuit already written, by address.
    circuits: FxHashMap<usize, i32>,
}

impl<'p> Encoder<'p> {
    /// Create an encoder following `policy`.
    pub fn new(policy: &'p EncodingPolicy) -> Self {
        Self {
            policy,
            constants: Vec::new(),
            index: FxHashMap::default(),
            circuits: FxHashMap::default(),
        }
    }

    /// Encode `circuit` as a program.
    #[instrument(skip_all, fields(moments = circuit.len()))]
    pub fn encode(mut self, circuit: &Circuit) -> proto::Program {
        let body = self.circuit(circuit);
        debug!(constants = self.constants.len(), "encoded program");
        proto::Program {
            language: Some(proto::Language {
                gate_set: proto::GATE_SET.to_string(),
                arg_function_language: proto::ARG_FUNCTION_LANGUAGE.to_string(),
            }),
            program: Some(proto::program::Program::Circuit(body)),
            constants: self.constants,
        }
    }

    // =========================================================================
    // Constant table
    // =========================================================================

    fn intern(&mut self, value: ConstValue) -> i32 {
        let constant = proto::Constant {
            const_value: Some(value),
        };
        let bytes = constant.encode_to_vec();
        if let Some(&index) = self.index.get(&bytes) {
            trace!(index, "constant reused");
            return index;
        }
        let index = self.constants.len() as i32;
        self.constants.push(constant);
        self.index.insert(bytes, index);
        index
    }

    fn intern_string(&mut self, s: &str) -> Option<i32> {
        if self.policy.interns_string(s) {
            Some(self.intern(ConstValue::StringValue(s.to_string())))
        } else {
            None
        }
    }

    // =========================================================================
    // Structure
    // =========================================================================

    fn circuit(&mut self, circuit: &Circuit) -> proto::Circuit {
        let mut msg = proto::Circuit {
            scheduling_strategy: proto::circuit::SchedulingStrategy::MomentByMoment as i32,
            ..Default::default()
        };
        for moment in circuit.moments() {
            let moment = self.moment(moment);
            if self.policy.intern_moments {
                let index = self.intern(ConstValue::MomentValue(moment));
                msg.moment_indices.push(index);
            } else {
                msg.moments.push(moment);
            }
        }
        for tag in circuit.tags() {
            self.tag_into(tag, &mut msg.tags, &mut msg.tag_indices);
        }
        msg
    }

    fn moment(&mut self, moment: &Moment) -> proto::Moment {
        let mut msg = proto::Moment::default();
        for op in moment.operations() {
            match op.kind() {
                OperationKind::Circuit(call) => {
                    let call = self.circuit_operation(call, op);
                    msg.circuit_operations.push(call);
                }
                OperationKind::Gate(gate) => {
                    let encoded = self.operation(op, gate);
                    if self.policy.intern_operations {
                        let index = self.intern(ConstValue::OperationValue(encoded));
                        msg.operation_indices.push(index);
                    } else {
                        msg.operations.push(encoded);
                    }
                }
            }
        }
        msg
    }

    fn operation(&mut self, op: &Operation, gate: &Gate) -> proto::Operation {
        let mut msg = proto::Operation {
            gate_value: Some(self.gate(gate, op.qubits().len())),
            conditioned_on: op.conditions().iter().map(args::condition_arg).collect(),
            ..Default::default()
        };
        for qubit in op.qubits() {
            if self.policy.intern_qubits {
                let index = self.intern(ConstValue::Qubit(qubit_message(qubit)));
                msg.qubit_constant_index.push(index);
            } else {
                msg.qubits.push(qubit_message(qubit));
            }
        }
        for tag in op.tags() {
            self.tag_into(tag, &mut msg.tags, &mut msg.tag_indices);
        }
        msg
    }

    fn circuit_operation(&mut self, call: &CircuitOperation, op: &Operation) -> proto::CircuitOperation {
        use proto::circuit_operation::CircuitRef;
        use proto::repetition_specification::RepetitionValue;

        let circuit_ref = if self.policy.intern_circuits {
            let address = Arc::as_ptr(call.circuit()) as usize;
            let index = match self.circuits.get(&address) {
                Some(&index) => index,
                None => {
                    let body = self.circuit(call.circuit());
                    let index = self.intern(ConstValue::CircuitValue(body));
                    self.circuits.insert(address, index);
                    index
                }
            };
            CircuitRef::CircuitConstantIndex(index)
        } else {
            CircuitRef::CircuitValue(self.circuit(call.circuit()))
        };

        let repetition_value = match call.repetitions() {
            // Counts are capped at i32::MAX when the call is built.
            Repetitions::Count(n) => {
                RepetitionValue::RepetitionCount(i32::try_from(*n).unwrap_or(i32::MAX))
            }
            Repetitions::Ids(ids) => {
                RepetitionValue::RepetitionIds(proto::RepetitionIds { ids: ids.clone() })
            }
        };

        let qubit_map = (!call.qubit_map().is_empty()).then(|| proto::QubitMapping {
            entries: call
                .qubit_map()
                .iter()
                .map(|(k, v)| proto::QubitMappingEntry {
                    key: Some(qubit_message(k)),
                    value: Some(qubit_message(v)),
                })
                .collect(),
        });

        let name_message = |name: &str| proto::MeasurementKey {
            string_key: name.to_string(),
            index: MeasurementKey::MOST_RECENT,
        };
        let measurement_key_map =
            (!call.measurement_key_map().is_empty()).then(|| proto::MeasurementKeyMapping {
                entries: call
                    .measurement_key_map()
                    .iter()
                    .map(|(k, v)| proto::MeasurementKeyMappingEntry {
                        key: Some(name_message(k.as_str())),
                        value: Some(name_message(v.as_str())),
                    })
                    .collect(),
            });

        let arg_map = (!call.arg_map().is_empty()).then(|| proto::ArgMapping {
            entries: call
                .arg_map()
                .iter()
                .map(|(symbol, value)| proto::ArgMappingEntry {
                    key: Some(proto::Arg {
                        arg: Some(proto::arg::Arg::Symbol(symbol.clone())),
                    }),
                    value: Some(args::expr_arg(value)),
                })
                .collect(),
        });

        let mut msg = proto::CircuitOperation {
            circuit_ref: Some(circuit_ref),
            repetition_specification: Some(proto::RepetitionSpecification {
                repetition_value: Some(repetition_value),
            }),
            qubit_map,
            measurement_key_map,
            arg_map,
            conditioned_on: op.conditions().iter().map(args::condition_arg).collect(),
            repeat_until: call.repeat_until().map(args::condition_arg),
            parent_path: call.parent_path().to_vec(),
            use_repetition_ids: (!call.use_repetition_ids()).then_some(false),
            ..Default::default()
        };
        for tag in op.tags() {
            self.tag_into(tag, &mut msg.tags, &mut msg.tag_indices);
        }
        msg
    }

    // =========================================================================
    // Gates, tags, arguments
    // =========================================================================

    fn gate(&mut self, gate: &Gate, num_qubits: usize) -> GateValue {
        match gate {
            Gate::Standard(standard) => standard_gate(standard, num_qubits),
            Gate::Internal(internal) => GateValue::Internalgate(proto::InternalGate {
                name: internal.name.clone(),
                module: internal.module.clone(),
                num_qubits: i32::try_from(internal.num_qubits).unwrap_or(i32::MAX),
                gate_args: self.arg_map(&internal.args),
            }),
            Gate::Noise(channel) => {
                use proto::noise_channel::ChannelValue;
                let channel_value = match channel {
                    NoiseChannel::Depolarizing { p } => {
                        ChannelValue::Depolarizingchannel(proto::DepolarizingChannel {
                            probability: Some(args::float_arg(p)),
                        })
                    }
                    NoiseChannel::RandomGate {
                        probability,
                        sub_gate,
                    } => ChannelValue::Randomgatechannel(proto::RandomGateChannel {
                        probability: Some(args::float_arg(probability)),
                        sub_gate: Some(Box::new(proto::Operation {
                            gate_value: Some(self.gate(sub_gate, num_qubits)),
                            ..Default::default()
                        })),
                    }),
                };
                GateValue::Noisechannel(proto::NoiseChannel {
                    channel_value: Some(channel_value),
                })
            }
        }
    }

    fn tag_into(&mut self, tag: &Tag, tags: &mut Vec<proto::Tag>, indices: &mut Vec<i32>) {
        let msg = self.tag(tag);
        if self.policy.intern_tags {
            indices.push(self.intern(ConstValue::TagValue(msg)));
        } else {
            tags.push(msg);
        }
    }

    fn tag(&mut self, tag: &Tag) -> proto::Tag {
        use proto::tag::Tag as T;
        let tag = match tag {
            Tag::NoSync { forward, backward } => T::NoSync(proto::NoSyncTag {
                forward: *forward,
                backward: *backward,
            }),
            Tag::Calibration { token } => T::CalibrationTag(proto::CalibrationTag {
                token: token.clone(),
            }),
            Tag::PhysicalZ => T::PhysicalZ(proto::PhysicalZTag {}),
            Tag::FSimViaModel => T::FsimViaModel(proto::FSimViaModelTag {}),
            Tag::DynamicalDecoupling { protocol } => {
                T::DynamicalDecoupling(proto::DynamicalDecouplingTag {
                    protocol: protocol.clone(),
                })
            }
            Tag::Internal(internal) => T::InternalTag(proto::InternalTag {
                tag_name: internal.name.clone(),
                tag_package: internal.namespace.clone(),
                tag_args: self.arg_map(&internal.args),
            }),
        };
        proto::Tag { tag: Some(tag) }
    }

    fn arg_map(&mut self, map: &BTreeMap<String, Arg>) -> BTreeMap<String, proto::Arg> {
        map.iter()
            .map(|(name, value)| {
                let value = args::value_arg(value, &mut |s: &str| self.intern_string(s));
                (name.clone(), value)
            })
            .collect()
    }
}

fn no_interning(_: &str) -> Option<i32> {
    None
}

fn qubit_message(qubit: &QubitId) -> proto::Qubit {
    proto::Qubit {
        id: qubit.proto_id(),
    }
}

fn standard_gate(gate: &StandardGate, num_qubits: usize) -> GateValue {
    let f = |e: &ParameterExpression| Some(args::float_arg(e));
    match gate {
        StandardGate::XPow(e) => GateValue::Xpowgate(proto::XPowGate { exponent: f(e) }),
        StandardGate::YPow(e) => GateValue::Ypowgate(proto::YPowGate { exponent: f(e) }),
        StandardGate::ZPow(e) => GateValue::Zpowgate(proto::ZPowGate {
            exponent: f(e),
            is_physical_z: false,
        }),
        StandardGate::HPow(e) => GateValue::Hpowgate(proto::HPowGate { exponent: f(e) }),
        StandardGate::PhasedXPow {
            exponent,
            phase_exponent,
        } => GateValue::Phasedxpowgate(proto::PhasedXPowGate {
            phase_exponent: f(phase_exponent),
            exponent: f(exponent),
        }),
        StandardGate::PhasedXZ {
            x_exponent,
            z_exponent,
            axis_phase_exponent,
        } => GateValue::Phasedxzgate(proto::PhasedXzGate {
            x_exponent: f(x_exponent),
            z_exponent: f(z_exponent),
            axis_phase_exponent: f(axis_phase_exponent),
        }),
        StandardGate::CZPow(e) => GateValue::Czpowgate(proto::CzPowGate { exponent: f(e) }),
        StandardGate::ISwapPow(e) => {
            GateValue::Iswappowgate(proto::ISwapPowGate { exponent: f(e) })
        }
        StandardGate::FSim { theta, phi } => GateValue::Fsimgate(proto::FSimGate {
            theta: f(theta),
            phi: f(phi),
            translate_via_model: false,
        }),
        StandardGate::CouplerPulse(pulse) => GateValue::Couplerpulsegate(proto::CouplerPulseGate {
            hold_time_ps: f(&pulse.hold_time_ps),
            rise_time_ps: f(&pulse.rise_time_ps),
            padding_time_ps: f(&pulse.padding_time_ps),
            coupling_mhz: f(&pulse.coupling_mhz),
            q0_detune_mhz: f(&pulse.q0_detune_mhz),
            q1_detune_mhz: f(&pulse.q1_detune_mhz),
        }),
        StandardGate::Measurement { key, invert_mask } => {
            let invert_mask = (!invert_mask.is_empty()).then(|| {
                args::value_arg(
                    &Arg::Repeated(Repeated::Bools(invert_mask.clone())),
                    &mut no_interning,
                )
            });
            GateValue::Measurementgate(proto::MeasurementGate {
                key: Some(args::key_arg(key)),
                invert_mask,
            })
        }
        StandardGate::Wait { duration_nanos } => GateValue::Waitgate(proto::WaitGate {
            duration_nanos: f(duration_nanos),
        }),
        StandardGate::Reset { dimension } => {
            let dimension = Arg::from(i64::from(*dimension));
            GateValue::Resetgate(proto::ResetGate {
                arguments: BTreeMap::from([(
                    "dimension".to_string(),
                    args::value_arg(&dimension, &mut no_interning),
                )]),
            })
        }
        StandardGate::Identity => GateValue::Identitygate(proto::IdentityGate {
            qid_shape: vec![2; num_qubits],
        }),
    }
}
