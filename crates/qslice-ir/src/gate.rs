//! Quantum gate types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::arg::Arg;
use crate::mapping::ArgMap;
use crate::noise::NoiseChannel;
use crate::parameter::ParameterExpression;
use crate::qubit::MeasurementKey;

/// Parameters of a hardware coupler pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplerPulse {
    /// Time the pulse is held at full amplitude, in picoseconds.
    pub hold_time_ps: ParameterExpression,
    /// Rise (and fall) time, in picoseconds.
    pub rise_time_ps: ParameterExpression,
    /// Padding on either side of the pulse, in picoseconds.
    pub padding_time_ps: ParameterExpression,
    /// Coupling strength in MHz.
    pub coupling_mhz: ParameterExpression,
    /// Detuning of the first qubit in MHz.
    pub q0_detune_mhz: ParameterExpression,
    /// Detuning of the second qubit in MHz.
    pub q1_detune_mhz: ParameterExpression,
}

/// Gates in the closed, known set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit power gates
    /// X raised to a power.
    XPow(ParameterExpression),
    /// Y raised to a power.
    YPow(ParameterExpression),
    /// Z raised to a power.
    ZPow(ParameterExpression),
    /// Hadamard raised to a power.
    HPow(ParameterExpression),
    /// X power conjugated by a Z rotation.
    PhasedXPow {
        /// Exponent of the X part.
        exponent: ParameterExpression,
        /// Phase of the rotation axis.
        phase_exponent: ParameterExpression,
    },
    /// Arbitrary single-qubit gate in X, Z, axis-phase form.
    PhasedXZ {
        /// X exponent.
        x_exponent: ParameterExpression,
        /// Z exponent.
        z_exponent: ParameterExpression,
        /// Axis phase exponent.
        axis_phase_exponent: ParameterExpression,
    },

    // Two-qubit gates
    /// Controlled-Z raised to a power.
    CZPow(ParameterExpression),
    /// iSWAP raised to a power.
    ISwapPow(ParameterExpression),
    /// Fermionic simulation gate.
    FSim {
        /// Swap angle.
        theta: ParameterExpression,
        /// Controlled phase angle.
        phi: ParameterExpression,
    },
    /// Hardware coupler pulse.
    CouplerPulse(Box<CouplerPulse>),

    // Non-unitary and timing
    /// Measurement in the computational basis.
    Measurement {
        /// Key the result is recorded under.
        key: MeasurementKey,
        /// Per-qubit flags inverting the reported bit. May be shorter than
        /// the qubit list, never longer.
        invert_mask: Vec<bool>,
    },
    /// Idle for a duration.
    Wait {
        /// Duration in nanoseconds.
        duration_nanos: ParameterExpression,
    },
    /// Reset to the ground state.
    Reset {
        /// Dimension of the qudit.
        dimension: u32,
    },
    /// Identity on any number of qubits.
    Identity,
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::XPow(_) => "x_pow",
            StandardGate::YPow(_) => "y_pow",
            StandardGate::ZPow(_) => "z_pow",
            StandardGate::HPow(_) => "h_pow",
            StandardGate::PhasedXPow { .. } => "phased_x_pow",
            StandardGate::PhasedXZ { .. } => "phased_xz",
            StandardGate::CZPow(_) => "cz_pow",
            StandardGate::ISwapPow(_) => "iswap_pow",
            StandardGate::FSim { .. } => "fsim",
            StandardGate::CouplerPulse(_) => "coupler_pulse",
            StandardGate::Measurement { .. } => "measure",
            StandardGate::Wait { .. } => "wait",
            StandardGate::Reset { .. } => "reset",
            StandardGate::Identity => "id",
        }
    }

    /// Number of qubits, or `None` for gates of any arity.
    #[inline]
    pub fn num_qubits(&self) -> Option<usize> {
        match self {
            StandardGate::XPow(_)
            | StandardGate::YPow(_)
            | StandardGate::ZPow(_)
            | StandardGate::HPow(_)
            | StandardGate::PhasedXPow { .. }
            | StandardGate::PhasedXZ { .. }
            | StandardGate::Reset { .. } => Some(1),

            StandardGate::CZPow(_)
            | StandardGate::ISwapPow(_)
            | StandardGate::FSim { .. }
            | StandardGate::CouplerPulse(_) => Some(2),

            StandardGate::Measurement { .. } | StandardGate::Wait { .. } | StandardGate::Identity => {
                None
            }
        }
    }

    /// Get parameters of this gate.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            StandardGate::XPow(p)
            | StandardGate::YPow(p)
            | StandardGate::ZPow(p)
            | StandardGate::HPow(p)
            | StandardGate::CZPow(p)
            | StandardGate::ISwapPow(p) => vec![p],
            StandardGate::PhasedXPow {
                exponent,
                phase_exponent,
            } => vec![exponent, phase_exponent],
            StandardGate::PhasedXZ {
                x_exponent,
                z_exponent,
                axis_phase_exponent,
            } => vec![x_exponent, z_exponent, axis_phase_exponent],
            StandardGate::FSim { theta, phi } => vec![theta, phi],
            StandardGate::CouplerPulse(c) => vec![
                &c.hold_time_ps,
                &c.rise_time_ps,
                &c.padding_time_ps,
                &c.coupling_mhz,
                &c.q0_detune_mhz,
                &c.q1_detune_mhz,
            ],
            StandardGate::Wait { duration_nanos } => vec![duration_nanos],
            StandardGate::Measurement { .. } | StandardGate::Reset { .. } | StandardGate::Identity => {
                vec![]
            }
        }
    }

    fn substitute(&self, map: &ArgMap) -> Self {
        let s = |p: &ParameterExpression| p.substitute(map);
        match self {
            StandardGate::XPow(p) => StandardGate::XPow(s(p)),
            StandardGate::YPow(p) => StandardGate::YPow(s(p)),
            StandardGate::ZPow(p) => StandardGate::ZPow(s(p)),
            StandardGate::HPow(p) => StandardGate::HPow(s(p)),
            StandardGate::CZPow(p) => StandardGate::CZPow(s(p)),
            StandardGate::ISwapPow(p) => StandardGate::ISwapPow(s(p)),
            StandardGate::PhasedXPow {
                exponent,
                phase_exponent,
            } => StandardGate::PhasedXPow {
                exponent: s(exponent),
                phase_exponent: s(phase_exponent),
            },
            StandardGate::PhasedXZ {
                x_exponent,
                z_exponent,
                axis_phase_exponent,
            } => StandardGate::PhasedXZ {
                x_exponent: s(x_exponent),
                z_exponent: s(z_exponent),
                axis_phase_exponent: s(axis_phase_exponent),
            },
            StandardGate::FSim { theta, phi } => StandardGate::FSim {
                theta: s(theta),
                phi: s(phi),
            },
            StandardGate::CouplerPulse(c) => StandardGate::CouplerPulse(Box::new(CouplerPulse {
                hold_time_ps: s(&c.hold_time_ps),
                rise_time_ps: s(&c.rise_time_ps),
                padding_time_ps: s(&c.padding_time_ps),
                coupling_mhz: s(&c.coupling_mhz),
                q0_detune_mhz: s(&c.q0_detune_mhz),
                q1_detune_mhz: s(&c.q1_detune_mhz),
            })),
            StandardGate::Wait { duration_nanos } => StandardGate::Wait {
                duration_nanos: s(duration_nanos),
            },
            StandardGate::Measurement { .. } | StandardGate::Reset { .. } | StandardGate::Identity => {
                self.clone()
            }
        }
    }
}

/// A gate outside the closed set, identified by name and module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalGate {
    /// Gate name.
    pub name: String,
    /// Module that defines the gate.
    pub module: String,
    /// The number of qubits it operates on.
    pub num_qubits: u32,
    /// Typed arguments.
    pub args: BTreeMap<String, Arg>,
}

impl InternalGate {
    /// Create an internal gate without arguments.
    pub fn new(name: impl Into<String>, module: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            num_qubits,
            args: BTreeMap::new(),
        }
    }

    /// Add an argument.
    #[must_use]
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }
}

/// A gate or effect descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// A gate from the closed set.
    Standard(StandardGate),
    /// An extension gate.
    Internal(InternalGate),
    /// A noise channel.
    Noise(NoiseChannel),
}

impl Gate {
    /// Get the name of this gate.
    pub fn name(&self) -> &str {
        match self {
            Gate::Standard(g) => g.name(),
            Gate::Internal(g) => &g.name,
            Gate::Noise(n) => n.name(),
        }
    }

    /// Number of qubits, or `None` for gates of any arity.
    pub fn num_qubits(&self) -> Option<usize> {
        match self {
            Gate::Standard(g) => g.num_qubits(),
            Gate::Internal(g) => Some(g.num_qubits as usize),
            Gate::Noise(n) => n.num_qubits(),
        }
    }

    /// Whether any parameter or argument is symbolic.
    pub fn is_parameterized(&self) -> bool {
        match self {
            Gate::Standard(g) => g.parameters().iter().any(|p| p.is_symbolic()),
            Gate::Internal(g) => g.args.values().any(Arg::is_symbolic),
            Gate::Noise(NoiseChannel::Depolarizing { p }) => p.is_symbolic(),
            Gate::Noise(NoiseChannel::RandomGate {
                probability,
                sub_gate,
            }) => probability.is_symbolic() || sub_gate.is_parameterized(),
        }
    }

    /// Apply a symbol substitution to every parameter.
    #[must_use]
    pub fn substitute(&self, map: &ArgMap) -> Self {
        if map.is_empty() {
            return self.clone();
        }
        match self {
            Gate::Standard(g) => Gate::Standard(g.substitute(map)),
            Gate::Internal(g) => Gate::Internal(InternalGate {
                args: g
                    .args
                    .iter()
                    .map(|(k, v)| (k.clone(), v.substitute(map)))
                    .collect(),
                ..g.clone()
            }),
            Gate::Noise(n) => Gate::Noise(n.substitute(map)),
        }
    }

    /// The key this gate records a measurement under.
    pub fn measurement_key(&self) -> Option<&MeasurementKey> {
        match self {
            Gate::Standard(StandardGate::Measurement { key, .. }) => Some(key),
            _ => None,
        }
    }

    /// Replace the measurement key, if this gate measures.
    #[must_use]
    pub fn with_measurement_key(&self, new_key: MeasurementKey) -> Self {
        match self {
            Gate::Standard(StandardGate::Measurement { invert_mask, .. }) => {
                Gate::Standard(StandardGate::Measurement {
                    key: new_key,
                    invert_mask: invert_mask.clone(),
                })
            }
            other => other.clone(),
        }
    }

    /// X gate.
    pub fn x() -> Self {
        StandardGate::XPow(1.0.into()).into()
    }

    /// Y gate.
    pub fn y() -> Self {
        StandardGate::YPow(1.0.into()).into()
    }

    /// Z gate.
    pub fn z() -> Self {
        StandardGate::ZPow(1.0.into()).into()
    }

    /// Hadamard gate.
    pub fn h() -> Self {
        StandardGate::HPow(1.0.into()).into()
    }

    /// Controlled-Z gate.
    pub fn cz() -> Self {
        StandardGate::CZPow(1.0.into()).into()
    }

    /// Measurement under `key`.
    pub fn measure(key: impl Into<MeasurementKey>) -> Self {
        StandardGate::Measurement {
            key: key.into(),
            invert_mask: vec![],
        }
        .into()
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::Standard(gate)
    }
}

impl From<InternalGate> for Gate {
    fn from(gate: InternalGate) -> Self {
        Gate::Internal(gate)
    }
}

impl From<NoiseChannel> for Gate {
    fn from(channel: NoiseChannel) -> Self {
        Gate::Noise(channel)
    }
}
