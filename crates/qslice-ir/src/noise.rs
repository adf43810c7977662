//! Noise channels for simulation-only circuits.
//!
//! Hardware backends reject these; they exist so that noisy circuits built
//! for a simulator survive the wire format unchanged.

use serde::{Deserialize, Serialize};

use crate::gate::Gate;
use crate::mapping::ArgMap;
use crate::parameter::ParameterExpression;

/// A noise channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NoiseChannel {
    /// Depolarizing channel: with probability `p`, replaces the state
    /// with the maximally mixed state.
    Depolarizing {
        /// Error probability (0.0 to 1.0).
        p: ParameterExpression,
    },
    /// Applies `sub_gate` with the given probability.
    RandomGate {
        /// Probability of applying the sub-gate.
        probability: ParameterExpression,
        /// The gate applied.
        sub_gate: Box<Gate>,
    },
}

impl NoiseChannel {
    /// Get a human-readable name for this channel.
    pub fn name(&self) -> &str {
        match self {
            NoiseChannel::Depolarizing { .. } => "depolarizing",
            NoiseChannel::RandomGate { .. } => "random_gate",
        }
    }

    /// Qubit count, when fixed by the channel.
    pub fn num_qubits(&self) -> Option<usize> {
        match self {
            NoiseChannel::Depolarizing { .. } => None,
            NoiseChannel::RandomGate { sub_gate, .. } => sub_gate.num_qubits(),
        }
    }

    pub(crate) fn substitute(&self, map: &ArgMap) -> Self {
        match self {
            NoiseChannel::Depolarizing { p } => NoiseChannel::Depolarizing {
                p: p.substitute(map),
            },
            NoiseChannel::RandomGate {
                probability,
                sub_gate,
            } => NoiseChannel::RandomGate {
                probability: probability.substitute(map),
                sub_gate: Box::new(sub_gate.substitute(map)),
            },
        }
    }
}

impl std::fmt::Display for NoiseChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoiseChannel::Depolarizing { p } => write!(f, "depolarizing(p={p})"),
            NoiseChannel::RandomGate {
                probability,
                sub_gate,
            } => write!(f, "random_gate({}, p={probability})", sub_gate.name()),
        }
    }
}
