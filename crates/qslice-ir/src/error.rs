//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Coarse classification of a failure.
///
/// Every error raised by the qslice crates maps onto one of these, so callers
/// can decide how to react without matching on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A well-formedness rule was broken (overlapping operations, duplicate
    /// mapping sources, forward constant references, ...).
    StructuralViolation,
    /// A reference could not be resolved, or a recursive structure does not
    /// terminate.
    UnresolvedReference,
    /// A gate, argument or tag kind outside the known set.
    UnsupportedVariant,
    /// A configured ceiling was hit.
    ResourceLimit,
}

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Two operations of one moment act on the same qubit.
    #[error("Operations in one moment overlap on qubit {qubit}")]
    OverlappingOperations {
        /// The shared qubit.
        qubit: QubitId,
    },

    /// Duplicate qubit in operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Gate requires different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: usize,
        /// Actual number of qubits provided.
        got: usize,
    },

    /// The same mapping source was given two different targets.
    #[error("Mapping source '{key}' is mapped to both '{first}' and '{second}'")]
    ConflictingMapping {
        /// The source entry.
        key: String,
        /// Target of the first occurrence.
        first: String,
        /// Target of the conflicting occurrence.
        second: String,
    },

    /// A qubit map sends two qubits of the sub-circuit to the same target.
    #[error("Qubit map sends both {first} and {second} to {target}")]
    NonInjectiveQubitMap {
        /// First source qubit.
        first: QubitId,
        /// Second source qubit.
        second: QubitId,
        /// The shared target.
        target: QubitId,
    },

    /// Repetition ids must be unique.
    #[error("Repetition id '{0}' appears more than once")]
    DuplicateRepetitionId(String),

    /// A repeat-until loop combined with explicit repetitions.
    #[error("repeat_until requires a repetition count of 1, got {0}")]
    RepeatUntilWithRepetitions(String),

    /// A count that does not fit the wire representation.
    #[error("{what} {value} exceeds the maximum of {max}")]
    ValueTooLarge {
        /// Which count ("repetition count", "qubit count").
        what: &'static str,
        /// Requested value.
        value: u64,
        /// Largest accepted value.
        max: u64,
    },

    /// A measurement gate with no qubits, or an inversion mask of the wrong
    /// length.
    #[error("Invalid measurement on {num_qubits} qubits: {reason}")]
    InvalidMeasurement {
        /// Number of qubits measured.
        num_qubits: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Insertion index past the append position.
    #[error("Moment index {index} out of range for circuit with {len} moments")]
    MomentIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of moments in the circuit.
        len: usize,
    },

    /// A flattening ceiling was exceeded.
    #[error("Flattening exceeded the {limit} limit of {max}")]
    FlattenLimitExceeded {
        /// Which limit was hit ("depth" or "operations").
        limit: &'static str,
        /// The configured ceiling.
        max: usize,
    },
}

impl IrError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            IrError::FlattenLimitExceeded { .. } | IrError::ValueTooLarge { .. } => {
                ErrorCategory::ResourceLimit
            }
            IrError::OverlappingOperations { .. }
            | IrError::DuplicateQubit { .. }
            | IrError::QubitCountMismatch { .. }
            | IrError::ConflictingMapping { .. }
            | IrError::NonInjectiveQubitMap { .. }
            | IrError::DuplicateRepetitionId(_)
            | IrError::RepeatUntilWithRepetitions(_)
            | IrError::InvalidMeasurement { .. }
            | IrError::MomentIndexOutOfRange { .. } => ErrorCategory::StructuralViolation,
        }
    }
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
