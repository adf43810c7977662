//! Operations: gates or sub-circuit calls bound to qubits.

use rustc_hash::FxHashSet;
use std::fmt;

use crate::circuit_op::CircuitOperation;
use crate::condition::Condition;
use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::qubit::{MeasurementKey, QubitId};
use crate::tag::Tag;

/// Largest qubit count of a single gate that can be written to the wire.
pub const MAX_GATE_QUBITS: usize = i32::MAX as usize;

/// What an operation does.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationKind {
    /// A gate or effect.
    Gate(Gate),
    /// A call into a frozen sub-circuit.
    Circuit(Box<CircuitOperation>),
}

/// An immutable gate application.
///
/// Qubits are ordered and duplicate-free. Tags and guard conditions are
/// kept in insertion order without duplicates. Every transformation returns
/// a new operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    kind: OperationKind,
    qubits: Vec<QubitId>,
    tags: Vec<Tag>,
    conditions: Vec<Condition>,
}

impl Operation {
    /// Apply `gate` to `qubits`.
    ///
    /// Fails on duplicate qubits or when a fixed-arity gate gets the wrong
    /// number of qubits.
    pub fn new(gate: impl Into<Gate>, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<Self> {
        let gate = gate.into();
        let qubits: Vec<QubitId> = qubits.into_iter().collect();
        if let Some(expected) = gate.num_qubits() {
            if expected > MAX_GATE_QUBITS {
                return Err(IrError::ValueTooLarge {
                    what: "qubit count",
                    value: expected as u64,
                    max: MAX_GATE_QUBITS as u64,
                });
            }
            if expected != qubits.len() {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected,
                    got: qubits.len(),
                });
            }
        }
        check_distinct(&qubits, Some(gate.name()))?;
        check_measurement(&gate, qubits.len())?;
        Ok(Self {
            kind: OperationKind::Gate(gate),
            qubits,
            tags: vec![],
            conditions: vec![],
        })
    }

    /// Wrap a sub-circuit call. Its qubits are the mapped qubits of the
    /// inner circuit.
    pub fn circuit(op: CircuitOperation) -> Self {
        let qubits = op.qubits();
        Self {
            kind: OperationKind::Circuit(Box::new(op)),
            qubits,
            tags: vec![],
            conditions: vec![],
        }
    }

    /// Add tags, skipping ones already present.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        for tag in tags {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    /// Remove all tags.
    #[must_use]
    pub fn untagged(mut self) -> Self {
        self.tags.clear();
        self
    }

    /// Add classical guard conditions, skipping ones already present.
    #[must_use]
    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        for condition in conditions {
            if !self.conditions.contains(&condition) {
                self.conditions.push(condition);
            }
        }
        self
    }

    /// Drop all guard conditions.
    #[must_use]
    pub fn without_conditions(mut self) -> Self {
        self.conditions.clear();
        self
    }

    /// Rebuild a gate operation on new qubits, keeping tags and conditions.
    pub(crate) fn with_gate_and_qubits(&self, gate: Gate, qubits: Vec<QubitId>) -> IrResult<Self> {
        check_distinct(&qubits, Some(gate.name()))?;
        Ok(Self {
            kind: OperationKind::Gate(gate),
            qubits,
            tags: self.tags.clone(),
            conditions: self.conditions.clone(),
        })
    }

    /// Replace the sub-circuit call, keeping tags and conditions.
    pub(crate) fn with_circuit_op(&self, op: CircuitOperation) -> Self {
        Self {
            qubits: op.qubits(),
            kind: OperationKind::Circuit(Box::new(op)),
            tags: self.tags.clone(),
            conditions: self.conditions.clone(),
        }
    }

    pub(crate) fn replace_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    /// What the operation does.
    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    /// The gate, unless this is a sub-circuit call.
    pub fn gate(&self) -> Option<&Gate> {
        match &self.kind {
            OperationKind::Gate(g) => Some(g),
            OperationKind::Circuit(_) => None,
        }
    }

    /// The sub-circuit call, if this is one.
    pub fn circuit_op(&self) -> Option<&CircuitOperation> {
        match &self.kind {
            OperationKind::Circuit(c) => Some(c),
            OperationKind::Gate(_) => None,
        }
    }

    /// Whether this is a sub-circuit call.
    pub fn is_circuit_op(&self) -> bool {
        matches!(self.kind, OperationKind::Circuit(_))
    }

    /// Qubits, in order.
    pub fn qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    /// Tags.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Guard conditions.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Name of the gate, or `"circuit"`.
    pub fn name(&self) -> &str {
        match &self.kind {
            OperationKind::Gate(g) => g.name(),
            OperationKind::Circuit(_) => "circuit",
        }
    }

    /// Keys this operation records results under.
    pub fn measurement_keys(&self) -> Vec<MeasurementKey> {
        match &self.kind {
            OperationKind::Gate(g) => g.measurement_key().cloned().into_iter().collect(),
            OperationKind::Circuit(c) => c.measurement_keys(),
        }
    }

    /// Whether this operation records results in the stream of `key`.
    pub fn measures_stream(&self, key: &MeasurementKey) -> bool {
        match &self.kind {
            OperationKind::Gate(g) => g.measurement_key().is_some_and(|k| k.same_stream(key)),
            OperationKind::Circuit(c) => c.measures_stream(key),
        }
    }

    /// Keys this operation reads before running.
    pub fn control_keys(&self) -> Vec<MeasurementKey> {
        let mut keys: Vec<MeasurementKey> =
            self.conditions.iter().map(|c| c.key().clone()).collect();
        if let OperationKind::Circuit(c) = &self.kind {
            keys.extend(c.control_keys());
        }
        keys
    }
}

fn check_distinct(qubits: &[QubitId], gate_name: Option<&str>) -> IrResult<()> {
    let mut seen = FxHashSet::default();
    for q in qubits {
        if !seen.insert(q) {
            return Err(IrError::DuplicateQubit {
                qubit: q.clone(),
                gate_name: gate_name.map(str::to_string),
            });
        }
    }
    Ok(())
}

/// A measurement needs at least one qubit, and at most one mask bit per
/// qubit. Shorter masks leave the remaining bits as measured.
fn check_measurement(gate: &Gate, num_qubits: usize) -> IrResult<()> {
    let Gate::Standard(StandardGate::Measurement { invert_mask, .. }) = gate else {
        return Ok(());
    };
    let reason = if num_qubits == 0 {
        "no qubits".to_string()
    } else if invert_mask.len() > num_qubits {
        format!("invert mask has {} entries", invert_mask.len())
    } else {
        return Ok(());
    };
    Err(IrError::InvalidMeasurement { num_qubits, reason })
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        for (i, q) in self.qubits.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{q}")?;
        }
        write!(f, ")")?;
        if !self.conditions.is_empty() {
            let conds: Vec<String> = self.conditions.iter().map(ToString::to_string).collect();
            write!(f, ".with_conditions({})", conds.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_duplicate_qubits() {
        let err = Operation::new(Gate::cz(), [QubitId::line(0), QubitId::line(0)]).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { .. }));
    }

    #[test]
    fn test_rejects_wrong_arity() {
        let err = Operation::new(Gate::h(), [QubitId::line(0), QubitId::line(1)]).unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitCountMismatch {
                expected: 1,
                got: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_oversized_internal_gate() {
        let gate = crate::InternalGate::new("wide", "lab", 3_000_000_000);
        let err = Operation::new(gate, [QubitId::line(0)]).unwrap_err();
        assert!(matches!(
            err,
            IrError::ValueTooLarge {
                what: "qubit count",
                value: 3_000_000_000,
                ..
            }
        ));
    }

    #[test]
    fn test_measurement_needs_qubits() {
        let err = Operation::new(Gate::measure("m"), []).unwrap_err();
        assert!(matches!(err, IrError::InvalidMeasurement { num_qubits: 0, .. }));
        assert_eq!(err.category(), crate::ErrorCategory::StructuralViolation);
    }

    #[test]
    fn test_measurement_mask_not_longer_than_qubits() {
        let masked = |mask: Vec<bool>| StandardGate::Measurement {
            key: "m".into(),
            invert_mask: mask,
        };
        let qubits = [QubitId::line(0), QubitId::line(1)];

        assert!(Operation::new(masked(vec![true]), qubits.clone()).is_ok());
        assert!(Operation::new(masked(vec![true, false]), qubits.clone()).is_ok());
        let err = Operation::new(masked(vec![true, false, true]), qubits).unwrap_err();
        assert!(matches!(err, IrError::InvalidMeasurement { num_qubits: 2, .. }));
    }

    #[test]
    fn test_tags_deduplicated() {
        let op = Operation::new(Gate::z(), [QubitId::line(0)])
            .unwrap()
            .with_tags([Tag::PhysicalZ, Tag::PhysicalZ]);
        assert_eq!(op.tags(), &[Tag::PhysicalZ]);
    }

    #[test]
    fn test_keys() {
        let m = Operation::new(Gate::measure("m"), [QubitId::line(0), QubitId::line(1)]).unwrap();
        assert_eq!(m.measurement_keys(), vec![MeasurementKey::new("m")]);

        let x = Operation::new(Gate::x(), [QubitId::line(2)])
            .unwrap()
            .with_conditions([Condition::Key("m".into())]);
        assert_eq!(x.control_keys(), vec![MeasurementKey::new("m")]);
        assert_eq!(x.to_string(), "x_pow(q(2)).with_conditions(m)");
    }
}
