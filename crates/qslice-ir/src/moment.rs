//! Moments: time slices of qubit-disjoint operations.

use rustc_hash::FxHashSet;

use crate::error::{IrError, IrResult};
use crate::operation::Operation;
use crate::qubit::{MeasurementKey, QubitId};

/// An ordered collection of operations acting on disjoint qubits.
///
/// Equality ignores operation order, since operations of one moment run
/// concurrently.
#[derive(Debug, Clone, Default)]
pub struct Moment {
    operations: Vec<Operation>,
    qubits: FxHashSet<QubitId>,
}

impl Moment {
    /// Create an empty moment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a moment from operations.
    pub fn from_operations(ops: impl IntoIterator<Item = Operation>) -> IrResult<Self> {
        let mut moment = Self::new();
        for op in ops {
            moment.push(op)?;
        }
        Ok(moment)
    }

    /// Return a copy with `op` added.
    pub fn with_operation(&self, op: Operation) -> IrResult<Self> {
        let mut moment = self.clone();
        moment.push(op)?;
        Ok(moment)
    }

    /// Return a copy with every operation of `ops` added.
    pub fn with_operations(&self, ops: impl IntoIterator<Item = Operation>) -> IrResult<Self> {
        let mut moment = self.clone();
        for op in ops {
            moment.push(op)?;
        }
        Ok(moment)
    }

    pub(crate) fn push(&mut self, op: Operation) -> IrResult<()> {
        if let Some(q) = op.qubits().iter().find(|q| self.qubits.contains(*q)) {
            return Err(IrError::OverlappingOperations { qubit: q.clone() });
        }
        self.qubits.extend(op.qubits().iter().cloned());
        self.operations.push(op);
        Ok(())
    }

    /// Operations, in insertion order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the moment holds no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Whether any operation acts on one of `qubits`.
    pub fn operates_on(&self, qubits: &[QubitId]) -> bool {
        qubits.iter().any(|q| self.qubits.contains(q))
    }

    /// Qubits acted on.
    pub fn qubits(&self) -> impl Iterator<Item = &QubitId> {
        self.qubits.iter()
    }

    /// Keys measured in this moment.
    pub fn measurement_keys(&self) -> Vec<MeasurementKey> {
        self.operations
            .iter()
            .flat_map(Operation::measurement_keys)
            .collect()
    }

    /// Whether an operation of this moment records results in the stream
    /// of `key`.
    pub fn measures_stream(&self, key: &MeasurementKey) -> bool {
        self.operations.iter().any(|op| op.measures_stream(key))
    }

    /// Keys read by conditions in this moment.
    pub fn control_keys(&self) -> Vec<MeasurementKey> {
        self.operations
            .iter()
            .flat_map(Operation::control_keys)
            .collect()
    }
}

impl PartialEq for Moment {
    fn eq(&self, other: &Self) -> bool {
        if self.operations.len() != other.operations.len() || self.qubits != other.qubits {
            return false;
        }
        let mut used = vec![false; other.operations.len()];
        self.operations.iter().all(|op| {
            let found = other
                .operations
                .iter()
                .enumerate()
                .position(|(i, o)| !used[i] && o == op);
            match found {
                Some(i) => {
                    used[i] = true;
                    true
                }
                None => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Gate;

    fn op(gate: Gate, qs: &[i32]) -> Operation {
        Operation::new(gate, qs.iter().map(|&q| QubitId::line(q))).unwrap()
    }

    #[test]
    fn test_disjointness_enforced() {
        let m = Moment::from_operations([op(Gate::cz(), &[0, 1])]).unwrap();
        let err = m.with_operation(op(Gate::h(), &[1])).unwrap_err();
        assert!(matches!(err, IrError::OverlappingOperations { .. }));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = Moment::from_operations([op(Gate::h(), &[0]), op(Gate::x(), &[1])]).unwrap();
        let b = Moment::from_operations([op(Gate::x(), &[1]), op(Gate::h(), &[0])]).unwrap();
        assert_eq!(a, b);
        let c = Moment::from_operations([op(Gate::x(), &[0]), op(Gate::h(), &[1])]).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_operates_on() {
        let m = Moment::from_operations([op(Gate::cz(), &[0, 1])]).unwrap();
        assert!(m.operates_on(&[QubitId::line(1)]));
        assert!(!m.operates_on(&[QubitId::line(2)]));
    }
}
