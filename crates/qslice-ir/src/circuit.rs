//! Moment-based circuits and the high-level builder API.

use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::IrResult;
use crate::gate::Gate;
use crate::moment::Moment;
use crate::operation::Operation;
use crate::qubit::{MeasurementKey, QubitId};
use crate::scheduling::{self, InsertStrategy, OpTree};
use crate::tag::Tag;

/// A quantum circuit: an ordered sequence of moments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Circuit {
    moments: Vec<Moment>,
    tags: Vec<Tag>,
}

/// An immutable circuit shared between sub-circuit calls.
pub type FrozenCircuit = Arc<Circuit>;

impl Circuit {
    /// Create a new empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a circuit from existing moments.
    pub fn from_moments(moments: impl IntoIterator<Item = Moment>) -> Self {
        Self {
            moments: moments.into_iter().collect(),
            tags: vec![],
        }
    }

    /// Build a circuit by appending `ops` with [`InsertStrategy::Earliest`].
    pub fn from_ops(ops: impl Into<OpTree>) -> IrResult<Self> {
        let mut circuit = Self::new();
        circuit.append(ops, InsertStrategy::Earliest)?;
        Ok(circuit)
    }

    /// Attach circuit-level tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        for tag in tags {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    /// Freeze the circuit for sharing between sub-circuit calls.
    pub fn freeze(self) -> FrozenCircuit {
        Arc::new(self)
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Insert operations at `index`, returning the new circuit and the
    /// position just after the inserted operations.
    ///
    /// `self` is left untouched.
    pub fn inserted(
        &self,
        index: usize,
        ops: impl Into<OpTree>,
        strategy: InsertStrategy,
    ) -> IrResult<(Circuit, usize)> {
        let mut out = self.clone();
        let k = out.insert(index, ops, strategy)?;
        Ok((out, k))
    }

    /// Insert operations at `index` in place, returning the position just
    /// after the inserted operations.
    pub fn insert(
        &mut self,
        index: usize,
        ops: impl Into<OpTree>,
        strategy: InsertStrategy,
    ) -> IrResult<usize> {
        scheduling::insert_into(&mut self.moments, index, ops.into(), strategy)
    }

    /// Append operations at the end.
    pub fn append(&mut self, ops: impl Into<OpTree>, strategy: InsertStrategy) -> IrResult<usize> {
        let end = self.moments.len();
        self.insert(end, ops, strategy)
    }

    /// Moment-wise union of two circuits.
    ///
    /// Fails if a pair of moments at the same position shares a qubit.
    pub fn zip(&self, other: &Circuit) -> IrResult<Circuit> {
        let len = self.moments.len().max(other.moments.len());
        let mut moments = Vec::with_capacity(len);
        for i in 0..len {
            let moment = match (self.moments.get(i), other.moments.get(i)) {
                (Some(a), Some(b)) => a.with_operations(b.operations().iter().cloned())?,
                (Some(a), None) => a.clone(),
                (None, Some(b)) => b.clone(),
                (None, None) => Moment::new(),
            };
            moments.push(moment);
        }
        Ok(Circuit {
            moments,
            tags: self.tags.clone(),
        })
    }

    // =========================================================================
    // Builder shortcuts
    // =========================================================================

    /// Append an operation with [`InsertStrategy::Earliest`].
    pub fn push(&mut self, op: Operation) -> IrResult<&mut Self> {
        self.append(op, InsertStrategy::Earliest)?;
        Ok(self)
    }

    /// Apply a gate.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.push(Operation::new(gate, qubits)?)
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::h(), [qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::x(), [qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::z(), [qubit])
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::cz(), [q1, q2])
    }

    /// Measure qubits under `key`.
    pub fn measure(
        &mut self,
        qubits: impl IntoIterator<Item = QubitId>,
        key: impl Into<MeasurementKey>,
    ) -> IrResult<&mut Self> {
        self.gate(Gate::measure(key), qubits)
    }

    // =========================================================================
    // Circuit properties
    // =========================================================================

    /// Moments, in order.
    pub fn moments(&self) -> &[Moment] {
        &self.moments
    }

    /// Circuit-level tags.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Number of moments.
    pub fn len(&self) -> usize {
        self.moments.len()
    }

    /// Whether the circuit has no moments.
    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }

    /// Total number of operations, counting a sub-circuit call as one.
    pub fn num_operations(&self) -> usize {
        self.moments.iter().map(Moment::len).sum()
    }

    /// All operations, moment by moment.
    pub fn all_operations(&self) -> impl Iterator<Item = &Operation> {
        self.moments.iter().flat_map(|m| m.operations().iter())
    }

    /// Every qubit acted on, in order.
    pub fn all_qubits(&self) -> BTreeSet<QubitId> {
        self.all_operations()
            .flat_map(|op| op.qubits().iter().cloned())
            .collect()
    }

    /// Keys measured anywhere in the circuit, as seen from outside each
    /// sub-circuit call.
    pub fn measurement_keys(&self) -> Vec<MeasurementKey> {
        dedup(self.all_operations().flat_map(Operation::measurement_keys))
    }

    /// Whether any operation records results in the stream of `key`.
    pub fn measures_stream(&self, key: &MeasurementKey) -> bool {
        self.all_operations().any(|op| op.measures_stream(key))
    }

    /// Keys read by conditions anywhere in the circuit.
    pub fn control_keys(&self) -> Vec<MeasurementKey> {
        dedup(self.all_operations().flat_map(Operation::control_keys))
    }

    /// Whether any operation is a sub-circuit call.
    pub fn has_circuit_operations(&self) -> bool {
        self.all_operations().any(Operation::is_circuit_op)
    }

    // =========================================================================
    // Common circuits
    // =========================================================================

    /// Create a Bell state circuit on line qubits 0 and 1.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::new();
        circuit
            .h(QubitId::line(0))?
            .cz(QubitId::line(0), QubitId::line(1))?
            .measure([QubitId::line(0), QubitId::line(1)], "bell")?;
        Ok(circuit)
    }

    /// Create an n-qubit GHZ-style ladder on line qubits.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::new();
        let n = n as i32;
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(QubitId::line(0))?;
        for i in 0..n - 1 {
            circuit.cz(QubitId::line(i), QubitId::line(i + 1))?;
        }
        circuit.measure((0..n).map(QubitId::line), "ghz")?;
        Ok(circuit)
    }
}

/// Drop repeated keys, keeping first occurrences in order.
fn dedup(keys: impl Iterator<Item = MeasurementKey>) -> Vec<MeasurementKey> {
    let mut seen = FxHashSet::default();
    keys.filter(|key| seen.insert(key.clone())).collect()
}
