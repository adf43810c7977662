//! qslice circuit intermediate representation
//!
//! Quantum programs as time-sliced sequences of operations on addressable
//! qubits, together with the rules for building them incrementally and for
//! calling reusable sub-circuits.
//!
//! # Core Components
//!
//! - **Identifiers**: [`QubitId`] and [`MeasurementKey`]
//! - **Gates**: [`StandardGate`] for the closed gate set, [`InternalGate`] for
//!   extension gates and [`NoiseChannel`] for simulation-only channels
//! - **Operations**: [`Operation`] binds a gate or a [`CircuitOperation`] to
//!   qubits, with [`Tag`]s and classical [`Condition`]s
//! - **Moments**: [`Moment`] holds qubit-disjoint operations
//! - **Circuit**: [`Circuit`] with placement via [`InsertStrategy`]
//! - **Sub-circuits**: [`CircuitOperation`] with repetitions and
//!   [`QubitMap`]/[`KeyMap`]/[`ArgMap`] remapping, expanded by
//!   [`CircuitOperation::mapped_circuit`] and [`Circuit::flattened`]
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qslice_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::new();
//! circuit
//!     .h(QubitId::line(0))
//!     .unwrap()
//!     .cz(QubitId::line(0), QubitId::line(1))
//!     .unwrap()
//!     .measure([QubitId::line(0), QubitId::line(1)], "bell")
//!     .unwrap();
//!
//! assert_eq!(circuit.len(), 3);
//! ```
//!
//! # Example: Repeated Sub-circuit
//!
//! ```rust
//! use qslice_ir::{Circuit, CircuitOperation, QubitId};
//!
//! let body = Circuit::bell().unwrap();
//! let call = CircuitOperation::new(body.clone()).repeat(3).unwrap();
//!
//! let expanded = call.mapped_circuit(false).unwrap();
//! assert_eq!(expanded.len(), 3 * body.len());
//! assert_eq!(expanded.measurement_keys()[1].to_string(), "1:bell");
//! ```

pub mod arg;
pub mod circuit;
pub mod circuit_op;
pub mod condition;
pub mod error;
pub mod flatten;
pub mod gate;
pub mod mapping;
pub mod moment;
pub mod noise;
pub mod operation;
pub mod parameter;
pub mod qubit;
pub mod scheduling;
pub mod tag;

pub use arg::{Arg, NdArray, Repeated, Scalar, SequenceKind};
pub use circuit::{Circuit, FrozenCircuit};
pub use circuit_op::{CircuitOperation, MAX_REPETITIONS, Repetitions};
pub use condition::{Comparison, Condition};
pub use error::{ErrorCategory, IrError, IrResult};
pub use flatten::FlattenLimits;
pub use gate::{CouplerPulse, Gate, InternalGate, StandardGate};
pub use mapping::{ArgMap, KeyMap, Mapping, QubitMap};
pub use moment::Moment;
pub use noise::NoiseChannel;
pub use operation::{MAX_GATE_QUBITS, Operation, OperationKind};
pub use parameter::ParameterExpression;
pub use qubit::{KEY_PATH_SEPARATOR, MeasurementKey, QubitId};
pub use scheduling::{InsertStrategy, OpItem, OpTree, OpTreeIter};
pub use tag::{InternalTag, Tag};
