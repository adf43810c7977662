//! Deduplicating protobuf wire format for qslice circuits.
//!
//! A serialized program is a body circuit plus a constant table. The encoder
//! appends strings, qubits, moments, operations, tags and called
//! sub-circuits to the table, each written once and referenced by index
//! afterwards; references only ever point to earlier entries. The decoder
//! resolves the table front to back and rejects anything that does not.
//!
//! # Example
//!
//! ```rust
//! use qslice_ir::{Circuit, CircuitOperation, Operation};
//!
//! let call = CircuitOperation::new(Circuit::bell().unwrap()).repeat(3).unwrap();
//! let circuit = Circuit::from_ops(vec![Operation::circuit(call)]).unwrap();
//!
//! let bytes = qslice_wire::encode(&circuit);
//! let decoded = qslice_wire::decode(&bytes).unwrap();
//! assert_eq!(decoded, circuit);
//! ```

mod args;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod proto;

pub use codec::Codec;
pub use config::{CodecConfig, ConfigError, DecodingLimits, EncodingPolicy};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{WireError, WireResult};

use qslice_ir::Circuit;

/// Encode with the default configuration.
pub fn encode(circuit: &Circuit) -> Vec<u8> {
    Codec::default().encode(circuit)
}

/// Decode with the default configuration.
pub fn decode(bytes: &[u8]) -> WireResult<Circuit> {
    Codec::default().decode(bytes)
}
