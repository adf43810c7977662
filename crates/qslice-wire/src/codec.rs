//! Configured entry point pairing the encoder and decoder.

use prost::Message;
use tracing::debug;

use qslice_ir::Circuit;

use crate::config::CodecConfig;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::WireResult;
use crate::proto;

/// Encodes and decodes circuits under one [`CodecConfig`].
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    /// Create a codec with the given configuration.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode to a program message.
    pub fn to_proto(&self, circuit: &Circuit) -> proto::Program {
        Encoder::new(&self.config.encoding).encode(circuit)
    }

    /// Decode a program message.
    pub fn decode_program(&self, program: &proto::Program) -> WireResult<Circuit> {
        Decoder::new(&self.config.decoding).decode(program)
    }

    /// Encode to bytes.
    pub fn encode(&self, circuit: &Circuit) -> Vec<u8> {
        let bytes = self.to_proto(circuit).encode_to_vec();
        debug!(bytes = bytes.len(), "encoded circuit");
        bytes
    }

    /// Decode from bytes.
    pub fn decode(&self, bytes: &[u8]) -> WireResult<Circuit> {
        Decoder::new(&self.config.decoding).decode_bytes(bytes)
    }

    /// Flatten every call within the configured limits, then encode.
    ///
    /// For consumers that do not understand circuit calls.
    pub fn encode_flattened(&self, circuit: &Circuit) -> WireResult<Vec<u8>> {
        let flat = circuit.flattened(&self.config.flatten)?;
        Ok(self.encode(&flat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingPolicy;
    use qslice_ir::{CircuitOperation, FlattenLimits, MAX_REPETITIONS, Operation, QubitId};

    fn repeated_bell(n: u32) -> Circuit {
        let call = CircuitOperation::new(Circuit::bell().unwrap())
            .repeat(n)
            .unwrap();
        Circuit::from_ops(vec![Operation::circuit(call)]).unwrap()
    }

    #[test]
    fn test_bytes_roundtrip() {
        let codec = Codec::default();
        let circuit = repeated_bell(3);
        let decoded = codec.decode(&codec.encode(&circuit)).unwrap();
        assert_eq!(decoded, circuit);
    }

    #[test]
    fn test_largest_repetition_count_roundtrips() {
        let codec = Codec::default();
        let circuit = repeated_bell(MAX_REPETITIONS);
        let decoded = codec.decode(&codec.encode(&circuit)).unwrap();
        assert_eq!(decoded, circuit);
        assert!(CircuitOperation::new(Circuit::bell().unwrap())
            .repeat(MAX_REPETITIONS + 1)
            .is_err());
    }

    #[test]
    fn test_policies_decode_alike() {
        let circuit = repeated_bell(2);
        let interned = Codec::default();
        let inline = Codec::new(CodecConfig {
            encoding: EncodingPolicy::inline(),
            ..Default::default()
        });
        assert_ne!(interned.encode(&circuit), inline.encode(&circuit));
        assert_eq!(
            interned.decode(&interned.encode(&circuit)).unwrap(),
            inline.decode(&inline.encode(&circuit)).unwrap()
        );
    }

    #[test]
    fn test_encode_flattened() {
        let codec = Codec::default();
        let bytes = codec.encode_flattened(&repeated_bell(2)).unwrap();
        let decoded = codec.decode(&bytes).unwrap();
        assert!(!decoded.has_circuit_operations());
        assert_eq!(decoded.num_operations(), 6);
        assert!(decoded.all_qubits().contains(&QubitId::line(1)));
    }

    #[test]
    fn test_encode_flattened_respects_limits() {
        let codec = Codec::new(CodecConfig {
            flatten: FlattenLimits {
                max_depth: Some(8),
                max_operations: Some(2),
            },
            ..Default::default()
        });
        assert!(codec.encode_flattened(&repeated_bell(4)).is_err());
    }
}
