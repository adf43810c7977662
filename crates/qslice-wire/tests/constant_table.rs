//! Integration tests for constant-table deduplication and reference checks.

use std::sync::Arc;

use prost::Message;
use qslice_ir::{
    ArgMap, Circuit, CircuitOperation, Gate, Operation, ParameterExpression, QubitId, QubitMap,
    StandardGate,
};
use qslice_wire::proto::{self, circuit_operation::CircuitRef, constant::ConstValue};
use qslice_wire::{Codec, CodecConfig, DecodingLimits, EncodingPolicy, WireError};

fn q(i: i32) -> QubitId {
    QubitId::line(i)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `count` calls of one shared sub-circuit, each on its own pair of qubits.
fn many_calls(count: i32, shared: bool) -> Circuit {
    let body = Arc::new(Circuit::bell().unwrap());
    let ops = (0..count)
        .map(|i| {
            let circuit = if shared {
                Arc::clone(&body)
            } else {
                Arc::new(Circuit::bell().unwrap())
            };
            let map = QubitMap::from_pairs([(q(0), q(2 * i)), (q(1), q(2 * i + 1))]).unwrap();
            Operation::circuit(CircuitOperation::new(circuit).with_qubit_map(map).unwrap())
        })
        .collect::<Vec<_>>();
    Circuit::from_ops(ops).unwrap()
}

fn circuit_constants(program: &proto::Program) -> usize {
    program
        .constants
        .iter()
        .filter(|c| matches!(c.const_value, Some(ConstValue::CircuitValue(_))))
        .count()
}

fn circuit_references(program: &proto::Program) -> Vec<i32> {
    let mut moments: Vec<&proto::Moment> = program
        .constants
        .iter()
        .filter_map(|c| match &c.const_value {
            Some(ConstValue::MomentValue(m)) => Some(m),
            _ => None,
        })
        .collect();
    if let Some(proto::program::Program::Circuit(body)) = &program.program {
        moments.extend(&body.moments);
    }
    moments
        .iter()
        .flat_map(|m| &m.circuit_operations)
        .filter_map(|call| match call.circuit_ref {
            Some(CircuitRef::CircuitConstantIndex(i)) => Some(i),
            _ => None,
        })
        .collect()
}

/// Circuit-constant references of every call, wherever its moment was written.
fn nested_circuit_references(program: &proto::Program) -> Vec<i32> {
    let mut moments: Vec<&proto::Moment> = Vec::new();
    for constant in &program.constants {
        match &constant.const_value {
            Some(ConstValue::MomentValue(m)) => moments.push(m),
            Some(ConstValue::CircuitValue(c)) => moments.extend(&c.moments),
            _ => {}
        }
    }
    if let Some(proto::program::Program::Circuit(body)) = &program.program {
        moments.extend(&body.moments);
    }
    moments
        .iter()
        .flat_map(|m| &m.circuit_operations)
        .filter_map(|call| match call.circuit_ref {
            Some(CircuitRef::CircuitConstantIndex(i)) => Some(i),
            _ => None,
        })
        .collect()
}

fn circuit_constant_indices(program: &proto::Program) -> Vec<i32> {
    program
        .constants
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c.const_value, Some(ConstValue::CircuitValue(_))))
        .map(|(i, _)| i as i32)
        .collect()
}

fn rotate_and_measure() -> Circuit {
    Circuit::from_ops(vec![
        Operation::new(StandardGate::XPow(ParameterExpression::symbol("t")), [q(0)]).unwrap(),
        Operation::new(Gate::cz(), [q(0), q(1)]).unwrap(),
        Operation::new(Gate::measure("m"), [q(1)]).unwrap(),
    ])
    .unwrap()
}

fn bind(t: f64) -> ArgMap {
    ArgMap::from_pairs([("t".to_string(), ParameterExpression::constant(t))]).unwrap()
}

/// One body called at the top level and twice inside another called
/// circuit, each time with its own argument map.
fn body_at_two_depths() -> Circuit {
    let body = Arc::new(rotate_and_measure());
    let middle = Circuit::from_ops(vec![
        Operation::circuit(
            CircuitOperation::new(Arc::clone(&body))
                .with_arg_map(bind(0.5))
                .repeat(2)
                .unwrap(),
        ),
        Operation::circuit(
            CircuitOperation::new(rotate_and_measure())
                .with_qubit_pairs([(q(0), q(2)), (q(1), q(3))])
                .unwrap()
                .with_arg_map(bind(0.75)),
        ),
    ])
    .unwrap();
    Circuit::from_ops(vec![
        Operation::circuit(
            CircuitOperation::new(body)
                .with_qubit_pairs([(q(0), q(4)), (q(1), q(5))])
                .unwrap()
                .with_arg_map(bind(0.25)),
        ),
        Operation::circuit(CircuitOperation::new(middle)),
    ])
    .unwrap()
}

// ============================================================================
// Deduplication
// ============================================================================

#[test]
fn test_body_shared_across_depths_written_once() {
    init_tracing();
    let circuit = body_at_two_depths();
    for policy in [
        EncodingPolicy::default(),
        EncodingPolicy {
            intern_moments: false,
            intern_operations: false,
            ..Default::default()
        },
    ] {
        let codec = Codec::new(CodecConfig {
            encoding: policy,
            ..Default::default()
        });
        let program = codec.to_proto(&circuit);

        // The body is written before the circuit that calls it.
        let indices = circuit_constant_indices(&program);
        assert_eq!(indices.len(), 2);
        let (body, middle) = (indices[0], indices[1]);
        assert!(body < middle);

        let refs = nested_circuit_references(&program);
        assert_eq!(refs.iter().filter(|&&i| i == body).count(), 3);
        assert_eq!(refs.iter().filter(|&&i| i == middle).count(), 1);
        assert_eq!(refs.len(), 4);

        assert_eq!(codec.decode_program(&program).unwrap(), circuit);
    }
}

#[test]
fn test_shared_subcircuit_written_once() {
    init_tracing();
    let circuit = many_calls(5, true);
    let codec = Codec::default();
    let program = codec.to_proto(&circuit);

    assert_eq!(circuit_constants(&program), 1);
    let refs = circuit_references(&program);
    assert_eq!(refs.len(), 5);
    assert!(refs.windows(2).all(|w| w[0] == w[1]));

    assert_eq!(codec.decode_program(&program).unwrap(), circuit);
}

#[test]
fn test_equal_subcircuits_written_once() {
    let program = Codec::default().to_proto(&many_calls(4, false));
    assert_eq!(circuit_constants(&program), 1);
    assert_eq!(circuit_references(&program).len(), 4);
}

#[test]
fn test_interning_shrinks_repetitive_circuits() {
    let circuit = many_calls(16, true);
    let interned = Codec::default().encode(&circuit);
    let inline = Codec::new(CodecConfig {
        encoding: EncodingPolicy::inline(),
        ..Default::default()
    })
    .encode(&circuit);
    assert!(interned.len() < inline.len());
}

#[test]
fn test_shared_subcircuit_decodes_shared() {
    let codec = Codec::default();
    let decoded = codec.decode(&codec.encode(&many_calls(3, true))).unwrap();
    let bodies: Vec<_> = decoded
        .all_operations()
        .filter_map(|op| op.circuit_op())
        .map(|call| call.circuit())
        .collect();
    assert_eq!(bodies.len(), 3);
    assert!(bodies.windows(2).all(|w| Arc::ptr_eq(w[0], w[1])));
}

// ============================================================================
// Malformed programs
// ============================================================================

#[test]
fn test_reordered_table_rejected() {
    let codec = Codec::default();
    let mut program = codec.to_proto(&many_calls(2, true));
    program.constants.reverse();
    let err = codec.decode_program(&program).unwrap_err();
    assert!(
        matches!(
            err,
            WireError::ForwardReference { .. } | WireError::ConstantTypeMismatch { .. }
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn test_truncated_table_rejected() {
    let codec = Codec::default();
    let mut program = codec.to_proto(&many_calls(2, true));
    program.constants.clear();
    let err = codec.decode(&program.encode_to_vec()).unwrap_err();
    assert!(matches!(err, WireError::IndexOutOfRange { len: 0, .. }));
}

#[test]
fn test_message_size_limit() {
    let bytes = Codec::default().encode(&many_calls(8, true));
    let codec = Codec::new(CodecConfig {
        decoding: DecodingLimits {
            max_message_size_bytes: bytes.len() - 1,
            ..Default::default()
        },
        ..Default::default()
    });
    assert!(matches!(
        codec.decode(&bytes),
        Err(WireError::MessageTooLarge { .. })
    ));
}

#[test]
fn test_config_file_drives_codec() {
    let path = std::env::temp_dir().join(format!("qslice-wire-test-{}.yaml", std::process::id()));
    std::fs::write(
        &path,
        "encoding:\n  intern_qubits: false\n  intern_moments: false\n  intern_operations: false\n  intern_tags: false\n  intern_circuits: false\n  string_intern_min_len: null\n",
    )
    .unwrap();
    let config = CodecConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.encoding, EncodingPolicy::inline());
    let program = Codec::new(config).to_proto(&many_calls(2, true));
    assert!(program.constants.is_empty());
}
