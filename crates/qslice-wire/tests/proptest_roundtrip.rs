//! Property-based tests for wire roundtrips.
//!
//! Circuit → bytes → circuit must reproduce the circuit exactly under every
//! encoding policy, and every constant-table reference must point backwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::collection::SizeRange;
use proptest::prelude::*;
use qslice_ir::{
    Arg, ArgMap, Circuit, CircuitOperation, Comparison, Condition, CouplerPulse, FrozenCircuit,
    Gate, InternalGate, InternalTag, KeyMap, MeasurementKey, NoiseChannel, Operation,
    ParameterExpression, QubitId, QubitMap, Repetitions, StandardGate, Tag,
};
use qslice_wire::proto::{self, constant::ConstValue};
use qslice_wire::{Codec, CodecConfig, EncodingPolicy};

const NUM_QUBITS: i32 = 5;

fn q(i: i32) -> QubitId {
    QubitId::line(i)
}

/// Sub-circuit shared by every call in a generated circuit.
fn body() -> FrozenCircuit {
    let mut circuit = Circuit::new();
    circuit
        .h(q(0))
        .unwrap()
        .cz(q(0), q(1))
        .unwrap()
        .measure([q(0), q(1)], "m")
        .unwrap();
    Arc::new(circuit)
}

/// Steps a generated circuit is built from.
#[derive(Debug, Clone)]
enum Step {
    Rotate(i32, i32),
    SymbolicRotate(i32, &'static str),
    Cz(i32, i32),
    Measure(i32, u8),
    Tagged(i32),
    Conditioned(i32, u8, i64),
    Call { a: i32, b: i32, reps: u32, key: u8 },
}

impl Step {
    fn apply(self, circuit: &mut Circuit, shared: &FrozenCircuit) {
        let op = match self {
            Step::Rotate(qubit, eighths) => Operation::new(
                StandardGate::XPow(ParameterExpression::constant(f64::from(eighths) / 8.0)),
                [q(qubit)],
            ),
            Step::SymbolicRotate(qubit, symbol) => Operation::new(
                StandardGate::ZPow(
                    ParameterExpression::symbol(symbol) * ParameterExpression::constant(0.5),
                ),
                [q(qubit)],
            ),
            Step::Cz(a, b) => Operation::new(Gate::cz(), [q(a), q(b)]),
            Step::Measure(qubit, key) => {
                Operation::new(Gate::measure(format!("k{key}").as_str()), [q(qubit)])
            }
            Step::Tagged(qubit) => Operation::new(Gate::x(), [q(qubit)]).map(|op| {
                op.with_tags([
                    Tag::NoSync {
                        forward: 1,
                        backward: 0,
                    },
                    Tag::Internal(InternalTag {
                        name: "note".into(),
                        namespace: "lab".into(),
                        args: BTreeMap::from([
                            ("level".to_string(), Arg::from(3_i64)),
                            ("label".to_string(), Arg::from("a-label-long-enough-to-intern")),
                        ]),
                    }),
                ])
            }),
            Step::Conditioned(qubit, key, value) => Operation::new(Gate::x(), [q(qubit)]).map(|op| {
                op.with_conditions([Condition::Compare {
                    key: MeasurementKey::new(format!("k{key}")),
                    comparison: Comparison::Ge,
                    value,
                }])
            }),
            Step::Call { a, b, reps, key } => {
                let call = CircuitOperation::new(Arc::clone(shared))
                    .with_qubit_map(QubitMap::from_pairs([(q(0), q(a)), (q(1), q(b))]).unwrap())
                    .and_then(|call| call.repeat(reps))
                    .map(|call| {
                        call.with_measurement_key_map(
                            KeyMap::from_pairs([("m".to_string(), format!("call{key}"))]).unwrap(),
                        )
                    });
                call.map(Operation::circuit)
            }
        };
        circuit.push(op.unwrap()).unwrap();
    }
}

fn arb_pair() -> impl Strategy<Value = (i32, i32)> {
    (0..NUM_QUBITS, 0..NUM_QUBITS).prop_filter("qubits must differ", |(a, b)| a != b)
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..NUM_QUBITS, -16_i32..16).prop_map(|(qubit, e)| Step::Rotate(qubit, e)),
        (0..NUM_QUBITS, prop::sample::select(vec!["theta", "phi"]))
            .prop_map(|(qubit, s)| Step::SymbolicRotate(qubit, s)),
        arb_pair().prop_map(|(a, b)| Step::Cz(a, b)),
        (0..NUM_QUBITS, 0_u8..3).prop_map(|(qubit, k)| Step::Measure(qubit, k)),
        (0..NUM_QUBITS).prop_map(Step::Tagged),
        (0..NUM_QUBITS, 0_u8..3, 0_i64..4).prop_map(|(qubit, k, v)| Step::Conditioned(qubit, k, v)),
        (arb_pair(), 1_u32..4, 0_u8..3).prop_map(|((a, b), reps, key)| Step::Call {
            a,
            b,
            reps,
            key
        }),
    ]
}

fn arb_circuit() -> impl Strategy<Value = Circuit> {
    prop::collection::vec(arb_step(), 1..=20).prop_map(|steps| {
        let shared = body();
        let mut circuit = Circuit::new();
        for step in steps {
            step.apply(&mut circuit, &shared);
        }
        circuit
    })
}

fn arb_policy() -> impl Strategy<Value = EncodingPolicy> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        prop::option::of(1_usize..32),
    )
        .prop_map(
            |(qubits, moments, operations, tags, circuits, min_len)| EncodingPolicy {
                intern_qubits: qubits,
                intern_moments: moments,
                intern_operations: operations,
                intern_tags: tags,
                intern_circuits: circuits,
                string_intern_min_len: min_len,
            },
        )
}

fn codec(policy: EncodingPolicy) -> Codec {
    Codec::new(CodecConfig {
        encoding: policy,
        ..Default::default()
    })
}

// =============================================================================
// Nested circuits
// =============================================================================

const POOL: usize = 6;

/// Qubit `i` of the pool; ids cycle through line, grid and named qubits.
fn pool_qubit(i: usize) -> QubitId {
    let n = i as i32;
    match i % 3 {
        0 => QubitId::line(n),
        1 => QubitId::grid(n, -1),
        _ => QubitId::named(format!("anc-{n}")),
    }
}

fn pool_qubits(idx: &[usize]) -> Vec<QubitId> {
    idx.iter().map(|&i| pool_qubit(i)).collect()
}

fn pool_index(qubit: &QubitId) -> usize {
    (0..POOL).find(|&i| pool_qubit(i) == *qubit).unwrap()
}

fn pool_subset(size: impl Into<SizeRange>) -> impl Strategy<Value = Vec<usize>> {
    prop::sample::subsequence((0..POOL).collect::<Vec<_>>(), size).prop_shuffle()
}

/// Key names and path segments with separators, escapes and non-ASCII text.
fn awkward_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["m", "a:b", r"back\slash", "", "ünï cødé", "7"])
        .prop_map(str::to_string)
}

fn c(value: f64) -> ParameterExpression {
    ParameterExpression::constant(value)
}

#[derive(Debug, Clone)]
enum Leaf {
    Coupler(Vec<usize>),
    Internal(Vec<usize>, f64),
    Depolarize(usize),
    RandomX(usize),
    Measure(Vec<usize>, String, Vec<bool>),
    Wait(usize),
    Reset(usize),
    Identity(Vec<usize>),
    Guarded(usize, String, Vec<String>),
}

impl Leaf {
    fn operation(&self) -> Operation {
        let op = match self {
            Leaf::Coupler(pair) => Operation::new(
                StandardGate::CouplerPulse(Box::new(CouplerPulse {
                    hold_time_ps: c(10.0),
                    rise_time_ps: c(5.0),
                    padding_time_ps: c(2.5),
                    coupling_mhz: ParameterExpression::symbol("t"),
                    q0_detune_mhz: c(0.0),
                    q1_detune_mhz: c(-1.0),
                })),
                pool_qubits(pair),
            ),
            Leaf::Internal(idx, x) => {
                let gate = InternalGate::new("custom", "lab", idx.len() as u32)
                    .with_arg("weight", Arg::Expr(c(*x)))
                    .with_arg("label", "x:y")
                    .with_arg("angle", Arg::expr(ParameterExpression::symbol("t") + c(*x)));
                Operation::new(gate, pool_qubits(idx)).map(|op| {
                    op.with_tags([Tag::Internal(InternalTag {
                        name: "note".into(),
                        namespace: "lab".into(),
                        args: BTreeMap::from([("w".to_string(), Arg::Expr(c(*x)))]),
                    })])
                })
            }
            Leaf::Depolarize(i) => Operation::new(
                NoiseChannel::Depolarizing { p: c(0.01) },
                [pool_qubit(*i)],
            ),
            Leaf::RandomX(i) => Operation::new(
                NoiseChannel::RandomGate {
                    probability: ParameterExpression::symbol("p"),
                    sub_gate: Box::new(Gate::x()),
                },
                [pool_qubit(*i)],
            ),
            Leaf::Measure(idx, name, mask) => Operation::new(
                StandardGate::Measurement {
                    key: MeasurementKey::new(name.as_str()),
                    invert_mask: mask.clone(),
                },
                pool_qubits(idx),
            ),
            Leaf::Wait(i) => Operation::new(
                StandardGate::Wait {
                    duration_nanos: ParameterExpression::symbol("t") * c(2.0),
                },
                [pool_qubit(*i)],
            ),
            Leaf::Reset(i) => {
                Operation::new(StandardGate::Reset { dimension: 3 }, [pool_qubit(*i)])
            }
            Leaf::Identity(idx) => Operation::new(StandardGate::Identity, pool_qubits(idx)),
            Leaf::Guarded(i, name, path) => Operation::new(Gate::x(), [pool_qubit(*i)]).map(|op| {
                op.with_conditions([Condition::Compare {
                    key: MeasurementKey::new(name.as_str()).with_path(path.clone()),
                    comparison: Comparison::Ge,
                    value: 1,
                }])
            }),
        };
        op.unwrap()
    }
}

/// A sub-circuit call with every optional field drawn.
#[derive(Debug, Clone)]
struct Call {
    body: Vec<Node>,
    repetitions: Repetitions,
    use_ids: bool,
    parent_path: Vec<String>,
    rename: Option<String>,
    bind: Option<f64>,
    until: bool,
    guard: Option<String>,
    permutation: Vec<usize>,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(Leaf),
    Call(Box<Call>),
}

impl Node {
    fn operation(&self) -> Operation {
        let call = match self {
            Node::Leaf(leaf) => return leaf.operation(),
            Node::Call(call) => call,
        };
        let body = build(&call.body);
        let qubit_map = QubitMap::from_pairs(
            body.all_qubits()
                .into_iter()
                .map(|q| {
                    let target = pool_qubit(call.permutation[pool_index(&q)]);
                    (q, target)
                }),
        )
        .unwrap();
        let until = call
            .until
            .then(|| body.measurement_keys().into_iter().next())
            .flatten()
            .filter(|_| call.repetitions == Repetitions::Count(1));

        let mut op = CircuitOperation::new(body)
            .with_repetitions(call.repetitions.clone())
            .unwrap()
            .with_use_repetition_ids(call.use_ids)
            .with_parent_path(call.parent_path.clone())
            .with_qubit_map(qubit_map)
            .unwrap();
        if let Some(name) = &call.rename {
            op = op.with_measurement_key_map(
                KeyMap::from_pairs([("m".to_string(), name.clone())]).unwrap(),
            );
        }
        if let Some(x) = call.bind {
            op = op.with_arg_map(ArgMap::from_pairs([("t".to_string(), c(x))]).unwrap());
        }
        if let Some(key) = until {
            op = op.with_repeat_until(Condition::Key(key)).unwrap();
        }
        let op = Operation::circuit(op);
        match &call.guard {
            Some(name) => op.with_conditions([Condition::Key(MeasurementKey::new(name.as_str()))]),
            None => op,
        }
    }
}

fn build(nodes: &[Node]) -> Circuit {
    Circuit::from_ops(nodes.iter().map(Node::operation).collect::<Vec<_>>()).unwrap()
}

fn arb_leaf() -> impl Strategy<Value = Leaf> {
    prop_oneof![
        pool_subset(2).prop_map(Leaf::Coupler),
        (pool_subset(1..=3), -4.0..4.0_f64).prop_map(|(idx, x)| Leaf::Internal(idx, x)),
        (0..POOL).prop_map(Leaf::Depolarize),
        (0..POOL).prop_map(Leaf::RandomX),
        (
            pool_subset(1..=3),
            awkward_name(),
            prop::collection::vec(any::<bool>(), 0..=3)
        )
            .prop_map(|(idx, name, mut mask)| {
                mask.truncate(idx.len());
                Leaf::Measure(idx, name, mask)
            }),
        (0..POOL).prop_map(Leaf::Wait),
        (0..POOL).prop_map(Leaf::Reset),
        pool_subset(1..=2).prop_map(Leaf::Identity),
        (0..POOL, awkward_name(), prop::collection::vec(awkward_name(), 0..2))
            .prop_map(|(i, name, path)| Leaf::Guarded(i, name, path)),
    ]
}

fn arb_repetitions() -> impl Strategy<Value = Repetitions> {
    prop_oneof![
        (0_u32..4).prop_map(Repetitions::Count),
        Just(Repetitions::Count(1)),
        prop::sample::subsequence(vec!["a", "r:1", r"x\y", "7"], 1..=3)
            .prop_map(|ids| Repetitions::Ids(ids.into_iter().map(str::to_string).collect())),
    ]
}

fn arb_node() -> impl Strategy<Value = Node> {
    arb_leaf().prop_map(Node::Leaf).prop_recursive(3, 24, 4, |inner| {
        (
            prop::collection::vec(inner, 1..4),
            arb_repetitions(),
            any::<bool>(),
            prop::collection::vec(awkward_name(), 0..2),
            prop::option::of(awkward_name()),
            prop::option::of(-1.0..1.0_f64),
            any::<bool>(),
            prop::option::of(awkward_name()),
            Just((0..POOL).collect::<Vec<_>>()).prop_shuffle(),
        )
            .prop_map(
                |(body, repetitions, use_ids, parent_path, rename, bind, until, guard, permutation)| {
                    Node::Call(Box::new(Call {
                        body,
                        repetitions,
                        use_ids,
                        parent_path,
                        rename,
                        bind,
                        until,
                        guard,
                        permutation,
                    }))
                },
            )
    })
}

fn arb_nested_circuit() -> impl Strategy<Value = Circuit> {
    prop::collection::vec(arb_node(), 1..6).prop_map(|nodes| build(&nodes))
}

// =============================================================================
// Reference collection
// =============================================================================

fn arg_refs(arg: &proto::Arg, out: &mut Vec<i32>) {
    match &arg.arg {
        Some(proto::arg::Arg::ConstantIndex(i)) => out.push(*i),
        Some(proto::arg::Arg::Func(f)) => f.args.iter().for_each(|a| arg_refs(a, out)),
        Some(proto::arg::Arg::ArgValue(proto::ArgValue {
            arg_value: Some(proto::arg_value::ArgValue::TupleValue(t)),
        })) => t.values.iter().for_each(|a| arg_refs(a, out)),
        _ => {}
    }
}

fn tag_refs(tag: &proto::Tag, out: &mut Vec<i32>) {
    if let Some(proto::tag::Tag::InternalTag(t)) = &tag.tag {
        t.tag_args.values().for_each(|a| arg_refs(a, out));
    }
}

fn operation_refs(op: &proto::Operation, out: &mut Vec<i32>) {
    out.extend(&op.qubit_constant_index);
    out.extend(&op.tag_indices);
    op.tags.iter().for_each(|t| tag_refs(t, out));
    op.conditioned_on.iter().for_each(|a| arg_refs(a, out));
    if let Some(proto::operation::Token::TokenConstantIndex(i)) = op.token {
        out.push(i);
    }
}

fn moment_refs(moment: &proto::Moment, out: &mut Vec<i32>) {
    out.extend(&moment.operation_indices);
    moment.operations.iter().for_each(|o| operation_refs(o, out));
    for call in &moment.circuit_operations {
        match &call.circuit_ref {
            Some(proto::circuit_operation::CircuitRef::CircuitConstantIndex(i)) => out.push(*i),
            Some(proto::circuit_operation::CircuitRef::CircuitValue(c)) => circuit_refs(c, out),
            None => {}
        }
        out.extend(&call.tag_indices);
        call.tags.iter().for_each(|t| tag_refs(t, out));
        call.conditioned_on.iter().for_each(|a| arg_refs(a, out));
    }
}

fn circuit_refs(circuit: &proto::Circuit, out: &mut Vec<i32>) {
    out.extend(&circuit.moment_indices);
    out.extend(&circuit.tag_indices);
    circuit.tags.iter().for_each(|t| tag_refs(t, out));
    circuit.moments.iter().for_each(|m| moment_refs(m, out));
}

fn constant_refs(constant: &proto::Constant) -> Vec<i32> {
    let mut out = Vec::new();
    match &constant.const_value {
        Some(ConstValue::CircuitValue(c)) => circuit_refs(c, &mut out),
        Some(ConstValue::MomentValue(m)) => moment_refs(m, &mut out),
        Some(ConstValue::OperationValue(o)) => operation_refs(o, &mut out),
        Some(ConstValue::TagValue(t)) => tag_refs(t, &mut out),
        _ => {}
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn roundtrip_default_policy(circuit in arb_circuit()) {
        let codec = Codec::default();
        let decoded = codec.decode(&codec.encode(&circuit)).unwrap();
        prop_assert_eq!(decoded, circuit);
    }

    #[test]
    fn roundtrip_inline_policy(circuit in arb_circuit()) {
        let codec = codec(EncodingPolicy::inline());
        let program = codec.to_proto(&circuit);
        prop_assert!(program.constants.is_empty());
        prop_assert_eq!(codec.decode_program(&program).unwrap(), circuit);
    }

    #[test]
    fn roundtrip_any_policy(circuit in arb_circuit(), policy in arb_policy()) {
        let codec = codec(policy);
        let decoded = codec.decode(&codec.encode(&circuit)).unwrap();
        prop_assert_eq!(decoded, circuit);
    }

    #[test]
    fn constants_only_reference_earlier_entries(circuit in arb_circuit(), policy in arb_policy()) {
        let program = codec(policy).to_proto(&circuit);
        for (at, constant) in program.constants.iter().enumerate() {
            for index in constant_refs(constant) {
                prop_assert!(index >= 0 && (index as usize) < at, "entry {} references {}", at, index);
            }
        }
        if let Some(proto::program::Program::Circuit(body)) = &program.program {
            let mut refs = Vec::new();
            circuit_refs(body, &mut refs);
            for index in refs {
                prop_assert!((index as usize) < program.constants.len());
            }
        }
    }

    #[test]
    fn roundtrip_nested_calls(circuit in arb_nested_circuit(), policy in arb_policy()) {
        let codec = codec(policy);
        let decoded = codec.decode(&codec.encode(&circuit)).unwrap();
        prop_assert_eq!(decoded, circuit);
    }

    #[test]
    fn nested_constants_only_reference_earlier_entries(
        circuit in arb_nested_circuit(),
        policy in arb_policy(),
    ) {
        let program = codec(policy).to_proto(&circuit);
        for (at, constant) in program.constants.iter().enumerate() {
            for index in constant_refs(constant) {
                prop_assert!(index >= 0 && (index as usize) < at, "entry {} references {}", at, index);
            }
        }
    }

    #[test]
    fn flattened_encoding_has_no_calls(circuit in arb_circuit()) {
        let codec = Codec::default();
        let expected = circuit.flattened(&codec.config().flatten).unwrap();
        let decoded = codec.decode(&codec.encode_flattened(&circuit).unwrap()).unwrap();
        prop_assert!(!decoded.has_circuit_operations());
        prop_assert_eq!(decoded, expected);
    }
}
