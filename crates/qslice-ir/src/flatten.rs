//! Expansion of sub-circuit calls into plain moments.
//!
//! A call is expanded one repetition at a time. Within a repetition every
//! operation of the inner circuit is rewritten through the call's three
//! tables; keys measured inside the call additionally gain the repetition's
//! path prefix. Nested calls are not expanded by a shallow mapping: their
//! tables are composed with the outer ones instead, so that expanding them
//! later gives the same result as expanding everything at once.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::circuit::Circuit;
use crate::circuit_op::CircuitOperation;
use crate::condition::Condition;
use crate::error::{IrError, IrResult};
use crate::mapping::{ArgMap, KeyMap, QubitMap};
use crate::moment::Moment;
use crate::operation::{Operation, OperationKind};
use crate::qubit::MeasurementKey;

/// Ceilings for recursive expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenLimits {
    /// Maximum nesting depth of expanded calls.
    pub max_depth: Option<usize>,
    /// Maximum number of operations in any expansion result.
    pub max_operations: Option<usize>,
}

impl Default for FlattenLimits {
    fn default() -> Self {
        Self {
            max_depth: Some(64),
            max_operations: Some(10_000_000),
        }
    }
}

impl FlattenLimits {
    /// No ceilings.
    pub fn unlimited() -> Self {
        Self {
            max_depth: None,
            max_operations: None,
        }
    }

    fn check_depth(&self, depth: usize) -> IrResult<()> {
        match self.max_depth {
            Some(max) if depth > max => Err(IrError::FlattenLimitExceeded { limit: "depth", max }),
            _ => Ok(()),
        }
    }

    fn check_operations(&self, count: usize) -> IrResult<()> {
        match self.max_operations {
            Some(max) if count > max => Err(IrError::FlattenLimitExceeded {
                limit: "operations",
                max,
            }),
            _ => Ok(()),
        }
    }
}

impl CircuitOperation {
    /// Expand this call with the default [`FlattenLimits`].
    ///
    /// With `deep = false` nested calls stay in the result (with composed
    /// tables); with `deep = true` they are expanded recursively. A call with
    /// a `repeat_until` condition expands to a single iteration of its body.
    pub fn mapped_circuit(&self, deep: bool) -> IrResult<Circuit> {
        self.mapped_circuit_with_limits(deep, &FlattenLimits::default())
    }

    /// Expand this call, failing fast when a ceiling is exceeded.
    pub fn mapped_circuit_with_limits(&self, deep: bool, limits: &FlattenLimits) -> IrResult<Circuit> {
        Expander::new(limits).mapped(self, deep, 0)
    }
}

impl Circuit {
    /// Expand every sub-circuit call recursively, keeping moment structure.
    ///
    /// A moment holding calls becomes as many moments as its longest
    /// expansion; the moment's other operations stay in the first of them.
    /// Calls with a `repeat_until` condition cannot be unrolled and are kept,
    /// with their bodies flattened.
    #[instrument(skip_all, fields(moments = self.len()))]
    pub fn flattened(&self, limits: &FlattenLimits) -> IrResult<Circuit> {
        Expander::new(limits).unroll(self, 0)
    }
}

enum Expansion {
    Unrolled(Circuit),
    Kept(Operation),
}

/// One expansion run. `emitted` counts the operations already committed to
/// the result, so the operations ceiling is hit before anything past it is
/// built.
struct Expander<'l> {
    limits: &'l FlattenLimits,
    emitted: usize,
}

impl<'l> Expander<'l> {
    fn new(limits: &'l FlattenLimits) -> Self {
        Self { limits, emitted: 0 }
    }

    /// Whether `count` more operations stay within the ceiling.
    fn check_room(&self, count: usize) -> IrResult<()> {
        self.limits
            .check_operations(self.emitted.saturating_add(count))
    }

    /// Commit `count` operations to the result.
    fn emit(&mut self, count: usize) -> IrResult<()> {
        self.check_room(count)?;
        self.emitted += count;
        Ok(())
    }

    fn mapped(&mut self, op: &CircuitOperation, deep: bool, depth: usize) -> IrResult<Circuit> {
        self.limits.check_depth(depth)?;
        let inner = op.circuit();
        let repetitions = op.repetitions().count();
        let calls = inner
            .all_operations()
            .filter(|o| o.is_circuit_op())
            .count();
        // Every operation that is not a call lands in the result as is.
        self.check_room(repetitions.saturating_mul(inner.num_operations() - calls))?;
        self.limits
            .check_operations(repetitions.saturating_mul(inner.num_operations()))?;
        debug!(
            repetitions,
            moments = inner.len(),
            deep,
            depth,
            "mapping circuit operation"
        );

        let mut moments = Vec::with_capacity(repetitions.saturating_mul(inner.len()));
        for prefix in op.repetition_prefixes() {
            let scope = Scope { op, prefix: &prefix };
            for moment in inner.moments() {
                let ops = moment
                    .operations()
                    .iter()
                    .map(|o| scope.map_operation(o))
                    .collect::<IrResult<Vec<_>>>()?;
                moments.push(Moment::from_operations(ops)?);
            }
        }

        let circuit = Circuit::from_moments(moments);
        if deep {
            return self.unroll(&circuit, depth + 1);
        }
        self.emit(circuit.num_operations())?;
        Ok(circuit)
    }

    fn unroll(&mut self, circuit: &Circuit, depth: usize) -> IrResult<Circuit> {
        self.limits.check_depth(depth)?;
        let mut moments = Vec::with_capacity(circuit.len());
        for moment in circuit.moments() {
            if !moment.operations().iter().any(Operation::is_circuit_op) {
                self.emit(moment.len())?;
                moments.push(moment.clone());
                continue;
            }

            let mut kept = Vec::new();
            let mut expansions = Vec::new();
            for op in moment.operations() {
                if !op.is_circuit_op() {
                    self.emit(1)?;
                    kept.push(op.clone());
                    continue;
                }
                match self.expand(op, depth)? {
                    Expansion::Unrolled(c) => expansions.push(c),
                    Expansion::Kept(o) => {
                        self.emit(1)?;
                        kept.push(o);
                    }
                }
            }

            let span = expansions.iter().map(Circuit::len).max().unwrap_or(0).max(1);
            let mut slice = vec![Moment::new(); span];
            slice[0] = Moment::from_operations(kept)?;
            for expansion in &expansions {
                for (i, m) in expansion.moments().iter().enumerate() {
                    slice[i] = slice[i].with_operations(m.operations().iter().cloned())?;
                }
            }
            moments.extend(slice);
        }

        Ok(Circuit::from_moments(moments).with_tags(circuit.tags().iter().cloned()))
    }

    fn expand(&mut self, op: &Operation, depth: usize) -> IrResult<Expansion> {
        let OperationKind::Circuit(call) = op.kind() else {
            return Ok(Expansion::Kept(op.clone()));
        };

        if call.repeat_until().is_some() {
            if !call.circuit().has_circuit_operations() {
                return Ok(Expansion::Kept(op.clone()));
            }
            // The loop body is a separate expansion result.
            let body = Expander::new(self.limits).unroll(call.circuit(), depth + 1)?;
            let call = (**call).clone().with_circuit(body);
            return Ok(Expansion::Kept(op.with_circuit_op(call)));
        }

        let body = self.mapped(call, true, depth)?;
        if op.conditions().is_empty() {
            return Ok(Expansion::Unrolled(body));
        }
        let guarded = body
            .moments()
            .iter()
            .map(|m| {
                Moment::from_operations(
                    m.operations()
                        .iter()
                        .map(|o| o.clone().with_conditions(op.conditions().iter().cloned())),
                )
            })
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Expansion::Unrolled(Circuit::from_moments(guarded)))
    }
}

/// One repetition of a call being expanded.
struct Scope<'a> {
    op: &'a CircuitOperation,
    prefix: &'a [String],
}

impl Scope<'_> {
    /// Whether `key`, in the inner circuit's naming, is measured inside the
    /// call.
    fn bindable(&self, key: &MeasurementKey) -> bool {
        self.op.circuit().measures_stream(key)
    }

    fn scope_measured(&self, key: &MeasurementKey) -> MeasurementKey {
        self.op.rename(key).with_path_prefix(self.prefix)
    }

    fn map_key(&self, key: &MeasurementKey) -> MeasurementKey {
        if self.bindable(key) {
            self.scope_measured(key)
        } else {
            self.op.rename(key)
        }
    }

    fn map_condition(&self, condition: &Condition) -> Condition {
        condition.with_key(self.map_key(condition.key()))
    }

    fn map_operation(&self, op: &Operation) -> IrResult<Operation> {
        let conditions = op
            .conditions()
            .iter()
            .map(|c| self.map_condition(c))
            .collect();
        let mapped = match op.kind() {
            OperationKind::Gate(gate) => {
                let mut gate = gate.substitute(self.op.arg_map());
                if let Some(key) = gate.measurement_key() {
                    let key = self.scope_measured(key);
                    gate = gate.with_measurement_key(key);
                }
                let qubits = op
                    .qubits()
                    .iter()
                    .map(|q| self.op.qubit_map().apply(q))
                    .collect();
                op.with_gate_and_qubits(gate, qubits)?
            }
            OperationKind::Circuit(inner) => op.with_circuit_op(self.compose(inner)?),
        };
        Ok(mapped.replace_conditions(conditions))
    }

    /// Fold this scope's tables into a nested call.
    fn compose(&self, inner: &CircuitOperation) -> IrResult<CircuitOperation> {
        let outer = self.op;

        let mut qubits = Vec::new();
        for (src, dst) in inner.qubit_map().iter() {
            let target = outer.qubit_map().apply(dst);
            if target != *src {
                qubits.push((src.clone(), target));
            }
        }
        for (src, dst) in outer.qubit_map().iter() {
            if !inner.qubit_map().contains_key(src) && src != dst {
                qubits.push((src.clone(), dst.clone()));
            }
        }

        let mut keys = Vec::new();
        for (src, dst) in inner.measurement_key_map().iter() {
            let target = outer.measurement_key_map().apply(dst);
            if target != *src {
                keys.push((src.clone(), target));
            }
        }
        for (src, dst) in outer.measurement_key_map().iter() {
            if !inner.measurement_key_map().contains_key(src) && src != dst {
                keys.push((src.clone(), dst.clone()));
            }
        }

        let mut args = Vec::new();
        for (symbol, expr) in inner.arg_map().iter() {
            args.push((symbol.clone(), expr.substitute(outer.arg_map())));
        }
        for (symbol, expr) in outer.arg_map().iter() {
            if !inner.arg_map().contains_key(symbol) {
                args.push((symbol.clone(), expr.clone()));
            }
        }

        let mut path = self.prefix.to_vec();
        path.extend(inner.parent_path().iter().cloned());

        let mut composed = inner.clone();
        if inner.control_keys().iter().any(|k| self.bindable(k)) {
            // Conditions inside the nested call that read keys measured in
            // this scope must follow those keys into the new path.
            let is_target = |k: &MeasurementKey| {
                !inner.circuit().measures_stream(k) && self.bindable(&inner.rename(k))
            };
            let body = rescope_externs(inner.circuit(), &is_target, self.prefix)?;
            let repeat_until = inner
                .repeat_until()
                .map(|c| prefix_if(c, &is_target, self.prefix));
            composed = composed.with_circuit(body).replace_repeat_until(repeat_until);
        }

        Ok(composed.replace_tables(
            QubitMap::from_pairs(qubits)?,
            KeyMap::from_pairs(keys)?,
            ArgMap::from_pairs(args)?,
            path,
        ))
    }
}

fn prefix_if(
    condition: &Condition,
    is_target: &dyn Fn(&MeasurementKey) -> bool,
    prefix: &[String],
) -> Condition {
    if is_target(condition.key()) {
        condition.with_key(condition.key().clone().with_path_prefix(prefix))
    } else {
        condition.clone()
    }
}

fn rescope_externs(
    circuit: &Circuit,
    is_target: &dyn Fn(&MeasurementKey) -> bool,
    prefix: &[String],
) -> IrResult<Circuit> {
    let mut moments = Vec::with_capacity(circuit.len());
    for moment in circuit.moments() {
        let mut ops = Vec::with_capacity(moment.len());
        for op in moment.operations() {
            let conditions = op
                .conditions()
                .iter()
                .map(|c| prefix_if(c, is_target, prefix))
                .collect();
            let op = match op.circuit_op() {
                Some(call) => {
                    let nested = |k: &MeasurementKey| {
                        !call.circuit().measures_stream(k) && is_target(&call.rename(k))
                    };
                    let body = rescope_externs(call.circuit(), &nested, prefix)?;
                    let repeat_until = call.repeat_until().map(|c| prefix_if(c, &nested, prefix));
                    op.with_circuit_op(call.clone().with_circuit(body).replace_repeat_until(repeat_until))
                }
                None => op.clone(),
            };
            ops.push(op.replace_conditions(conditions));
        }
        moments.push(Moment::from_operations(ops)?);
    }
    Ok(Circuit::from_moments(moments).with_tags(circuit.tags().iter().cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{Gate, StandardGate};
    use crate::parameter::ParameterExpression;
    use crate::qubit::QubitId;

    fn q(i: i32) -> QubitId {
        QubitId::line(i)
    }

    fn op(gate: Gate, qs: &[i32]) -> Operation {
        Operation::new(gate, qs.iter().map(|&i| q(i))).unwrap()
    }

    fn body() -> Circuit {
        Circuit::from_ops(vec![
            op(StandardGate::XPow(ParameterExpression::symbol("t")).into(), &[0]),
            op(Gate::cz(), &[0, 1]),
            op(Gate::measure("m"), &[1]),
        ])
        .unwrap()
    }

    #[test]
    fn test_count_law() {
        let call = CircuitOperation::new(body()).repeat(3).unwrap();
        let out = call.mapped_circuit(false).unwrap();
        assert_eq!(out.len(), 3 * body().len());
        let keys: Vec<String> = out.measurement_keys().iter().map(ToString::to_string).collect();
        assert_eq!(keys, ["0:m", "1:m", "2:m"]);
    }

    #[test]
    fn test_zero_repetitions() {
        let call = CircuitOperation::new(body()).repeat(0).unwrap();
        assert!(call.mapped_circuit(true).unwrap().is_empty());
    }

    #[test]
    fn test_single_repetition_keeps_keys() {
        let call = CircuitOperation::new(body())
            .with_measurement_key_map(KeyMap::from_pairs([("m".into(), "result".into())]).unwrap());
        let out = call.mapped_circuit(false).unwrap();
        assert_eq!(out.measurement_keys(), vec![MeasurementKey::new("result")]);
    }

    #[test]
    fn test_maps_are_simultaneous() {
        let call = CircuitOperation::new(body())
            .with_qubit_pairs([(q(0), q(1)), (q(1), q(0))])
            .unwrap()
            .with_arg_map(
                ArgMap::from_pairs([("t".into(), ParameterExpression::constant(0.5))]).unwrap(),
            );
        let out = call.mapped_circuit(false).unwrap();
        let first = &out.moments()[0].operations()[0];
        assert_eq!(first.qubits(), &[q(1)]);
        assert_eq!(
            first.gate(),
            Some(&Gate::Standard(StandardGate::XPow(0.5.into())))
        );
        assert_eq!(out.moments()[1].operations()[0].qubits(), &[q(1), q(0)]);
    }

    #[test]
    fn test_extern_condition_keeps_path() {
        let inner = Circuit::from_ops(vec![
            op(Gate::x(), &[0]).with_conditions([Condition::Key("outside".into())]),
        ])
        .unwrap();
        let out = CircuitOperation::new(inner)
            .repeat(2)
            .unwrap()
            .mapped_circuit(false)
            .unwrap();
        for moment in out.moments() {
            assert_eq!(
                moment.operations()[0].conditions(),
                &[Condition::Key("outside".into())]
            );
        }
    }

    #[test]
    fn test_deep_matches_level_by_level() {
        let inner = CircuitOperation::new(body()).repeat(2).unwrap();
        let middle = Circuit::from_ops(vec![Operation::circuit(inner)]).unwrap();
        let outer = CircuitOperation::new(middle)
            .with_repetition_ids(["a", "b"])
            .unwrap()
            .with_qubit_pairs([(q(0), q(4))])
            .unwrap();

        let deep = outer.mapped_circuit(true).unwrap();
        assert!(!deep.has_circuit_operations());
        assert_eq!(deep.len(), 2 * 2 * body().len());

        let shallow = outer.mapped_circuit(false).unwrap();
        assert!(shallow.has_circuit_operations());
        let stepwise = shallow.flattened(&FlattenLimits::default()).unwrap();
        assert_eq!(stepwise, deep);

        let keys: Vec<String> = deep.measurement_keys().iter().map(ToString::to_string).collect();
        assert_eq!(keys, ["a:0:m", "a:1:m", "b:0:m", "b:1:m"]);
        assert!(deep.all_qubits().contains(&q(4)));
        assert!(!deep.all_qubits().contains(&q(0)));
    }

    #[test]
    fn test_sibling_condition_follows_scope() {
        let reader = Circuit::from_ops(vec![
            op(Gate::x(), &[2]).with_conditions([Condition::Key("m".into())]),
        ])
        .unwrap();
        let middle = Circuit::from_ops(vec![
            op(Gate::measure("m"), &[0]),
            Operation::circuit(CircuitOperation::new(reader)),
        ])
        .unwrap();
        let outer = CircuitOperation::new(middle).repeat(2).unwrap();

        let deep = outer.mapped_circuit(true).unwrap();
        let conditions: Vec<String> = deep
            .all_operations()
            .flat_map(|o| o.conditions().iter().map(ToString::to_string))
            .collect();
        assert_eq!(conditions, ["0:m", "1:m"]);
    }

    #[test]
    fn test_wrapping_conditions_are_inherited() {
        let call = Operation::circuit(CircuitOperation::new(body()))
            .with_conditions([Condition::Key("flag".into())]);
        let circuit = Circuit::from_ops(vec![call]).unwrap();
        let flat = circuit.flattened(&FlattenLimits::default()).unwrap();
        assert!(
            flat.all_operations()
                .all(|o| o.conditions().contains(&Condition::Key("flag".into())))
        );
    }

    #[test]
    fn test_moment_structure_preserved() {
        let call = Operation::circuit(CircuitOperation::new(body()));
        let circuit = Circuit::from_moments([
            Moment::from_operations([call, op(Gate::h(), &[7])]).unwrap(),
        ]);
        let flat = circuit.flattened(&FlattenLimits::default()).unwrap();
        assert_eq!(flat.len(), body().len());
        assert!(flat.moments()[0].operates_on(&[q(7)]));
    }

    #[test]
    fn test_depth_limit() {
        let mut circuit = body();
        for _ in 0..5 {
            circuit = Circuit::from_ops(vec![Operation::circuit(CircuitOperation::new(circuit))])
                .unwrap();
        }
        let limits = FlattenLimits {
            max_depth: Some(3),
            max_operations: None,
        };
        let err = circuit.flattened(&limits).unwrap_err();
        assert!(matches!(err, IrError::FlattenLimitExceeded { limit: "depth", .. }));
        assert!(circuit.flattened(&FlattenLimits::default()).is_ok());
    }

    #[test]
    fn test_operation_limit_fails_fast() {
        let call = CircuitOperation::new(body()).repeat(1_000).unwrap();
        let limits = FlattenLimits {
            max_depth: None,
            max_operations: Some(100),
        };
        let err = call.mapped_circuit_with_limits(false, &limits).unwrap_err();
        assert!(matches!(err, IrError::FlattenLimitExceeded { limit: "operations", .. }));
    }

    fn nested_h(levels: usize) -> Circuit {
        let mut circuit = Circuit::from_ops(vec![op(Gate::h(), &[0])]).unwrap();
        for _ in 0..levels {
            let call = CircuitOperation::new(circuit).repeat(100).unwrap();
            circuit = Circuit::from_ops(vec![Operation::circuit(call)]).unwrap();
        }
        circuit
    }

    #[test]
    fn test_operation_limit_stops_nested_expansion_early() {
        let limits = FlattenLimits {
            max_depth: None,
            max_operations: Some(10_000),
        };
        assert_eq!(nested_h(2).flattened(&limits).unwrap().num_operations(), 10_000);

        let mut expander = Expander::new(&limits);
        let err = expander.unroll(&nested_h(3), 0).unwrap_err();
        assert!(matches!(err, IrError::FlattenLimitExceeded { limit: "operations", .. }));
        assert!(expander.emitted <= 10_000);
    }
}
