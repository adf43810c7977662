//! Sub-circuit calls with repetition and remapping.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::circuit::{Circuit, FrozenCircuit};
use crate::condition::Condition;
use crate::error::{IrError, IrResult};
use crate::mapping::{ArgMap, KeyMap, QubitMap};
use crate::qubit::{MeasurementKey, QubitId};

/// How many times, and under which ids, a sub-circuit runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repetitions {
    /// Run `n` times; ids `"0".."n-1"` are synthesised when `n != 1`.
    Count(u32),
    /// Run once per id, in order.
    Ids(Vec<String>),
}

impl Default for Repetitions {
    fn default() -> Self {
        Repetitions::Count(1)
    }
}

impl Repetitions {
    /// Number of repetitions.
    pub fn count(&self) -> usize {
        match self {
            Repetitions::Count(n) => *n as usize,
            Repetitions::Ids(ids) => ids.len(),
        }
    }

    /// Concrete repetition ids, or `None` for a single implicit repetition.
    ///
    /// Allocates one string per repetition; prefer [`Repetitions::iter_ids`]
    /// or [`Repetitions::has_id`] for large counts.
    pub fn ids(&self) -> Option<Vec<String>> {
        if self.is_implicit() {
            return None;
        }
        Some(self.iter_ids().collect())
    }

    /// Repetition ids in order, produced on demand. Empty for a single
    /// implicit repetition.
    pub fn iter_ids(&self) -> Box<dyn Iterator<Item = String> + '_> {
        match self {
            Repetitions::Count(1) => Box::new(std::iter::empty()),
            Repetitions::Count(n) => Box::new((0..*n).map(|i| i.to_string())),
            Repetitions::Ids(ids) => Box::new(ids.iter().cloned()),
        }
    }

    /// Whether `id` names one of the repetitions.
    pub fn has_id(&self, id: &str) -> bool {
        match self {
            Repetitions::Count(1) => false,
            Repetitions::Count(n) => id
                .parse::<u32>()
                .is_ok_and(|i| i < *n && i.to_string() == id),
            Repetitions::Ids(ids) => ids.iter().any(|x| x == id),
        }
    }

    /// A single repetition that adds no id to measured keys.
    pub fn is_implicit(&self) -> bool {
        matches!(self, Repetitions::Count(1))
    }
}

/// Largest repetition count that can be written to the wire.
pub const MAX_REPETITIONS: u32 = i32::MAX as u32;

/// A call into a frozen sub-circuit.
///
/// The three tables are independent: the qubit map renames qubits of the
/// inner circuit, the key map renames measurement-key names, and the
/// argument map substitutes symbols. Guard conditions that decide whether
/// the call runs at all live on the wrapping [`Operation`](crate::Operation).
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitOperation {
    circuit: FrozenCircuit,
    repetitions: Repetitions,
    use_repetition_ids: bool,
    qubit_map: QubitMap,
    measurement_key_map: KeyMap,
    arg_map: ArgMap,
    parent_path: Vec<String>,
    repeat_until: Option<Condition>,
}

impl CircuitOperation {
    /// Call `circuit` once, without remapping.
    pub fn new(circuit: impl Into<FrozenCircuit>) -> Self {
        Self {
            circuit: circuit.into(),
            repetitions: Repetitions::default(),
            use_repetition_ids: true,
            qubit_map: QubitMap::new(),
            measurement_key_map: KeyMap::new(),
            arg_map: ArgMap::new(),
            parent_path: vec![],
            repeat_until: None,
        }
    }

    /// Set the repetition specification.
    ///
    /// Counts above [`MAX_REPETITIONS`] are rejected.
    pub fn with_repetitions(mut self, repetitions: Repetitions) -> IrResult<Self> {
        match &repetitions {
            Repetitions::Count(n) if *n > MAX_REPETITIONS => {
                return Err(IrError::ValueTooLarge {
                    what: "repetition count",
                    value: u64::from(*n),
                    max: u64::from(MAX_REPETITIONS),
                });
            }
            Repetitions::Ids(ids) => {
                let mut seen = FxHashSet::default();
                for id in ids {
                    if !seen.insert(id.as_str()) {
                        return Err(IrError::DuplicateRepetitionId(id.clone()));
                    }
                }
            }
            Repetitions::Count(_) => {}
        }
        if self.repeat_until.is_some() && repetitions != Repetitions::Count(1) {
            return Err(IrError::RepeatUntilWithRepetitions(format!("{repetitions:?}")));
        }
        self.repetitions = repetitions;
        Ok(self)
    }

    /// Repeat `n` times.
    pub fn repeat(self, n: u32) -> IrResult<Self> {
        self.with_repetitions(Repetitions::Count(n))
    }

    /// Repeat once per id.
    pub fn with_repetition_ids(
        self,
        ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> IrResult<Self> {
        self.with_repetitions(Repetitions::Ids(ids.into_iter().map(Into::into).collect()))
    }

    /// Whether repetition ids are added to measured keys.
    #[must_use]
    pub fn with_use_repetition_ids(mut self, use_ids: bool) -> Self {
        self.use_repetition_ids = use_ids;
        self
    }

    /// Set the qubit map. It must be injective over the inner qubits.
    pub fn with_qubit_map(mut self, map: QubitMap) -> IrResult<Self> {
        let mut images: Vec<(QubitId, QubitId)> = Vec::new();
        for q in self.circuit.all_qubits() {
            let target = map.apply(&q);
            if let Some((first, _)) = images.iter().find(|(_, t)| *t == target) {
                return Err(IrError::NonInjectiveQubitMap {
                    first: first.clone(),
                    second: q,
                    target,
                });
            }
            images.push((q, target));
        }
        self.qubit_map = map;
        Ok(self)
    }

    /// Set the qubit map from pairs.
    pub fn with_qubit_pairs(
        self,
        pairs: impl IntoIterator<Item = (QubitId, QubitId)>,
    ) -> IrResult<Self> {
        let map = QubitMap::from_pairs(pairs)?;
        self.with_qubit_map(map)
    }

    /// Set the measurement-key name map.
    #[must_use]
    pub fn with_measurement_key_map(mut self, map: KeyMap) -> Self {
        self.measurement_key_map = map;
        self
    }

    /// Set the argument map.
    #[must_use]
    pub fn with_arg_map(mut self, map: ArgMap) -> Self {
        self.arg_map = map;
        self
    }

    /// Set the scope path prepended to every key measured inside.
    #[must_use]
    pub fn with_parent_path(mut self, path: Vec<String>) -> Self {
        self.parent_path = path;
        self
    }

    /// Repeat until `condition` holds. Requires a single repetition.
    pub fn with_repeat_until(mut self, condition: Condition) -> IrResult<Self> {
        if self.repetitions != Repetitions::Count(1) {
            return Err(IrError::RepeatUntilWithRepetitions(format!(
                "{:?}",
                self.repetitions
            )));
        }
        self.repeat_until = Some(condition);
        Ok(self)
    }

    /// Replace the inner circuit, keeping every table. Used by flattening
    /// for rewrites that preserve the qubit set.
    pub(crate) fn with_circuit(mut self, circuit: Circuit) -> Self {
        self.circuit = Arc::new(circuit);
        self
    }

    pub(crate) fn replace_tables(
        mut self,
        qubit_map: QubitMap,
        measurement_key_map: KeyMap,
        arg_map: ArgMap,
        parent_path: Vec<String>,
    ) -> Self {
        self.qubit_map = qubit_map;
        self.measurement_key_map = measurement_key_map;
        self.arg_map = arg_map;
        self.parent_path = parent_path;
        self
    }

    pub(crate) fn replace_repeat_until(mut self, condition: Option<Condition>) -> Self {
        self.repeat_until = condition;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The inner circuit.
    pub fn circuit(&self) -> &FrozenCircuit {
        &self.circuit
    }

    /// The repetition specification.
    pub fn repetitions(&self) -> &Repetitions {
        &self.repetitions
    }

    /// Whether repetition ids are added to measured keys.
    pub fn use_repetition_ids(&self) -> bool {
        self.use_repetition_ids
    }

    /// The qubit map.
    pub fn qubit_map(&self) -> &QubitMap {
        &self.qubit_map
    }

    /// The measurement-key name map.
    pub fn measurement_key_map(&self) -> &KeyMap {
        &self.measurement_key_map
    }

    /// The argument map.
    pub fn arg_map(&self) -> &ArgMap {
        &self.arg_map
    }

    /// The parent scope path.
    pub fn parent_path(&self) -> &[String] {
        &self.parent_path
    }

    /// The loop condition, if any.
    pub fn repeat_until(&self) -> Option<&Condition> {
        self.repeat_until.as_ref()
    }

    /// Key path prefix of each repetition, in order, produced on demand.
    pub fn repetition_prefixes(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        let ids: Box<dyn Iterator<Item = Option<String>> + '_> = if self.repetitions.is_implicit() {
            Box::new(std::iter::once(None))
        } else {
            Box::new(self.repetitions.iter_ids().map(Some))
        };
        ids.map(move |id| {
            let mut prefix = self.parent_path.clone();
            if let Some(id) = id.filter(|_| self.use_repetition_ids) {
                prefix.push(id);
            }
            prefix
        })
    }

    /// Qubits acted on: the image of the inner qubits under the qubit map.
    pub fn qubits(&self) -> Vec<QubitId> {
        self.circuit
            .all_qubits()
            .iter()
            .map(|q| self.qubit_map.apply(q))
            .collect()
    }

    /// Keys measured by the call, as seen from outside.
    ///
    /// One key per repetition and inner key: scheduling and flattening use
    /// [`CircuitOperation::measures_stream`] instead, which does not
    /// enumerate repetitions.
    pub fn measurement_keys(&self) -> Vec<MeasurementKey> {
        let inner = self.circuit.measurement_keys();
        if inner.is_empty() || self.repetitions.count() == 0 {
            return vec![];
        }
        let prefixes: Box<dyn Iterator<Item = Vec<String>> + '_> = if self.use_repetition_ids {
            Box::new(self.repetition_prefixes())
        } else {
            Box::new(std::iter::once(self.parent_path.clone()))
        };
        let mut seen = FxHashSet::default();
        let mut keys = Vec::new();
        for prefix in prefixes {
            for key in &inner {
                let key = self.rename(key).with_path_prefix(&prefix);
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Whether the call records results in the stream of `key`, as seen from
    /// outside.
    pub fn measures_stream(&self, key: &MeasurementKey) -> bool {
        if self.repetitions.count() == 0 {
            return false;
        }
        let Some(rest) = key.path.strip_prefix(self.parent_path.as_slice()) else {
            return false;
        };
        let rest = if self.use_repetition_ids && !self.repetitions.is_implicit() {
            match rest.split_first() {
                Some((id, rest)) if self.repetitions.has_id(id) => rest,
                _ => return false,
            }
        } else {
            rest
        };
        self.inner_names(&key.name).into_iter().any(|name| {
            let inner = MeasurementKey {
                name,
                path: rest.to_vec(),
                index: key.index,
            };
            self.circuit.measures_stream(&inner)
        })
    }

    /// Keys read by conditions inside the call that are not measured
    /// inside it.
    pub fn control_keys(&self) -> Vec<MeasurementKey> {
        let mut seen = FxHashSet::default();
        let mut keys = Vec::new();
        let candidates = self
            .circuit
            .control_keys()
            .into_iter()
            .chain(self.repeat_until.iter().map(|c| c.key().clone()));
        for key in candidates {
            if self.circuit.measures_stream(&key) {
                continue;
            }
            let key = self.rename(&key);
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
        keys
    }

    /// Inner key names that the key map sends to `name`.
    fn inner_names(&self, name: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .measurement_key_map
            .iter()
            .filter(|(_, target)| target.as_str() == name)
            .map(|(source, _)| source.clone())
            .collect();
        if !self.measurement_key_map.contains_key(name) {
            names.push(name.to_string());
        }
        names
    }

    pub(crate) fn rename(&self, key: &MeasurementKey) -> MeasurementKey {
        match self.measurement_key_map.get(key.name.as_str()) {
            Some(name) => key.clone().with_name(name.clone()),
            None => key.clone(),
        }
    }
}
