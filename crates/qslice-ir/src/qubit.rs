//! Qubit and measurement-key identifiers.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier for an addressable qubit.
///
/// Equality, ordering and hashing follow the canonical id returned by
/// [`QubitId::proto_id`], so `Named("3")` and `Line(3)` are the same qubit.
/// [`QubitId::named`] builds the canonical variant directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QubitId {
    /// A qubit on a line, addressed by position.
    Line(i32),
    /// A qubit on a 2D grid.
    Grid {
        /// Grid row.
        row: i32,
        /// Grid column.
        col: i32,
    },
    /// A qubit addressed by name.
    Named(String),
}

impl QubitId {
    /// Create a line qubit.
    pub fn line(x: i32) -> Self {
        QubitId::Line(x)
    }

    /// Create a grid qubit.
    pub fn grid(row: i32, col: i32) -> Self {
        QubitId::Grid { row, col }
    }

    /// Create a named qubit, normalising names that spell a line or grid id.
    pub fn named(name: impl Into<String>) -> Self {
        Self::from_proto_id(&name.into())
    }

    /// Canonical string id used on the wire.
    pub fn proto_id(&self) -> String {
        match self {
            QubitId::Line(x) => x.to_string(),
            QubitId::Grid { row, col } => format!("{row}_{col}"),
            QubitId::Named(name) => name.clone(),
        }
    }

    /// Parse a canonical string id.
    pub fn from_proto_id(id: &str) -> Self {
        match Canonical::parse(id) {
            Canonical::Line(x) => QubitId::Line(x),
            Canonical::Grid(row, col) => QubitId::Grid { row, col },
            Canonical::Named(name) => QubitId::Named(name.to_string()),
        }
    }

    fn canonical(&self) -> Canonical<'_> {
        match self {
            QubitId::Line(x) => Canonical::Line(*x),
            QubitId::Grid { row, col } => Canonical::Grid(*row, *col),
            QubitId::Named(name) => Canonical::parse(name),
        }
    }
}

/// Borrowed canonical form behind the comparison traits.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Canonical<'a> {
    Line(i32),
    Grid(i32, i32),
    Named(&'a str),
}

impl<'a> Canonical<'a> {
    fn parse(id: &'a str) -> Self {
        if let Ok(x) = id.parse::<i32>() {
            return Canonical::Line(x);
        }
        if let Some((row, col)) = id.split_once('_') {
            if let (Ok(row), Ok(col)) = (row.parse::<i32>(), col.parse::<i32>()) {
                return Canonical::Grid(row, col);
            }
        }
        Canonical::Named(id)
    }
}

impl PartialEq for QubitId {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for QubitId {}

impl Hash for QubitId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl PartialOrd for QubitId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QubitId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical() {
            Canonical::Line(x) => write!(f, "q({x})"),
            Canonical::Grid(row, col) => write!(f, "q({row}, {col})"),
            Canonical::Named(name) => write!(f, "{name}"),
        }
    }
}

impl From<i32> for QubitId {
    fn from(x: i32) -> Self {
        QubitId::Line(x)
    }
}

/// Separator between path components in a qualified key string.
pub const KEY_PATH_SEPARATOR: char = ':';

/// Identifier correlating a measurement with its reported result.
///
/// `path` holds the enclosing scopes (outermost first) of keys measured
/// inside repeated or nested sub-circuits. `index` selects which record of a
/// key that is measured several times; `-1` means the most recent one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeasurementKey {
    /// The key name.
    pub name: String,
    /// Enclosing scope names, outermost first.
    pub path: Vec<String>,
    /// Lookback index into the records of this key.
    pub index: i32,
}

impl MeasurementKey {
    /// Lookback index selecting the most recent record.
    pub const MOST_RECENT: i32 = -1;

    /// Create a top-level key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: vec![],
            index: Self::MOST_RECENT,
        }
    }

    /// Parse a qualified `"outer:inner:name"` string.
    pub fn parse(qualified: &str) -> Self {
        let mut parts: Vec<String> = qualified
            .split(KEY_PATH_SEPARATOR)
            .map(str::to_string)
            .collect();
        let name = parts.pop().unwrap_or_default();
        Self {
            name,
            path: parts,
            index: Self::MOST_RECENT,
        }
    }

    /// Replace the scope path.
    #[must_use]
    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }

    /// Replace the lookback index.
    #[must_use]
    pub fn with_index(mut self, index: i32) -> Self {
        self.index = index;
        self
    }

    /// Replace the name, keeping path and index.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Prepend scopes to the path.
    #[must_use]
    pub fn with_path_prefix(mut self, prefix: &[String]) -> Self {
        if !prefix.is_empty() {
            let mut path = prefix.to_vec();
            path.append(&mut self.path);
            self.path = path;
        }
        self
    }

    /// The `"outer:inner:name"` form, without the index.
    pub fn qualified_name(&self) -> String {
        if self.path.is_empty() {
            return self.name.clone();
        }
        let mut out = self.path.join(":");
        out.push(KEY_PATH_SEPARATOR);
        out.push_str(&self.name);
        out
    }

    /// Whether both keys name the same record stream, ignoring the index.
    pub fn same_stream(&self, other: &MeasurementKey) -> bool {
        self.name == other.name && self.path == other.path
    }
}

impl fmt::Display for MeasurementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

impl From<&str> for MeasurementKey {
    fn from(name: &str) -> Self {
        MeasurementKey::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_display() {
        assert_eq!(QubitId::line(3).to_string(), "q(3)");
        assert_eq!(QubitId::grid(1, 2).to_string(), "q(1, 2)");
        assert_eq!(QubitId::named("anc").to_string(), "anc");
    }

    #[test]
    fn test_proto_id_roundtrip() {
        for q in [
            QubitId::line(-4),
            QubitId::grid(5, -1),
            QubitId::named("ancilla_a"),
        ] {
            assert_eq!(QubitId::from_proto_id(&q.proto_id()), q);
        }
    }

    #[test]
    fn test_named_normalises_numeric_names() {
        assert_eq!(QubitId::named("7"), QubitId::line(7));
        assert_eq!(QubitId::named("2_3"), QubitId::grid(2, 3));
        assert_eq!(QubitId::named("a_3"), QubitId::Named("a_3".into()));
    }

    #[test]
    fn test_named_spelling_of_line_id_is_same_qubit() {
        use std::collections::BTreeSet;

        let spelled = QubitId::Named("3".into());
        assert_eq!(spelled, QubitId::line(3));
        assert_eq!(QubitId::Named("1_2".into()), QubitId::grid(1, 2));
        assert_eq!(spelled.to_string(), "q(3)");
        assert_eq!(QubitId::from_proto_id(&spelled.proto_id()), spelled);

        let hashed: rustc_hash::FxHashSet<QubitId> =
            [spelled.clone(), QubitId::line(3)].into_iter().collect();
        assert_eq!(hashed.len(), 1);
        let ordered: BTreeSet<QubitId> =
            [QubitId::line(4), spelled, QubitId::line(2)].into_iter().collect();
        assert_eq!(
            ordered.into_iter().collect::<Vec<_>>(),
            [QubitId::line(2), QubitId::line(3), QubitId::line(4)]
        );
    }

    #[test]
    fn test_qubit_ordering() {
        let mut qs = vec![QubitId::line(2), QubitId::line(0), QubitId::line(1)];
        qs.sort();
        assert_eq!(qs, vec![QubitId::line(0), QubitId::line(1), QubitId::line(2)]);
    }

    #[test]
    fn test_measurement_key_paths() {
        let key = MeasurementKey::new("m").with_path_prefix(&["0".into()]);
        let key = key.with_path_prefix(&["outer".into()]);
        assert_eq!(key.path, vec!["outer".to_string(), "0".to_string()]);
        assert_eq!(key.qualified_name(), "outer:0:m");
        assert_eq!(MeasurementKey::parse("outer:0:m"), key);
    }

    #[test]
    fn test_measurement_key_equality_includes_index() {
        let a = MeasurementKey::new("m");
        let b = MeasurementKey::new("m").with_index(0);
        assert_ne!(a, b);
        assert!(a.same_stream(&b));
    }
}
