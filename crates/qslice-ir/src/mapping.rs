//! Ordered substitution tables.
//!
//! A [`Mapping`] is applied as one simultaneous substitution: every lookup
//! goes against the table as constructed, never against partially
//! substituted output. Identifiers without an entry pass through unchanged.

use rustc_hash::FxHashMap;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use crate::error::{IrError, IrResult};
use crate::parameter::ParameterExpression;
use crate::qubit::QubitId;

/// An ordered list of `(source, target)` pairs with unique sources.
#[derive(Debug, Clone)]
pub struct Mapping<K, V> {
    entries: Vec<(K, V)>,
    index: FxHashMap<K, usize>,
}

/// Qubit remapping table.
pub type QubitMap = Mapping<QubitId, QubitId>;
/// Measurement-key name remapping table.
pub type KeyMap = Mapping<String, String>;
/// Symbol-to-expression substitution table.
pub type ArgMap = Mapping<String, ParameterExpression>;

impl<K, V> Default for Mapping<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<K, V> Mapping<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from pairs, in order.
    ///
    /// A source repeated with the same target is collapsed into one entry; a
    /// source repeated with a different target is rejected.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (K, V)>) -> IrResult<Self>
    where
        K: fmt::Display,
        V: PartialEq + fmt::Display,
    {
        let mut map = Self::default();
        for (key, value) in pairs {
            if let Some(&i) = map.index.get(&key) {
                let first = &map.entries[i].1;
                if *first != value {
                    return Err(IrError::ConflictingMapping {
                        key: key.to_string(),
                        first: first.to_string(),
                        second: value.to_string(),
                    });
                }
                continue;
            }
            map.index.insert(key.clone(), map.entries.len());
            map.entries.push((key, value));
        }
        Ok(map)
    }

    /// Look up the target of `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Whether `key` has an entry.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Iterate over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Mapping<T, T>
where
    T: Eq + Hash + Clone,
{
    /// Map one identifier, passing unmapped identifiers through.
    pub fn apply(&self, key: &T) -> T {
        self.get(key).cloned().unwrap_or_else(|| key.clone())
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for Mapping<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
