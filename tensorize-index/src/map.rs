use std::io::Write;

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use tensorize_result::{Error, Result};

use crate::key::TypedKey;
use crate::transform::KeyTransform;

/// Insertion-ordered count map so that `SortPolicy::None` can reproduce
/// encounter order.
type CountMap = indexmap::IndexMap<TypedKey, i64, FxBuildHasher>;

/// Ordering policy for a mode's surviving keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortPolicy {
    /// Keep first-encounter (insertion) order.
    None,
    /// Sort by the displayed key text.
    #[default]
    Lex,
    /// Sort by the natural order of the typed key, so integer and float
    /// keys compare as numbers (`"9"` before `"10"`), not as strings.
    Num,
}

/// Lifecycle of an index map.
///
/// Operations are legal only in specific states; out-of-order calls are
/// rejected with [`Error::Lifecycle`] instead of silently misbehaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MapState {
    /// Accepting `add` (and `sub`, which moves to `Pruning`).
    Collecting,
    /// Counts are being retracted; no further `add` calls.
    Pruning,
    /// Dense mapping built; only lookups and writes.
    Finalized,
}

/// Construct and maintain a mapping of keys to contiguous tensor indices.
///
/// One `IndexMap` backs one tensor mode. During the counting pass every raw
/// field value is transformed and its count incremented with [`add`]; the
/// pruning pass retracts rows with [`sub`]; [`build_map`] then assigns each
/// surviving key (count > 0) a dense 1-based index under the mode's
/// [`SortPolicy`], after which [`index_of`] resolves raw values to
/// coordinates.
///
/// Raw values the transform cannot convert are recorded as skipped and
/// warned about once per distinct value; they never enter the count table,
/// so their `get_count` is 0 and the owning rows get pruned.
///
/// [`add`]: IndexMap::add
/// [`sub`]: IndexMap::sub
/// [`build_map`]: IndexMap::build_map
/// [`index_of`]: IndexMap::index_of
#[derive(Debug)]
pub struct IndexMap {
    name: String,
    transform: KeyTransform,
    sort: SortPolicy,
    counts: CountMap,
    dense: FxHashMap<TypedKey, u64>,
    /// Surviving keys in dense-index order; `ordered[i]` maps to `i + 1`.
    ordered: Vec<TypedKey>,
    skipped: FxHashSet<String>,
    state: MapState,
}

impl IndexMap {
    pub fn new(name: impl Into<String>, transform: KeyTransform, sort: SortPolicy) -> Self {
        Self {
            name: name.into(),
            transform,
            sort,
            counts: CountMap::default(),
            dense: FxHashMap::default(),
            ordered: Vec::new(),
            skipped: FxHashSet::default(),
            state: MapState::Collecting,
        }
    }

    /// The mode name this map was created for (used in diagnostics).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Increment the count of a key.
    ///
    /// A raw value the transform rejects is a no-op for counting; the first
    /// occurrence of each distinct rejected value emits a warning.
    pub fn add(&mut self, raw: &str) -> Result<()> {
        if self.state != MapState::Collecting {
            return Err(Error::Lifecycle(format!(
                "mode '{}': add() after counting has finished",
                self.name
            )));
        }
        match self.transform.apply(raw) {
            Some(key) => {
                *self.counts.entry(key).or_insert(0) += 1;
            }
            None => {
                if self.skipped.insert(raw.to_string()) {
                    tracing::warn!(mode = %self.name, key = %raw, "skipping unconvertible key");
                }
            }
        }
        Ok(())
    }

    /// Decrement the count of a key.
    ///
    /// Used only during the pruning pass; the entry stays in the table so a
    /// count of zero (or below) marks the key as dead rather than unknown.
    /// Unknown and unconvertible raw values are no-ops.
    pub fn sub(&mut self, raw: &str) -> Result<()> {
        match self.state {
            MapState::Collecting => self.state = MapState::Pruning,
            MapState::Pruning => {}
            MapState::Finalized => {
                return Err(Error::Lifecycle(format!(
                    "mode '{}': sub() after the dense mapping was built",
                    self.name
                )));
            }
        }
        if let Some(key) = self.transform.apply(raw) {
            if let Some(count) = self.counts.get_mut(&key) {
                *count -= 1;
            }
        }
        Ok(())
    }

    /// Current occurrence count of a key; 0 for unknown or unconvertible
    /// raw values.
    pub fn get_count(&self, raw: &str) -> i64 {
        self.transform
            .apply(raw)
            .and_then(|key| self.counts.get(&key).copied())
            .unwrap_or(0)
    }

    /// Compile the dense mapping of surviving keys onto `1..=U`.
    ///
    /// Surviving keys are those whose count stayed above zero. They are
    /// ordered per the mode's [`SortPolicy`] and assigned contiguous 1-based
    /// indices. Must be called exactly once; a second call is a lifecycle
    /// error, as is any [`index_of`] lookup beforehand.
    ///
    /// [`index_of`]: IndexMap::index_of
    pub fn build_map(&mut self) -> Result<()> {
        if self.state == MapState::Finalized {
            return Err(Error::Lifecycle(format!(
                "mode '{}': build_map() called twice",
                self.name
            )));
        }

        let mut survivors: Vec<TypedKey> = self
            .counts
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(key, _)| key.clone())
            .collect();

        match self.sort {
            SortPolicy::None => {}
            SortPolicy::Lex => survivors.sort_by_cached_key(|key| key.to_string()),
            SortPolicy::Num => survivors.sort(),
        }

        self.dense.reserve(survivors.len());
        for (position, key) in survivors.iter().enumerate() {
            self.dense.insert(key.clone(), position as u64 + 1);
        }
        self.ordered = survivors;
        self.state = MapState::Finalized;
        Ok(())
    }

    /// Whether [`build_map`](IndexMap::build_map) has run.
    pub fn is_finalized(&self) -> bool {
        self.state == MapState::Finalized
    }

    /// Dense 1-based index of a raw value.
    ///
    /// `Ok(None)` means the key was pruned or never seen (including
    /// unconvertible values) and the owning row must be dropped; it is not
    /// an error. Calling this before the dense mapping exists is.
    pub fn index_of(&self, raw: &str) -> Result<Option<u64>> {
        if self.state != MapState::Finalized {
            return Err(Error::Lifecycle(format!(
                "mode '{}': must call build_map() before looking up indices",
                self.name
            )));
        }
        Ok(self
            .transform
            .apply(raw)
            .and_then(|key| self.dense.get(&key).copied()))
    }

    /// Number of surviving keys; 0 before finalization.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Write the inverse listing: one surviving key per line, where line N
    /// holds the key mapped to index N.
    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        if self.state != MapState::Finalized {
            return Err(Error::Lifecycle(format!(
                "mode '{}': must call build_map() before writing the key file",
                self.name
            )));
        }
        for key in &self.ordered {
            writeln!(out, "{key}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_after_finalize_is_rejected() {
        let mut map = IndexMap::new("m", KeyTransform::Str, SortPolicy::Lex);
        map.add("a").unwrap();
        map.build_map().unwrap();
        assert!(matches!(map.add("b"), Err(Error::Lifecycle(_))));
        assert!(matches!(map.sub("a"), Err(Error::Lifecycle(_))));
    }

    #[test]
    fn lookup_before_build_is_an_error() {
        let mut map = IndexMap::new("m", KeyTransform::Str, SortPolicy::Lex);
        map.add("a").unwrap();
        assert!(matches!(map.index_of("a"), Err(Error::Lifecycle(_))));
    }

    #[test]
    fn build_map_twice_is_rejected() {
        let mut map = IndexMap::new("m", KeyTransform::Str, SortPolicy::Lex);
        map.add("a").unwrap();
        map.build_map().unwrap();
        assert!(matches!(map.build_map(), Err(Error::Lifecycle(_))));
    }

    #[test]
    fn unconvertible_keys_are_skipped_not_counted() {
        let mut map = IndexMap::new("m", KeyTransform::Int, SortPolicy::Num);
        map.add("12").unwrap();
        map.add("twelve").unwrap();
        map.add("twelve").unwrap();
        assert_eq!(map.get_count("twelve"), 0);
        assert_eq!(map.get_count("12"), 1);
        map.build_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.index_of("twelve").unwrap(), None);
    }

    #[test]
    fn transformed_keys_collide_by_value() {
        let mut map = IndexMap::new("m", KeyTransform::Int, SortPolicy::Num);
        map.add("007").unwrap();
        map.add("7").unwrap();
        assert_eq!(map.get_count("7"), 2);
        map.build_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.index_of("007").unwrap(), Some(1));
    }
}
