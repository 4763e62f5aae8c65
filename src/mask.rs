//! The per-request set of word indices committed for redaction.

use std::collections::BTreeMap;

/// Word indices committed to redaction, each tagged with the detector that
/// committed it first. Only grows; inserting an index twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskIndexSet {
    entries: BTreeMap<usize, &'static str>,
}

impl MaskIndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the index was newly added.
    pub fn insert(&mut self, index: usize, detector: &'static str) -> bool {
        if self.entries.contains_key(&index) {
            return false;
        }
        self.entries.insert(index, detector);
        true
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }

    /// The detector that committed `index`, if any.
    pub fn source(&self, index: usize) -> Option<&'static str> {
        self.entries.get(&index).copied()
    }
}
