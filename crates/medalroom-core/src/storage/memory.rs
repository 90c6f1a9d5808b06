//! In-process progress store.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{ProgressStore, Slot};
use crate::error::StoreError;

/// A [`ProgressStore`] backed by a map. Nothing survives the process.
///
/// Counts writes per slot so callers can assert how often a value was
/// persisted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<Slot, String>,
    writes: HashMap<Slot, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes made to `slot` so far.
    pub fn writes(&self, slot: Slot) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.writes.get(&slot).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl ProgressStore for MemoryStore {
    fn read_slot(&self, slot: Slot) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock()?;
        Ok(inner.values.get(&slot).cloned())
    }

    fn write_slot(&self, slot: Slot, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock()?;
        inner.values.insert(slot, value.to_string());
        *inner.writes.entry(slot).or_insert(0) += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_writes_per_slot() {
        let store = MemoryStore::new();
        store.set_engine_enabled(true).unwrap();
        store.set_engine_enabled(false).unwrap();
        store.set_tap_count(1).unwrap();
        assert_eq!(store.writes(Slot::EngineEnabled), 2);
        assert_eq!(store.writes(Slot::TapCount), 1);
        assert_eq!(store.writes(Slot::Medals), 0);
    }
}
