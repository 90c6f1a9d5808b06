//! Persistence boundary for medal progress.
//!
//! The core only needs a handful of named slots. Backends implement raw
//! string reads and writes per [`Slot`]; the typed operations, their
//! defaults and the seed-on-first-use rule live in [`ProgressStore`]'s
//! provided methods so every backend behaves the same.

mod config;
pub mod database;
pub mod memory;

pub use config::{Config, EngineConfig, TapConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::StoreError;
use crate::medal::{default_medals, Medal};

/// Returns `~/.config/medalroom[-dev]/` based on MEDALROOM_ENV.
///
/// Set MEDALROOM_ENV=dev to use development data directory.
/// MEDALROOM_DATA_DIR overrides the location entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("MEDALROOM_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("MEDALROOM_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("medalroom-dev")
            } else {
                base_dir.join("medalroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// The fixed set of persisted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// JSON array of [`Medal`].
    Medals,
    EngineEnabled,
    TapCount,
    /// Epoch milliseconds of the last tap.
    LastTapAt,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Medals, Slot::EngineEnabled, Slot::TapCount, Slot::LastTapAt];

    pub fn key(self) -> &'static str {
        match self {
            Slot::Medals => "medal_data",
            Slot::EngineEnabled => "engine_running",
            Slot::TapCount => "avatar_tap_count",
            Slot::LastTapAt => "last_tap_time",
        }
    }
}

/// Durable key-value persistence for medal progress.
///
/// Implementations must make a write visible to every subsequent read, from
/// any caller, once `write_slot` returns. Writes replace the whole slot.
pub trait ProgressStore: Send + Sync {
    fn read_slot(&self, slot: Slot) -> Result<Option<String>, StoreError>;

    fn write_slot(&self, slot: Slot, value: &str) -> Result<(), StoreError>;

    /// Loads the medal collection, seeding the defaults when the slot is
    /// unset, empty or unparsable.
    fn load_medals(&self) -> Result<Vec<Medal>, StoreError> {
        if let Some(raw) = self.read_slot(Slot::Medals)? {
            if !raw.is_empty() {
                match serde_json::from_str::<Vec<Medal>>(&raw) {
                    Ok(medals) => return Ok(medals),
                    Err(e) => {
                        tracing::warn!(error = %e, "stored medal data is corrupt, reseeding defaults")
                    }
                }
            }
        }
        let medals = default_medals();
        self.save_medals(&medals)?;
        Ok(medals)
    }

    fn save_medals(&self, medals: &[Medal]) -> Result<(), StoreError> {
        let json = serde_json::to_string(medals)?;
        self.write_slot(Slot::Medals, &json)
    }

    fn tap_count(&self) -> Result<u32, StoreError> {
        read_scalar(self, Slot::TapCount)
    }

    fn set_tap_count(&self, count: u32) -> Result<(), StoreError> {
        self.write_slot(Slot::TapCount, &count.to_string())
    }

    fn last_tap_time(&self) -> Result<i64, StoreError> {
        read_scalar(self, Slot::LastTapAt)
    }

    fn set_last_tap_time(&self, at_ms: i64) -> Result<(), StoreError> {
        self.write_slot(Slot::LastTapAt, &at_ms.to_string())
    }

    fn engine_enabled(&self) -> Result<bool, StoreError> {
        read_scalar(self, Slot::EngineEnabled)
    }

    fn set_engine_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.write_slot(Slot::EngineEnabled, &enabled.to_string())
    }
}

/// Reads a scalar slot; absent or unparsable values fall back to the default.
fn read_scalar<S, T>(store: &S, slot: Slot) -> Result<T, StoreError>
where
    S: ProgressStore + ?Sized,
    T: FromStr + Default,
{
    Ok(store
        .read_slot(slot)?
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_seeds_ten_default_medals() {
        let store = MemoryStore::new();
        let medals = store.load_medals().unwrap();
        assert_eq!(medals.len(), 10);
        assert!(medals
            .iter()
            .all(|m| m.current_level == 1 && m.current_points == 0));
        assert!(store.read_slot(Slot::Medals).unwrap().is_some());
    }

    #[test]
    fn corrupt_medal_data_is_replaced_by_defaults() {
        let store = MemoryStore::new();
        store.write_slot(Slot::Medals, "{not json").unwrap();
        let medals = store.load_medals().unwrap();
        assert_eq!(medals, default_medals());
        let raw = store.read_slot(Slot::Medals).unwrap().unwrap();
        assert!(serde_json::from_str::<Vec<Medal>>(&raw).is_ok());
    }

    #[test]
    fn empty_medal_data_is_treated_as_absent() {
        let store = MemoryStore::new();
        store.write_slot(Slot::Medals, "").unwrap();
        assert_eq!(store.load_medals().unwrap().len(), 10);
    }

    #[test]
    fn scalar_defaults() {
        let store = MemoryStore::new();
        assert_eq!(store.tap_count().unwrap(), 0);
        assert_eq!(store.last_tap_time().unwrap(), 0);
        assert!(!store.engine_enabled().unwrap());
    }

    #[test]
    fn unparsable_scalar_reads_as_default() {
        let store = MemoryStore::new();
        store.write_slot(Slot::TapCount, "three").unwrap();
        store.write_slot(Slot::EngineEnabled, "yes").unwrap();
        assert_eq!(store.tap_count().unwrap(), 0);
        assert!(!store.engine_enabled().unwrap());
    }

    #[test]
    fn typed_writes_round_trip() {
        let store = MemoryStore::new();
        store.set_tap_count(4).unwrap();
        store.set_last_tap_time(1_700_000_000_123).unwrap();
        store.set_engine_enabled(true).unwrap();
        assert_eq!(store.tap_count().unwrap(), 4);
        assert_eq!(store.last_tap_time().unwrap(), 1_700_000_000_123);
        assert!(store.engine_enabled().unwrap());
    }
}
