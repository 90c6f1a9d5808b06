//! Transactional progress operations on top of a [`ProgressStore`].
//!
//! The store's unit of consistency is the whole medal collection: every
//! update reads it, replaces one medal and writes it back. Two concurrent
//! writers can therefore drop each other's updates; callers keep a single
//! writer at a time.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::medal::{default_medals, Medal};
use crate::storage::ProgressStore;

/// A medal before and after a point grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalUpdate {
    pub previous: Medal,
    pub updated: Medal,
}

impl MedalUpdate {
    pub fn leveled_up(&self) -> bool {
        self.updated.current_level > self.previous.current_level
    }
}

/// Grants points to medals and persists the result.
pub struct ProgressUpdater<S: ProgressStore + ?Sized> {
    store: Arc<S>,
}

impl<S: ProgressStore + ?Sized> ProgressUpdater<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Adds `points` to the medal with `medal_id`, leveling it up once if the
    /// threshold is crossed, and persists the whole collection.
    ///
    /// Returns `Ok(None)` when no medal has that id; nothing is written then.
    pub fn apply_points(&self, medal_id: u32, points: u32) -> Result<Option<MedalUpdate>, StoreError> {
        let mut medals = self.store.load_medals()?;
        let Some(slot) = medals.iter_mut().find(|m| m.id == medal_id) else {
            return Ok(None);
        };

        let previous = slot.clone();
        let updated = previous.add_points(points).level_up();
        *slot = updated.clone();

        self.store.save_medals(&medals)?;
        Ok(Some(MedalUpdate { previous, updated }))
    }
}

/// Restores every medal to its default and clears the tap streak.
pub fn reset_all_progress<S: ProgressStore + ?Sized>(store: &S) -> Result<(), StoreError> {
    store.save_medals(&default_medals())?;
    store.set_tap_count(0)?;
    store.set_last_tap_time(0)?;
    tracing::info!("all medal progress reset to defaults");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, Slot};

    fn store_with(medal: Medal) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let mut medals = default_medals();
        let idx = (medal.id - 1) as usize;
        medals[idx] = medal;
        store.save_medals(&medals).unwrap();
        store
    }

    #[test]
    fn crossing_threshold_levels_up_with_remainder() {
        let medal = Medal {
            current_points: 50,
            ..default_medals()[0].clone()
        };
        let store = store_with(medal);
        let updater = ProgressUpdater::new(Arc::clone(&store));

        let update = updater.apply_points(1, 60).unwrap().unwrap();
        assert_eq!(update.previous.current_points, 50);
        assert_eq!(update.updated.current_level, 2);
        assert_eq!(update.updated.current_points, 10);
        assert!(update.leveled_up());

        let stored = store.load_medals().unwrap();
        assert_eq!(stored[0], update.updated);
    }

    #[test]
    fn grant_below_threshold_only_adds_points() {
        let store = Arc::new(MemoryStore::new());
        let updater = ProgressUpdater::new(Arc::clone(&store));
        let update = updater.apply_points(3, 4).unwrap().unwrap();
        assert_eq!(update.updated.current_points, 4);
        assert!(!update.leveled_up());
    }

    #[test]
    fn unknown_medal_is_a_miss_and_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.load_medals().unwrap();
        let writes_before = store.writes(Slot::Medals);

        let updater = ProgressUpdater::new(Arc::clone(&store));
        assert!(updater.apply_points(99, 5).unwrap().is_none());
        assert_eq!(store.writes(Slot::Medals), writes_before);
    }

    #[test]
    fn maxed_medal_is_left_alone() {
        let medal = Medal {
            current_level: 6,
            current_points: 0,
            ..default_medals()[6].clone()
        };
        let store = store_with(medal.clone());
        let updater = ProgressUpdater::new(store);
        let update = updater.apply_points(7, 5).unwrap().unwrap();
        assert_eq!(update.updated, medal);
    }

    #[test]
    fn large_grant_advances_only_one_level() {
        let store = Arc::new(MemoryStore::new());
        let updater = ProgressUpdater::new(Arc::clone(&store));
        let update = updater.apply_points(1, 250).unwrap().unwrap();
        assert_eq!(update.updated.current_level, 2);
        assert_eq!(update.updated.current_points, 150);
    }

    #[test]
    fn reset_restores_defaults_and_clears_taps() {
        let store = Arc::new(MemoryStore::new());
        ProgressUpdater::new(Arc::clone(&store))
            .apply_points(2, 5)
            .unwrap();
        store.set_tap_count(4).unwrap();
        store.set_last_tap_time(123).unwrap();

        reset_all_progress(store.as_ref()).unwrap();

        assert_eq!(store.load_medals().unwrap(), default_medals());
        assert_eq!(store.tap_count().unwrap(), 0);
        assert_eq!(store.last_tap_time().unwrap(), 0);
    }
}
