//! Debounced multi-tap detector guarding the full progress reset.
//!
//! Each tap within `timeout_ms` of the previous one extends the streak; a
//! longer gap restarts it at 1. When the streak reaches `threshold` the
//! guard wipes all progress and reports it to the caller.

use std::sync::{Arc, Mutex};

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::progress::reset_all_progress;
use crate::storage::{ProgressStore, TapConfig};

pub struct TapGuard<S: ProgressStore + ?Sized, C: Clock = SystemClock> {
    store: Arc<S>,
    clock: C,
    config: TapConfig,
    /// Serializes the read-modify-write of the tap slots.
    gate: Mutex<()>,
}

impl<S: ProgressStore + ?Sized> TapGuard<S, SystemClock> {
    pub fn new(store: Arc<S>, config: TapConfig) -> Self {
        Self::with_clock(store, SystemClock, config)
    }
}

impl<S: ProgressStore + ?Sized, C: Clock> TapGuard<S, C> {
    pub fn with_clock(store: Arc<S>, clock: C, config: TapConfig) -> Self {
        Self {
            store,
            clock,
            config,
            gate: Mutex::new(()),
        }
    }

    /// Registers one tap. Returns `true` when this tap completed a streak and
    /// progress has been reset.
    pub fn handle_tap(&self) -> Result<bool, StoreError> {
        let _gate = self.gate.lock()?;

        let now = self.clock.now_ms();
        let last_tap_at = self.store.last_tap_time()?;
        let tap_count = self.store.tap_count()?;

        let new_count = if now.saturating_sub(last_tap_at) > self.config.timeout_ms {
            1
        } else {
            tap_count.saturating_add(1)
        };

        self.store.set_tap_count(new_count)?;
        self.store.set_last_tap_time(now)?;
        tracing::debug!(tap_count = new_count, "tap registered");

        if new_count >= self.config.threshold {
            reset_all_progress(self.store.as_ref())?;
            return Ok(true);
        }
        Ok(false)
    }
}
