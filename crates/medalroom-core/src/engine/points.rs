//! Points engine implementation.
//!
//! While running, a single background task wakes every `interval_ms`, picks
//! one medal that is not yet maxed and grants it a random number of points.
//! The store is the only source of truth: each cycle reloads the collection.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped --start/resume--> Running --stop/pause/exhausted--> Stopped
//! ```
//!
//! `stop` clears the persisted intent to run, `pause` keeps it so `resume`
//! can pick up after a restart. The engine also stops itself once every
//! medal is maxed.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = PointsEngine::new(store, config.engine);
//! let mut state = engine.subscribe();
//! engine.resume().await?;
//! while state.changed().await.is_ok() {
//!     render(&*state.borrow());
//! }
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::EngineState;
use crate::error::StoreError;
use crate::events::{Event, StopReason};
use crate::medal::Medal;
use crate::progress::{MedalUpdate, ProgressUpdater};
use crate::storage::{EngineConfig, ProgressStore};

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 64;

/// Periodic point granter with observable state.
///
/// Create one per session and share it by reference; dropping it aborts the
/// background task. Must be used from within a Tokio runtime.
pub struct PointsEngine<S: ProgressStore + ?Sized + 'static> {
    shared: Arc<Shared<S>>,
    /// Handle of the cycle task. Holding this lock serializes transitions.
    cycle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

struct Shared<S: ProgressStore + ?Sized> {
    store: Arc<S>,
    updater: ProgressUpdater<S>,
    config: EngineConfig,
    rng: Mutex<Mcg128Xsl64>,
    state: watch::Sender<EngineState>,
    events: broadcast::Sender<Event>,
}

enum CycleOutcome {
    Granted(MedalUpdate),
    /// The chosen medal disappeared between load and update.
    Missed,
    /// No medal is below its max level.
    Exhausted,
}

impl<S: ProgressStore + ?Sized + 'static> PointsEngine<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        let (state, _) = watch::channel(EngineState::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                updater: ProgressUpdater::new(Arc::clone(&store)),
                store,
                config,
                rng: Mutex::new(rng),
                state,
                events,
            }),
            cycle: tokio::sync::Mutex::new(None),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> EngineState {
        self.shared.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.borrow().running
    }

    pub fn last_level_up(&self) -> Option<Medal> {
        self.shared.state.borrow().last_level_up.clone()
    }

    /// Latest-value subscription to the engine state.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.shared.state.subscribe()
    }

    /// Stream of discrete engine events. Slow receivers lose the oldest ones.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    /// Current medal collection, for display.
    pub fn medals(&self) -> Result<Vec<Medal>, StoreError> {
        self.shared.store.load_medals()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Persists the intent to run and starts the cycle. No-op while running.
    pub async fn start(&self) -> Result<(), StoreError> {
        let mut cycle = self.cycle.lock().await;
        let alive = cycle.as_ref().is_some_and(|task| !task.is_finished());
        if alive && self.is_running() {
            return Ok(());
        }
        // A task that already decided to stop may still be winding down.
        if let Some(stale) = cycle.take() {
            stale.abort();
            let _ = stale.await;
        }

        self.shared.store.set_engine_enabled(true)?;
        self.shared.set_running(true);
        self.shared.emit(Event::EngineStarted { at: Utc::now() });
        info!(interval_ms = self.shared.config.interval_ms, "points engine started");

        *cycle = Some(tokio::spawn(run_cycles(Arc::clone(&self.shared))));
        Ok(())
    }

    /// Cancels the cycle and clears the persisted intent to run.
    pub async fn stop(&self) -> Result<(), StoreError> {
        let mut cycle = self.cycle.lock().await;
        self.halt(&mut cycle, StopReason::Stopped).await;
        // Still under the transition lock, so a racing start cannot be
        // overwritten by this write.
        self.shared.store.set_engine_enabled(false)
    }

    /// Cancels the cycle but keeps the persisted intent, so a later
    /// [`resume`](Self::resume) starts it again.
    pub async fn pause(&self) {
        let mut cycle = self.cycle.lock().await;
        self.halt(&mut cycle, StopReason::Paused).await;
    }

    /// Starts the engine if the persisted intent says it should be running.
    pub async fn resume(&self) -> Result<(), StoreError> {
        if self.shared.store.engine_enabled()? {
            self.start().await
        } else {
            debug!("resume requested but engine is not enabled");
            Ok(())
        }
    }

    /// Dismisses the current level-up notification early.
    pub fn clear_level_up(&self) {
        self.shared.clear_level_up();
    }

    /// Aborts the cycle task and waits until it is gone, so no cycle body
    /// can run after this returns. The caller holds the transition lock.
    async fn halt(&self, cycle: &mut Option<JoinHandle<()>>, reason: StopReason) {
        if let Some(task) = cycle.take() {
            task.abort();
            let _ = task.await;
        }
        self.shared.clear_level_up();
        if self.shared.set_running(false) {
            self.shared.emit(Event::EngineStopped {
                reason,
                at: Utc::now(),
            });
            info!(?reason, "points engine stopped");
        }
    }
}

impl<S: ProgressStore + ?Sized + 'static> Drop for PointsEngine<S> {
    fn drop(&mut self) {
        if let Some(task) = self.cycle.get_mut().take() {
            task.abort();
        }
    }
}

impl<S: ProgressStore + ?Sized> Shared<S> {
    /// Returns whether the value changed.
    fn set_running(&self, running: bool) -> bool {
        self.state.send_if_modified(|state| {
            if state.running == running {
                return false;
            }
            state.running = running;
            true
        })
    }

    fn publish_level_up(&self, medal: Medal) {
        self.state
            .send_modify(|state| state.last_level_up = Some(medal.clone()));
        self.emit(Event::LevelUp {
            medal,
            at: Utc::now(),
        });
    }

    fn clear_level_up(&self) {
        let cleared = self
            .state
            .send_if_modified(|state| state.last_level_up.take().is_some());
        if cleared {
            self.emit(Event::LevelUpCleared { at: Utc::now() });
        }
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// One engine cycle: pick an eligible medal and grant it points.
    fn run_cycle(&self) -> Result<CycleOutcome, StoreError> {
        let medals = self.store.load_medals()?;
        let eligible: Vec<&Medal> = medals.iter().filter(|m| !m.is_max_level()).collect();

        let (medal_id, points) = {
            let mut rng = self.rng.lock()?;
            let Some(medal) = eligible.choose(&mut *rng) else {
                return Ok(CycleOutcome::Exhausted);
            };
            let low = self.config.min_points;
            let high = self.config.max_points.max(low);
            (medal.id, rng.gen_range(low..=high))
        };

        match self.updater.apply_points(medal_id, points)? {
            Some(update) => {
                debug!(
                    medal_id,
                    points,
                    level = update.updated.current_level,
                    current_points = update.updated.current_points,
                    "points granted"
                );
                self.emit(Event::PointsGranted {
                    medal_id,
                    points,
                    current_level: update.updated.current_level,
                    current_points: update.updated.current_points,
                    at: Utc::now(),
                });
                Ok(CycleOutcome::Granted(update))
            }
            None => Ok(CycleOutcome::Missed),
        }
    }

    /// Autonomous stop: nothing is left to grant, so the intent is cleared.
    fn finish_exhausted(&self) {
        if let Err(e) = self.store.set_engine_enabled(false) {
            warn!(error = %e, "failed to persist engine stop");
        }
        if self.set_running(false) {
            self.emit(Event::EngineStopped {
                reason: StopReason::Exhausted,
                at: Utc::now(),
            });
        }
        info!("every medal is at max level, points engine stopped");
    }
}

async fn run_cycles<S: ProgressStore + ?Sized + 'static>(shared: Arc<Shared<S>>) {
    let interval = Duration::from_millis(shared.config.interval_ms);
    let display = Duration::from_millis(shared.config.level_up_display_ms);

    loop {
        match shared.run_cycle() {
            Ok(CycleOutcome::Granted(update)) => {
                if update.leveled_up() {
                    info!(
                        medal_id = update.updated.id,
                        level = update.updated.current_level,
                        "medal leveled up"
                    );
                    shared.publish_level_up(update.updated);
                    tokio::time::sleep(display).await;
                    shared.clear_level_up();
                }
            }
            Ok(CycleOutcome::Missed) => {}
            Ok(CycleOutcome::Exhausted) => {
                shared.finish_exhausted();
                return;
            }
            Err(e) => warn!(error = %e, "engine cycle failed, retrying next tick"),
        }
        tokio::time::sleep(interval).await;
    }
}
