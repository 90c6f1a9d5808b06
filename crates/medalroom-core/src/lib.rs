//! # Medalroom Core Library
//!
//! This library provides the progress engine behind the Medalroom medal
//! collection. Front ends (the `medalroom` CLI, or any UI) drive it and
//! observe its state; all progress lives in a [`ProgressStore`].
//!
//! ## Architecture
//!
//! - **Medal**: value type with pure add-points / level-up rules
//! - **Storage**: a slot-based [`ProgressStore`] trait with SQLite and
//!   in-memory backends, plus TOML-based configuration
//! - **Progress**: whole-collection read-modify-write updates and reset
//! - **Points Engine**: a cancellable background task that grants random
//!   points every cycle and publishes level-ups
//! - **Tap Guard**: a debounced tap streak that wipes all progress
//!
//! ## Key Components
//!
//! - [`PointsEngine`]: Scheduler and state machine
//! - [`TapGuard`]: Multi-tap reset detector
//! - [`ProgressUpdater`]: Point grants against the store
//! - [`Database`]: SQLite persistence
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod medal;
pub mod progress;
pub mod storage;
pub mod tap_guard;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineState, PointsEngine};
pub use error::{ConfigError, CoreError, StoreError};
pub use events::{Event, StopReason};
pub use medal::{default_medals, Medal, LEVEL_UP_THRESHOLD};
pub use progress::{reset_all_progress, MedalUpdate, ProgressUpdater};
pub use storage::{Config, Database, EngineConfig, MemoryStore, ProgressStore, Slot, TapConfig};
pub use tap_guard::TapGuard;
