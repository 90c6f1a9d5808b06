use serde::{Deserialize, Serialize};

use crate::medal::Medal;

/// Observable engine state.
///
/// Published through a watch channel: observers always see the latest value
/// and are woken on change, but intermediate values may be skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub running: bool,
    /// Set for the level-up window after a medal levels up.
    pub last_level_up: Option<Medal>,
}
