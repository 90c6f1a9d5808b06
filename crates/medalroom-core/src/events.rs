use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::medal::Medal;

/// Why the engine left the running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Caller asked to stop; the intent to run was cleared.
    Stopped,
    /// Caller paused; the intent to run is kept for a later resume.
    Paused,
    /// Every medal reached its max level.
    Exhausted,
}

/// Every engine state change produces an Event.
/// Front ends subscribe to them to render a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    EngineStarted {
        at: DateTime<Utc>,
    },
    EngineStopped {
        reason: StopReason,
        at: DateTime<Utc>,
    },
    PointsGranted {
        medal_id: u32,
        points: u32,
        current_level: u32,
        current_points: u32,
        at: DateTime<Utc>,
    },
    LevelUp {
        medal: Medal,
        at: DateTime<Utc>,
    },
    /// The level-up window closed or was dismissed.
    LevelUpCleared {
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let event = Event::EngineStopped {
            reason: StopReason::Exhausted,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "engine_stopped");
        assert_eq!(json["reason"], "exhausted");
    }
}
