//! Medal entity and its pure progress rules.
//!
//! A medal gains points until it crosses [`LEVEL_UP_THRESHOLD`], then levels
//! up and keeps the remainder. Once `current_level` reaches `max_level` the
//! medal is frozen: further grants are ignored.

use serde::{Deserialize, Serialize};

/// Points needed to advance one level.
pub const LEVEL_UP_THRESHOLD: u32 = 100;

/// One achievement and its leveled progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medal {
    pub id: u32,
    pub name: String,
    /// Always >= 1.
    pub current_level: u32,
    pub current_points: u32,
    /// Always >= 1.
    pub max_level: u32,
    /// Opaque display token (an emoji in the default set).
    pub icon: String,
}

impl Medal {
    pub fn new(id: u32, name: impl Into<String>, max_level: u32, icon: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            current_level: 1,
            current_points: 0,
            max_level,
            icon: icon.into(),
        }
    }

    pub fn is_max_level(&self) -> bool {
        self.current_level >= self.max_level
    }

    /// 0.0 .. 1.0 progress toward the next level; 1.0 once maxed.
    pub fn progress_fraction(&self) -> f64 {
        if self.is_max_level() {
            1.0
        } else {
            (self.current_points % LEVEL_UP_THRESHOLD) as f64 / LEVEL_UP_THRESHOLD as f64
        }
    }

    /// Returns a copy with `points` added, or an unchanged copy when maxed.
    #[must_use]
    pub fn add_points(&self, points: u32) -> Self {
        if self.is_max_level() {
            return self.clone();
        }
        Self {
            current_points: self.current_points.saturating_add(points),
            ..self.clone()
        }
    }

    /// Advances at most one level.
    ///
    /// Leftover points above the next threshold stay un-leveled until the
    /// following call.
    #[must_use]
    pub fn level_up(&self) -> Self {
        if self.is_max_level() || self.current_points < LEVEL_UP_THRESHOLD {
            return self.clone();
        }
        Self {
            current_level: self.current_level + 1,
            current_points: self.current_points - LEVEL_UP_THRESHOLD,
            ..self.clone()
        }
    }
}

/// The seed collection written on first use and on every reset.
pub fn default_medals() -> Vec<Medal> {
    vec![
        Medal::new(1, "Explorador", 10, "🗺️"),
        Medal::new(2, "Guerrero", 8, "⚔️"),
        Medal::new(3, "Sabio", 12, "📚"),
        Medal::new(4, "Artista", 7, "🎨"),
        Medal::new(5, "Atleta", 9, "🏃"),
        Medal::new(6, "Constructor", 11, "🔨"),
        Medal::new(7, "Líder", 6, "👑"),
        Medal::new(8, "Innovador", 10, "💡"),
        Medal::new(9, "Guardián", 8, "🛡️"),
        Medal::new(10, "Maestro", 15, "🎓"),
    ]
}
