//! Room configuration and lifecycle phase.

use std::time::Duration;

use doodle_clue::DEFAULT_CLOSE_THRESHOLD;
use doodle_timer::TimerConfig;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room a registry creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    /// Roster size at which a waiting room starts. Never below 2.
    pub min_players: usize,

    /// How long a turn lasts before it is forced to advance.
    pub turn_timeout: Duration,

    /// Fuzzy ratio a wrong guess must exceed to be reported as close.
    pub close_threshold: u8,

    /// Capacity of each room's command queue. Senders wait when it is
    /// full.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            turn_timeout: TimerConfig::default().turn_duration,
            close_threshold: DEFAULT_CLOSE_THRESHOLD,
            channel_size: 64,
        }
    }
}

impl RoomConfig {
    /// Smallest roster that can hold an active game.
    pub const MIN_ACTIVE_ROSTER: usize = 2;

    pub fn with_turn_timeout(mut self, turn_timeout: Duration) -> Self {
        self.turn_timeout = turn_timeout;
        self
    }

    pub fn with_close_threshold(mut self, close_threshold: u8) -> Self {
        self.close_threshold = close_threshold;
        self
    }

    /// Fixes out-of-range values: `min_players` is raised to 2,
    /// `close_threshold` capped at 100, `channel_size` at least 1.
    pub fn validated(mut self) -> Self {
        if self.min_players < Self::MIN_ACTIVE_ROSTER {
            tracing::warn!(
                requested = self.min_players,
                "min_players below 2, raising to 2"
            );
            self.min_players = Self::MIN_ACTIVE_ROSTER;
        }
        self.close_threshold = self.close_threshold.min(100);
        self.channel_size = self.channel_size.max(1);
        self
    }

    pub(crate) fn timer_config(&self) -> TimerConfig {
        TimerConfig::with_turn_duration(self.turn_timeout)
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Whether a room has a game running.
///
/// ```text
/// Waiting ──(roster reaches min_players)──▶ Active
///    ▲                                        │  ▲
///    └────────(roster drops below 2)──────────┘  │
///                                   (win / timeout / drawer left)
/// ```
///
/// There is no terminal phase; a room oscillates until it is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    Waiting,
    Active,
}

impl RoomPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Active => write!(f, "Active"),
        }
    }
}
