//! Room configuration and phase.

use serde::{Deserialize, Serialize};
use volley_sim::constants::TICK_RATE_HZ;
use volley_tick::TickConfig;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room a [`RoomManager`](crate::RoomManager)
/// creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Simulation ticks per second while a match is playing.
    pub tick_rate_hz: u32,

    /// Capacity of each room's command channel.
    pub command_channel_size: usize,

    /// Upper bound on the random delay before a match's first tick.
    pub tick_jitter_us: u64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: TICK_RATE_HZ,
            command_channel_size: 64,
            tick_jitter_us: 2_000,
        }
    }
}

impl RoomConfig {
    /// The scheduler settings for one room.
    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            start_jitter_us: self.tick_jitter_us,
            ..TickConfig::with_rate(self.tick_rate_hz)
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Where a room is in its lifecycle.
///
/// ```text
/// Waiting ──(both slots filled)──▶ Playing
///    ▲                                │
///    └──────(one player leaves)───────┘
/// ```
///
/// A room leaves both phases for good when it is ended or when its last
/// player disconnects; the actor then stops and the code is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    /// At most one slot is filled. No ticks run.
    Waiting,
    /// Both slots are filled and the scheduler is running.
    Playing,
}

impl RoomPhase {
    /// Returns `true` if a join can still find a free slot.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if the room is ticking.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Playing => write!(f, "Playing"),
        }
    }
}
