//! The messages exchanged between browser clients and the server.
//!
//! Both directions are internally tagged by a camelCase `type` field,
//! with camelCase field names:
//!
//! ```json
//! {"type":"paddleMove","roomCode":"K3Q9Z","role":"playerB","y":120}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use volley_sim::{Role, Ruleset, SimulationState};

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// The short code players share to meet in a room.
///
/// Generated codes are [`RoomCode::LEN`] characters drawn from
/// [`RoomCode::ALPHABET`]. Codes arriving from clients are taken as-is
/// and simply fail to match any room if malformed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Length of a generated code.
    pub const LEN: usize = 5;

    /// Characters a generated code is drawn from.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this code could have been generated by the server.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::LEN
            && self.0.bytes().all(|b| Self::ALPHABET.contains(&b))
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// An intent sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Open a new room with the sender as `playerA`.
    CreateRoom {
        /// Defaults to [`Ruleset::Normal`] when omitted.
        #[serde(default)]
        ruleset: Ruleset,
    },

    /// Take the free slot in an existing room.
    JoinRoom { room_code: RoomCode },

    /// Move the paddle for `role` to `y` (top edge, field units).
    ///
    /// The role is trusted as sent; it is not checked against the slot
    /// the sender occupies.
    PaddleMove {
        room_code: RoomCode,
        role: Role,
        y: f64,
    },

    /// End the match and close the room for both players.
    EndGame { room_code: RoomCode },
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// A notification sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Sent to the creator. The creator is `playerA`.
    RoomCreated { room_code: RoomCode },

    /// Sent to a successful joiner.
    RoomJoined { room_code: RoomCode, role: Role },

    /// The room already has two players.
    RoomFull,

    /// No room has that code.
    RoomNotFound,

    /// Both slots are filled and the room has started ticking.
    StartGame { ruleset: Ruleset },

    /// Full snapshot, sent every tick and after every paddle move.
    GameState { state: SimulationState },

    /// The room was ended; clients return to idle.
    GameEnded,

    /// A client frame could not be understood.
    Error { message: String },
}
