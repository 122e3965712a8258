//! Error types for the room layer.

use volley_protocol::RoomCode;

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// Both player slots are occupied.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The room's actor has stopped and its command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}
