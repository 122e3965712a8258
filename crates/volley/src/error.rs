//! Unified error type for the Volley server.

use volley_protocol::ProtocolError;
use volley_room::RoomError;
use volley_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum VolleyError {
    /// Connection, send or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode or decode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Room not found, full or stopped.
    #[error(transparent)]
    Room(#[from] RoomError),
}
