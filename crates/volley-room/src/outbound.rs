//! Per-player outbound queue.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use volley_protocol::ServerMessage;

/// Where a room delivers messages for one player.
///
/// Bounded, and never makes the room wait. Once the queue is down to its
/// last [`CONTROL_HEADROOM`](Self::CONTROL_HEADROOM) free slots, `gameState`
/// snapshots are dropped and those slots are kept for control messages.
/// A client that catches up simply resumes with the current snapshot.
#[derive(Debug, Clone)]
pub struct PlayerSender {
    inner: mpsc::Sender<ServerMessage>,
}

impl PlayerSender {
    /// Queue size the gateway uses unless configured otherwise.
    pub const DEFAULT_CAPACITY: usize = 32;

    /// Free slots that only control messages may use.
    pub const CONTROL_HEADROOM: usize = 8;

    /// A queue for up to `capacity` messages, raised so that at least one
    /// snapshot fits above the headroom.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(Self::CONTROL_HEADROOM + 1));
        (Self { inner: tx }, rx)
    }

    /// Queues `msg` without waiting. Returns `false` if it was dropped.
    pub fn send(&self, msg: ServerMessage) -> bool {
        if matches!(msg, ServerMessage::GameState { .. })
            && self.inner.capacity() <= Self::CONTROL_HEADROOM
        {
            tracing::trace!("outbound queue backed up, dropping snapshot");
            return false;
        }
        match self.inner.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(msg)) => {
                tracing::warn!(msg = ?msg, "outbound queue full, dropping message");
                false
            }
            // The player is already leaving.
            Err(TrySendError::Closed(_)) => false,
        }
    }
}
