//! Wire protocol for Volley.
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`RoomCode`]): the
//!   messages exchanged with browser clients. Every message is a single
//!   JSON object discriminated by its `type` field.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (ClientMessage) → Rooms
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientMessage, RoomCode, ServerMessage};

// The types a message refers to, so callers need only this crate.
pub use volley_sim::{Role, Ruleset, SimulationState};
pub use volley_transport::ConnectionId;
