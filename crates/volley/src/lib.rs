//! # Volley
//!
//! Authoritative multiplayer pong server.
//!
//! Two browser clients meet in a room by sharing a five-character code.
//! Once both are seated the room simulates the match at a fixed 60 Hz and
//! broadcasts the full state after every tick and every paddle move.
//!
//! ```text
//! volley-transport ─▶ volley-protocol ─▶ volley-room ─▶ volley-sim
//!   (WebSocket)        (JSON messages)    (actors)       (physics, effects)
//!                                            │
//!                                       volley-tick
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use volley::prelude::*;
//!
//! # async fn run() -> Result<(), VolleyError> {
//! let server = VolleyServer::builder().bind("0.0.0.0:3000").build().await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::VolleyError;
pub use server::{VolleyServer, VolleyServerBuilder};

/// Everything needed to run a server or talk to one in tests.
pub mod prelude {
    pub use crate::{VolleyError, VolleyServer, VolleyServerBuilder};
    pub use volley_protocol::{
        ClientMessage, Codec, JsonCodec, Role, RoomCode, Ruleset, ServerMessage,
        SimulationState,
    };
    pub use volley_room::{RoomConfig, RoomManager};
}
