//! Room lifecycle management for Volley.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! simulation state, its two player slots and its tick scheduler.
//!
//! # Key types
//!
//! - [`RoomManager`]: creates and ends rooms, routes joins, paddle input
//!   and disconnects
//! - [`RoomHandle`]: sends commands to a running room actor
//! - [`PlayerSender`]: a player's bounded outbound queue
//! - [`RoomPhase`]: waiting for a second player, or playing
//! - [`RoomConfig`]: tick rate and channel sizing

pub mod code;
mod config;
mod error;
mod manager;
mod outbound;
mod room;

pub use config::{RoomConfig, RoomPhase};
pub use error::RoomError;
pub use manager::RoomManager;
pub use outbound::PlayerSender;
pub use room::{RoomHandle, RoomInfo};
