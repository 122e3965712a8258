//! Authoritative simulation for Volley rooms.
//!
//! Everything in this crate is synchronous and owns no tasks. A room
//! actor holds one [`SimulationState`] and calls, once per tick:
//!
//! ```text
//! effects::step(&mut state, now_ms, &mut rng);   // special ruleset only
//! physics::step(&mut state, &mut rng);
//! ```
//!
//! # Key types
//!
//! - [`SimulationState`]: paddles, ball(s), scores, active effects
//! - [`Mode`]: the ruleset-tagged part of the state (one ball vs many)
//! - [`Ruleset`] / [`Role`]: the tags shared with the wire protocol
//! - [`EffectKind`] / [`ActiveEffect`]: timed modifiers

pub mod constants;
pub mod effects;
pub mod physics;
mod state;

pub use effects::{ActiveEffect, EffectKind, EffectReport};
pub use state::{Ball, Mode, Paddle, Role, Ruleset, SimulationState};
