//! Playfield constants.
//!
//! Clients draw against these exact numbers, so they are part of the
//! compatibility contract. The wall thresholds are deliberately
//! `BALL_RADIUS` in from each edge.

/// Playfield width.
pub const FIELD_WIDTH: f64 = 800.0;
/// Playfield height.
pub const FIELD_HEIGHT: f64 = 400.0;
/// Paddle height. Paddles only move vertically.
pub const PADDLE_HEIGHT: f64 = 100.0;
/// Ball radius, also the top/bottom bounce margin.
pub const BALL_RADIUS: f64 = 10.0;

/// A ball left of this x can hit the left paddle.
pub const LEFT_PADDLE_X: f64 = 30.0;
/// A ball right of this x can hit the right paddle.
pub const RIGHT_PADDLE_X: f64 = 770.0;

/// Upper bound on `|vx|` and `|vy|` reachable through paddle hits.
pub const MAX_SPEED: f64 = 15.0;
/// Horizontal speed gained per paddle hit (vertical gains half).
pub const SPEED_INCREMENT: f64 = 0.25;

/// Serve speed on both axes.
pub const SERVE_SPEED: f64 = 5.0;
/// Paddle `y` at the start of a match.
pub const PADDLE_START_Y: f64 = 150.0;

/// Minimum simulated time between two effect rolls.
pub const EFFECT_INTERVAL_MS: u64 = 10_000;
/// Lifetime of one effect.
pub const EFFECT_DURATION_MS: u64 = 5_000;
/// Velocity multiplier applied by `speedBoost`.
pub const SPEED_BOOST_FACTOR: f64 = 1.5;

/// Simulation rate.
pub const TICK_RATE_HZ: u32 = 60;

/// Field centre, where balls are served from.
pub const CENTER_X: f64 = FIELD_WIDTH / 2.0;
pub const CENTER_Y: f64 = FIELD_HEIGHT / 2.0;

/// Highest legal paddle `y`.
pub const PADDLE_MAX_Y: f64 = FIELD_HEIGHT - PADDLE_HEIGHT;
