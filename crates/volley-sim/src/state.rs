//! The per-room simulation state and the tags it is keyed by.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CENTER_X, CENTER_Y, PADDLE_MAX_Y, PADDLE_START_Y, SERVE_SPEED,
};
use crate::effects::ActiveEffect;

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// Which rules a room plays by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Ruleset {
    /// One ball, no modifiers.
    #[default]
    Normal,
    /// One or more balls, timed random modifiers.
    Special,
}

impl fmt::Display for Ruleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Special => write!(f, "special"),
        }
    }
}

/// Which paddle a connection controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Left paddle, the room creator.
    PlayerA,
    /// Right paddle.
    PlayerB,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayerA => write!(f, "playerA"),
            Self::PlayerB => write!(f, "playerB"),
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A paddle. Only its top edge is stored; `x` is fixed per side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub y: f64,
}

impl Paddle {
    /// Moves the paddle to `y`, clamped into `[0, PADDLE_MAX_Y]`.
    ///
    /// Returns `false` and leaves the paddle alone for NaN or infinite
    /// input.
    pub fn move_to(&mut self, y: f64) -> bool {
        if !y.is_finite() {
            return false;
        }
        self.y = y.clamp(0.0, PADDLE_MAX_Y);
        true
    }
}

impl Default for Paddle {
    fn default() -> Self {
        Self { y: PADDLE_START_Y }
    }
}

/// A ball. Velocity is in field units per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Ball {
    /// The opening serve: centre of the field, moving down and right.
    pub fn serve() -> Self {
        Self {
            x: CENTER_X,
            y: CENTER_Y,
            vx: SERVE_SPEED,
            vy: SERVE_SPEED,
        }
    }

    /// Puts the ball back at the centre without touching its velocity.
    pub fn recenter(&mut self) {
        self.x = CENTER_X;
        self.y = CENTER_Y;
    }
}

// ---------------------------------------------------------------------------
// SimulationState
// ---------------------------------------------------------------------------

/// The ruleset-specific part of the state.
///
/// Serialized flat into the snapshot with a `gameType` tag, so a normal
/// snapshot carries `ball` and a special one carries `balls`,
/// `lastEffectTime` and `activeEffects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "gameType",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Mode {
    /// Exactly one ball, never any effects.
    Normal { ball: Ball },
    /// At least one ball.
    Special {
        balls: Vec<Ball>,
        /// Simulated milliseconds at the last effect roll.
        last_effect_time: u64,
        /// Effects applied but not yet reverted, oldest first.
        active_effects: Vec<ActiveEffect>,
    },
}

impl Mode {
    /// The ruleset this mode belongs to.
    pub fn ruleset(&self) -> Ruleset {
        match self {
            Self::Normal { .. } => Ruleset::Normal,
            Self::Special { .. } => Ruleset::Special,
        }
    }

    /// The balls in play. Length 1 for normal.
    pub fn balls(&self) -> &[Ball] {
        match self {
            Self::Normal { ball } => std::slice::from_ref(ball),
            Self::Special { balls, .. } => balls,
        }
    }

    /// Mutable view of the balls in play.
    pub fn balls_mut(&mut self) -> &mut [Ball] {
        match self {
            Self::Normal { ball } => std::slice::from_mut(ball),
            Self::Special { balls, .. } => balls,
        }
    }

    /// Active effects. Always empty for normal.
    pub fn active_effects(&self) -> &[ActiveEffect] {
        match self {
            Self::Normal { .. } => &[],
            Self::Special { active_effects, .. } => active_effects,
        }
    }
}

/// Everything one room simulates. Broadcast whole on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub player_a: Paddle,
    pub player_b: Paddle,
    pub score_a: u32,
    pub score_b: u32,
    #[serde(flatten)]
    pub mode: Mode,
}

impl SimulationState {
    /// The state at the start of a match.
    pub fn new(ruleset: Ruleset) -> Self {
        let mode = match ruleset {
            Ruleset::Normal => Mode::Normal { ball: Ball::serve() },
            Ruleset::Special => Mode::Special {
                balls: vec![Ball::serve()],
                last_effect_time: 0,
                active_effects: Vec::new(),
            },
        };
        Self {
            player_a: Paddle::default(),
            player_b: Paddle::default(),
            score_a: 0,
            score_b: 0,
            mode,
        }
    }

    pub fn ruleset(&self) -> Ruleset {
        self.mode.ruleset()
    }

    pub fn balls(&self) -> &[Ball] {
        self.mode.balls()
    }

    pub fn balls_mut(&mut self) -> &mut [Ball] {
        self.mode.balls_mut()
    }

    pub fn paddle(&self, role: Role) -> &Paddle {
        match role {
            Role::PlayerA => &self.player_a,
            Role::PlayerB => &self.player_b,
        }
    }

    /// Applies paddle input for `role`. See [`Paddle::move_to`].
    pub fn move_paddle(&mut self, role: Role, y: f64) -> bool {
        match role {
            Role::PlayerA => self.player_a.move_to(y),
            Role::PlayerB => self.player_b.move_to(y),
        }
    }

    /// Gives one point to `role`.
    pub fn award_point(&mut self, role: Role) {
        match role {
            Role::PlayerA => self.score_a += 1,
            Role::PlayerB => self.score_b += 1,
        }
    }
}
