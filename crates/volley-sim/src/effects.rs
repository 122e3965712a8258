//! Timed random modifiers for the special ruleset.
//!
//! An effect is applied once when it is rolled and reverted once when it
//! expires. Its record sitting in `active_effects` means "applied, not
//! yet reverted". Reversal always targets every ball rather than the
//! balls a given effect touched, so overlapping effects of the same kind
//! interact: two stacked `speedBoost`s are both divided out on expiry
//! even if a serve reset the velocity in between.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    CENTER_X, CENTER_Y, EFFECT_DURATION_MS, EFFECT_INTERVAL_MS,
    SPEED_BOOST_FACTOR,
};
use crate::{Ball, Mode, SimulationState};

/// The kinds of modifier that can be rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    /// Every ball 1.5× faster until expiry.
    SpeedBoost,
    /// A second ball until expiry.
    DoubleBall,
    /// Every ball's horizontal direction flips, vertical maybe. Permanent.
    DirectionChange,
}

impl EffectKind {
    /// All kinds, in roll order.
    pub const ALL: [EffectKind; 3] =
        [Self::SpeedBoost, Self::DoubleBall, Self::DirectionChange];

    /// Picks one kind uniformly.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpeedBoost => write!(f, "speedBoost"),
            Self::DoubleBall => write!(f, "doubleBall"),
            Self::DirectionChange => write!(f, "directionChange"),
        }
    }
}

/// An applied effect waiting for its expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEffect {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    /// Simulated ms when it was applied.
    pub activated_at: u64,
    /// Simulated ms after which it is reverted.
    pub expiry_time: u64,
}

/// What [`step`] did this tick, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectReport {
    pub rolled: Option<EffectKind>,
    pub expired: Vec<EffectKind>,
}

impl EffectReport {
    pub fn is_empty(&self) -> bool {
        self.rolled.is_none() && self.expired.is_empty()
    }
}

/// Runs the effect cadence for one tick at simulated time `now_ms`.
///
/// Rolls a new effect when more than [`EFFECT_INTERVAL_MS`] have passed
/// since the last roll, then reverts every effect whose expiry is in the
/// past. Does nothing for normal-ruleset states.
pub fn step<R: Rng + ?Sized>(
    state: &mut SimulationState,
    now_ms: u64,
    rng: &mut R,
) -> EffectReport {
    let mut report = EffectReport::default();
    let Mode::Special {
        balls,
        last_effect_time,
        active_effects,
    } = &mut state.mode
    else {
        return report;
    };

    if now_ms.saturating_sub(*last_effect_time) > EFFECT_INTERVAL_MS {
        let kind = EffectKind::roll(rng);
        apply(balls, kind, rng);
        active_effects.push(ActiveEffect {
            kind,
            activated_at: now_ms,
            expiry_time: now_ms + EFFECT_DURATION_MS,
        });
        *last_effect_time = now_ms;
        report.rolled = Some(kind);
    }

    active_effects.retain(|effect| {
        if now_ms > effect.expiry_time {
            revert(balls, effect.kind);
            report.expired.push(effect.kind);
            false
        } else {
            true
        }
    });

    report
}

fn apply<R: Rng + ?Sized>(balls: &mut Vec<Ball>, kind: EffectKind, rng: &mut R) {
    match kind {
        EffectKind::SpeedBoost => {
            for ball in balls.iter_mut() {
                ball.vx *= SPEED_BOOST_FACTOR;
                ball.vy *= SPEED_BOOST_FACTOR;
            }
        }
        EffectKind::DoubleBall => {
            if balls.len() < 2 {
                if let Some(first) = balls.first().copied() {
                    balls.push(Ball {
                        x: CENTER_X,
                        y: CENTER_Y,
                        vx: -first.vx,
                        vy: first.vy,
                    });
                }
            }
        }
        EffectKind::DirectionChange => {
            for ball in balls.iter_mut() {
                ball.vx = -ball.vx;
                if rng.random_bool(0.5) {
                    ball.vy = -ball.vy;
                }
            }
        }
    }
}

fn revert(balls: &mut Vec<Ball>, kind: EffectKind) {
    match kind {
        EffectKind::SpeedBoost => {
            for ball in balls.iter_mut() {
                ball.vx /= SPEED_BOOST_FACTOR;
                ball.vy /= SPEED_BOOST_FACTOR;
            }
        }
        EffectKind::DoubleBall => balls.truncate(1),
        EffectKind::DirectionChange => {}
    }
}
