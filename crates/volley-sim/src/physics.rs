//! One fixed tick of ball motion, collision, and scoring.
//!
//! Collision is tested against the post-integration position only. A
//! ball moving further than a paddle's depth in one tick can be scored
//! even though it also bounced; this mirrors what clients already see.

use rand::Rng;

use crate::constants::{
    BALL_RADIUS, FIELD_HEIGHT, FIELD_WIDTH, LEFT_PADDLE_X, MAX_SPEED,
    PADDLE_HEIGHT, RIGHT_PADDLE_X, SERVE_SPEED, SPEED_INCREMENT,
};
use crate::{Ball, Role, Ruleset, SimulationState};

/// Advances every ball by one tick and applies any points scored.
///
/// `rng` is only consulted for special-mode serves.
pub fn step<R: Rng + ?Sized>(state: &mut SimulationState, rng: &mut R) {
    let SimulationState {
        player_a,
        player_b,
        score_a,
        score_b,
        mode,
    } = state;
    let ruleset = mode.ruleset();

    for ball in mode.balls_mut() {
        let Some(scorer) = advance(ball, player_a.y, player_b.y) else {
            continue;
        };
        match scorer {
            Role::PlayerA => *score_a += 1,
            Role::PlayerB => *score_b += 1,
        }
        match ruleset {
            Ruleset::Normal => serve_back(ball),
            Ruleset::Special => serve_random(ball, rng),
        }
    }
}

/// Moves one ball and resolves walls and paddles. Returns who scored.
fn advance(ball: &mut Ball, left_y: f64, right_y: f64) -> Option<Role> {
    ball.x += ball.vx;
    ball.y += ball.vy;

    if ball.y < BALL_RADIUS || ball.y > FIELD_HEIGHT - BALL_RADIUS {
        ball.vy = -ball.vy;
    }

    if ball.x < LEFT_PADDLE_X && within_paddle(left_y, ball.y) && ball.vx < 0.0
    {
        rebound(ball);
    }
    if ball.x > RIGHT_PADDLE_X
        && within_paddle(right_y, ball.y)
        && ball.vx > 0.0
    {
        rebound(ball);
    }

    if ball.x < 0.0 {
        Some(Role::PlayerB)
    } else if ball.x > FIELD_WIDTH {
        Some(Role::PlayerA)
    } else {
        None
    }
}

fn within_paddle(paddle_y: f64, y: f64) -> bool {
    y >= paddle_y && y < paddle_y + PADDLE_HEIGHT
}

/// Sends the ball back the way it came, a little faster.
fn rebound(ball: &mut Ball) {
    ball.vx = accelerate(-ball.vx, SPEED_INCREMENT);
    ball.vy = accelerate(ball.vy, SPEED_INCREMENT / 2.0);
}

/// Pushes `v` further along its sign, never past `MAX_SPEED`.
/// Zero counts as negative.
fn accelerate(v: f64, increment: f64) -> f64 {
    if v.abs() >= MAX_SPEED {
        return v;
    }
    let pushed = if v > 0.0 { v + increment } else { v - increment };
    pushed.clamp(-MAX_SPEED, MAX_SPEED)
}

/// Normal reset: serve toward the side that just scored.
fn serve_back(ball: &mut Ball) {
    ball.recenter();
    ball.vx = -ball.vx;
}

/// Special reset: fresh random serve.
fn serve_random<R: Rng + ?Sized>(ball: &mut Ball, rng: &mut R) {
    ball.recenter();
    ball.vx = if rng.random_bool(0.5) {
        SERVE_SPEED
    } else {
        -SERVE_SPEED
    };
    ball.vy = rng.random_range(-SERVE_SPEED..SERVE_SPEED);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mode;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn normal_with(ball: Ball) -> SimulationState {
        let mut state = SimulationState::new(Ruleset::Normal);
        state.mode = Mode::Normal { ball };
        state
    }

    fn ball(x: f64, y: f64, vx: f64, vy: f64) -> Ball {
        Ball { x, y, vx, vy }
    }

    #[test]
    fn test_one_tick_integrates_velocity() {
        let mut state = SimulationState::new(Ruleset::Normal);
        step(&mut state, &mut rng());
        assert_eq!(state.balls()[0], ball(405.0, 205.0, 5.0, 5.0));
    }

    #[test]
    fn test_wall_bounce_thresholds() {
        // 386 + 5 = 391 > 390 → bounce.
        let mut state = normal_with(ball(400.0, 386.0, 1.0, 5.0));
        step(&mut state, &mut rng());
        assert_eq!(state.balls()[0].vy, -5.0);

        // 385 + 5 = 390 is not past the threshold.
        let mut state = normal_with(ball(400.0, 385.0, 1.0, 5.0));
        step(&mut state, &mut rng());
        assert_eq!(state.balls()[0].vy, 5.0);

        // 14 - 5 = 9 < 10 → bounce.
        let mut state = normal_with(ball(400.0, 14.0, 1.0, -5.0));
        step(&mut state, &mut rng());
        assert_eq!(state.balls()[0].vy, 5.0);
    }

    #[test]
    fn test_left_paddle_rebound_speeds_ball_up() {
        // Paddle A spans [150, 250).
        let mut state = normal_with(ball(33.0, 200.0, -5.0, 2.0));
        step(&mut state, &mut rng());
        let b = state.balls()[0];
        assert_eq!(b.x, 28.0);
        assert_eq!(b.vx, 5.25);
        assert_eq!(b.vy, 2.125);
    }

    #[test]
    fn test_right_paddle_rebound_speeds_ball_up() {
        let mut state = normal_with(ball(767.0, 200.0, 5.0, -2.0));
        step(&mut state, &mut rng());
        let b = state.balls()[0];
        assert_eq!(b.vx, -5.25);
        assert_eq!(b.vy, -2.125);
    }

    #[test]
    fn test_zero_vy_is_pushed_upward_on_rebound() {
        let mut state = normal_with(ball(33.0, 200.0, -5.0, 0.0));
        step(&mut state, &mut rng());
        assert_eq!(state.balls()[0].vy, -0.125);
    }

    #[test]
    fn test_paddle_span_is_half_open() {
        // Top edge counts as a hit.
        let mut state = normal_with(ball(33.0, 150.0, -5.0, 0.0));
        step(&mut state, &mut rng());
        assert!(state.balls()[0].vx > 0.0);

        // Bottom edge (150 + 100) does not.
        let mut state = normal_with(ball(33.0, 250.0, -5.0, 0.0));
        step(&mut state, &mut rng());
        assert!(state.balls()[0].vx < 0.0);
    }

    #[test]
    fn test_ball_moving_away_from_paddle_does_not_rebound() {
        let mut state = normal_with(ball(20.0, 200.0, 5.0, 0.0));
        step(&mut state, &mut rng());
        assert_eq!(state.balls()[0].vx, 5.0);
    }

    #[test]
    fn test_speed_never_exceeds_cap_after_many_rebounds() {
        let mut state = normal_with(ball(34.0, 180.0, -5.0, 5.0));
        let mut rng = rng();
        for _ in 0..200 {
            {
                let b = &mut state.balls_mut()[0];
                b.x = 34.0;
                b.y = 180.0;
                b.vx = -b.vx.abs();
                b.vy = b.vy.abs();
            }
            step(&mut state, &mut rng);
            let b = state.balls()[0];
            assert!(b.vx.abs() <= MAX_SPEED, "vx = {}", b.vx);
            assert!(b.vy.abs() <= MAX_SPEED, "vy = {}", b.vy);
        }
        let b = state.balls()[0];
        assert_eq!(b.vx, MAX_SPEED);
        assert_eq!(b.vy, MAX_SPEED);
        assert_eq!((state.score_a, state.score_b), (0, 0));
    }

    #[test]
    fn test_left_miss_scores_for_b_and_flips_serve() {
        // Paddle A spans [150, 250); the ball passes below it.
        let mut state = normal_with(ball(4.0, 300.0, -5.0, 0.0));
        step(&mut state, &mut rng());

        assert_eq!((state.score_a, state.score_b), (0, 1));
        let b = state.balls()[0];
        assert_eq!((b.x, b.y), (400.0, 200.0));
        assert_eq!(b.vx, 5.0);
    }

    #[test]
    fn test_right_miss_scores_for_a_and_negates_vx() {
        let mut state = normal_with(ball(797.0, 50.0, 6.5, 3.0));
        step(&mut state, &mut rng());

        assert_eq!((state.score_a, state.score_b), (1, 0));
        let b = state.balls()[0];
        assert_eq!((b.x, b.y), (400.0, 200.0));
        assert_eq!(b.vx, -6.5);
        assert_eq!(b.vy, 3.0);
    }

    #[test]
    fn test_fast_ball_scores_despite_rebound() {
        // Known limitation: no swept test, so a ball that reaches x < 0
        // in one tick is scored even though it hit the paddle.
        let mut state = normal_with(ball(35.0, 200.0, -40.0, 0.0));
        step(&mut state, &mut rng());
        assert_eq!(state.score_b, 1);
        assert_eq!(state.balls()[0].vx, -40.0);
    }

    #[test]
    fn test_special_reset_serves_randomly_within_bounds() {
        let mut rng = rng();
        for _ in 0..50 {
            let mut state = SimulationState::new(Ruleset::Special);
            state.balls_mut()[0] = ball(797.0, 50.0, 5.0, 0.0);
            step(&mut state, &mut rng);

            assert_eq!(state.score_a, 1);
            let b = state.balls()[0];
            assert_eq!((b.x, b.y), (400.0, 200.0));
            assert!(b.vx == 5.0 || b.vx == -5.0);
            assert!((-5.0..5.0).contains(&b.vy));
        }
    }

    #[test]
    fn test_every_special_ball_is_simulated() {
        let mut state = SimulationState::new(Ruleset::Special);
        if let Mode::Special { balls, .. } = &mut state.mode {
            balls.push(ball(100.0, 100.0, -1.0, 1.0));
        }
        step(&mut state, &mut rng());
        assert_eq!(state.balls()[0], ball(405.0, 205.0, 5.0, 5.0));
        assert_eq!(state.balls()[1], ball(99.0, 101.0, -1.0, 1.0));
    }
}
