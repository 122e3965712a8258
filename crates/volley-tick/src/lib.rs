//! Fixed-timestep tick scheduler for Volley.
//!
//! One [`TickScheduler`] drives one room. It is created stopped, so a
//! room that is still waiting for its second player never ticks, and is
//! started once the match begins:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* join, paddle, end, ... */ }
//!         tick = scheduler.wait_for_tick() => {
//!             let now_ms = tick.elapsed.as_millis() as u64;
//!             effects::step(&mut state, now_ms, &mut rng);
//!             physics::step(&mut state, &mut rng);
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```
//!
//! `wait_for_tick` only reads scheduler fields before its single await,
//! so dropping it from a losing `select!` branch loses nothing.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a room's tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Ticks per second.
    pub tick_rate_hz: u32,
    /// Random delay (0–max µs) added before the first tick after each
    /// start, so rooms matched in the same instant do not tick in lockstep.
    pub start_jitter_us: u64,
    /// Fraction of the tick budget (0.0–1.0) above which a tick's own
    /// work is reported as slow.
    pub budget_warn_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            start_jitter_us: 2_000,
            budget_warn_threshold: 0.80,
        }
    }
}

impl TickConfig {
    /// Highest supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// A config for `tick_rate_hz` with default jitter and threshold.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps the rate into `1..=MAX_TICK_RATE_HZ` and the threshold into
    /// `0.0..=1.0`. Called by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz == 0 || self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            let clamped = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
            warn!(
                rate = self.tick_rate_hz,
                clamped, "tick_rate_hz out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Duration of one tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Returned by [`TickScheduler::wait_for_tick`] for each tick.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Ticks since the last [`TickScheduler::start`], starting at 1.
    pub tick: u64,
    /// Fixed step, always `1 / tick_rate`.
    pub dt: Duration,
    /// Simulated time since the last start: `tick * dt`.
    pub elapsed: Duration,
    /// Wall-clock ticks dropped because this one fired late.
    pub ticks_skipped: u64,
}

/// Counters over the scheduler's whole lifetime.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    pub max_tick_time: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-timestep scheduler for a single room.
///
/// Late ticks are never replayed: if the room falls behind, the missed
/// wall-clock ticks are counted and the next tick is scheduled from now.
/// The simulated clock only advances by `dt` per tick that actually ran.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    running: bool,
    next_tick: Option<TokioInstant>,
    tick: u64,
    elapsed: Duration,
    tick_start: Option<Instant>,
    metrics: TickMetrics,
    rng: StdRng,
}

impl TickScheduler {
    /// Creates a stopped scheduler.
    pub fn new(config: TickConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates a stopped scheduler whose start jitter is drawn from `rng`.
    pub fn with_rng(config: TickConfig, rng: StdRng) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();
        debug!(
            rate_hz = config.tick_rate_hz,
            budget_ms = tick_duration.as_secs_f64() * 1000.0,
            "tick scheduler created"
        );
        Self {
            config,
            tick_duration,
            running: false,
            next_tick: None,
            tick: 0,
            elapsed: Duration::ZERO,
            tick_start: None,
            metrics: TickMetrics::default(),
            rng,
        }
    }

    /// A stopped scheduler for `tick_rate_hz` with default settings.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Starts ticking and restarts the simulated clock at zero.
    ///
    /// Returns `false` without touching anything if already running, so
    /// a room can never end up with two cadences.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        let jitter = if self.config.start_jitter_us > 0 {
            Duration::from_micros(self.rng.random_range(0..self.config.start_jitter_us))
        } else {
            Duration::ZERO
        };
        self.running = true;
        self.tick = 0;
        self.elapsed = Duration::ZERO;
        self.next_tick = Some(TokioInstant::now() + self.tick_duration + jitter);
        debug!(jitter_us = jitter.as_micros() as u64, "tick scheduler started");
        true
    }

    /// Stops ticking. `wait_for_tick` pends until the next `start`.
    ///
    /// Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.next_tick = None;
        self.tick_start = None;
        debug!(tick = self.tick, "tick scheduler stopped");
        true
    }

    /// Waits until the next tick is due.
    ///
    /// Pends forever while stopped; the surrounding `select!` keeps
    /// serving its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let next = match self.next_tick {
            Some(next) if self.running => next,
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        let dt = self.tick_duration;
        let late_by = now.saturating_duration_since(next);
        let ticks_skipped = (late_by.as_nanos() / dt.as_nanos()) as u64;
        if ticks_skipped > 0 {
            self.metrics.total_overruns += 1;
            self.metrics.total_skipped += ticks_skipped;
            warn!(
                tick = self.tick + 1,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
            self.next_tick = Some(now + dt);
        } else {
            self.next_tick = Some(next + dt);
        }

        self.tick += 1;
        self.elapsed += dt;
        self.metrics.total_ticks += 1;
        self.tick_start = Some(Instant::now());
        trace!(tick = self.tick, "tick fired");

        TickInfo {
            tick: self.tick,
            dt,
            elapsed: self.elapsed,
            ticks_skipped,
        }
    }

    /// Marks the current tick's work as done, for budget monitoring.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let spent = start.elapsed();
        if spent > self.metrics.max_tick_time {
            self.metrics.max_tick_time = spent;
        }
        let utilization = spent.as_secs_f64() / self.tick_duration.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick,
                spent_ms = spent.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick approaching budget limit"
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ticks since the last start.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulated time since the last start.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }
}
