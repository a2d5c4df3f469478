//! Timers for Snatch room actors.
//!
//! Two kinds of timer drive a room besides its command queue:
//!
//! - [`Deadline`]: a single-shot, re-armable, cancellable timeout (turn
//!   expiry, claim-lock expiry).
//! - [`Ticker`]: a fixed-period schedule (the snapshot broadcast).
//!
//! # Integration
//!
//! Both sit inside the room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         () = room.turn_deadline().expired() => room.turn_expired(),
//!         _ = ticker.wait_for_tick() => broadcast_snapshot(),
//!     }
//! }
//! ```
//!
//! A `Deadline` is plain data owned by the room: disarming it is a field
//! write made by the same task that polls it, so a superseded timeout can
//! never fire after the transition that cancelled it.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Deadline
// ---------------------------------------------------------------------------

/// A single-shot timeout that can be armed, re-armed, and disarmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// An unarmed deadline.
    pub const fn new() -> Self {
        Self { at: None }
    }

    /// Arms (or re-arms) the deadline to fire `after` from now. Any
    /// previously pending firing is superseded.
    pub fn arm(&mut self, after: Duration) {
        self.at = Some(Instant::now() + after);
    }

    /// Cancels the pending firing, if any.
    pub fn disarm(&mut self) {
        self.at = None;
    }

    /// Whether a firing is pending.
    pub fn is_armed(&self) -> bool {
        self.at.is_some()
    }

    /// Time left before the deadline fires, `None` when unarmed.
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// A future that resolves when the deadline is reached, or pends
    /// forever when unarmed.
    ///
    /// The future copies the instant out, so it borrows nothing and a
    /// `select!` branch can use it next to `&mut` borrows of the owner.
    /// It does not disarm anything; the caller must do that when handling
    /// the firing.
    pub fn expired(&self) -> impl Future<Output = ()> + Send + 'static {
        let at = self.at;
        async move {
            match at {
                Some(at) => time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Ticker configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`Ticker`].
#[derive(Debug, Clone)]
pub struct TickerConfig {
    /// Interval between ticks. `Duration::ZERO` disables the ticker
    /// (`wait_for_tick` pends forever).
    pub period: Duration,

    /// Random jitter (0 to max µs) added to the *first* tick so rooms created
    /// in the same instant don't all broadcast together.
    pub initial_jitter_us: u64,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(2),
            initial_jitter_us: 250_000,
        }
    }
}

impl TickerConfig {
    /// Shortest accepted period. Anything smaller is clamped up.
    pub const MIN_PERIOD: Duration = Duration::from_millis(10);

    /// Clamps out-of-range values. Called by [`Ticker::new`].
    pub fn validated(mut self) -> Self {
        if !self.period.is_zero() && self.period < Self::MIN_PERIOD {
            warn!(
                period_ms = self.period.as_secs_f64() * 1000.0,
                "ticker period below minimum, clamping"
            );
            self.period = Self::MIN_PERIOD;
        }
        self
    }
}

/// Information about a fired tick.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// `true` if this tick fired more than 10% of a period late.
    pub overrun: bool,
    /// Whole periods skipped because of the overrun.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Fixed-period scheduler. One per room actor.
///
/// On overrun the schedule skips ahead from "now" rather than firing a
/// burst of catch-up ticks; a late snapshot is only worth sending once.
pub struct Ticker {
    period: Option<Duration>,
    tick_count: u64,
    next_tick: Option<Instant>,
    paused: bool,
}

impl Ticker {
    /// Creates a ticker; the first tick is due one period (plus jitter)
    /// from now.
    pub fn new(config: TickerConfig) -> Self {
        let config = config.validated();
        let period = (!config.period.is_zero()).then_some(config.period);

        let next_tick = period.map(|p| {
            let jitter = if config.initial_jitter_us > 0 {
                let us = rand::rng().random_range(0..config.initial_jitter_us);
                Duration::from_micros(us)
            } else {
                Duration::ZERO
            };
            Instant::now() + p + jitter
        });

        debug!(period_ms = ?period.map(|p| p.as_millis()), "ticker created");

        Self {
            period,
            tick_count: 0,
            next_tick,
            paused: false,
        }
    }

    /// Waits until the next tick is due.
    ///
    /// Pends forever when disabled or paused, which `tokio::select!`
    /// treats as "this branch never wins".
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, period) = match (self.next_tick, self.period) {
            (Some(next), Some(period)) if !self.paused => (next, period),
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > period / 10;
        let ticks_skipped = if overrun {
            (late_by.as_nanos() / period.as_nanos()) as u64
        } else {
            0
        };
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "ticker overrun, skipping ahead"
            );
        }
        self.next_tick = Some(now + period);

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Stops ticks until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "ticker paused");
        }
    }

    /// Resumes after a pause. The next tick is due one full period from
    /// now, so time spent paused doesn't cause a burst.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(period) = self.period {
                self.next_tick = Some(Instant::now() + period);
            }
            debug!(tick = self.tick_count, "ticker resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the ticker was created with a zero period.
    pub fn is_disabled(&self) -> bool {
        self.period.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}
