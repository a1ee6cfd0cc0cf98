// src/status/eta.rs

//! Throughput and ETA estimation.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Default sliding window for throughput.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Estimated time until every known job is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    /// No throughput observed yet.
    Unknown,
    /// Work remains but desired concurrency is zero.
    Never,
    /// Nothing remains.
    Done,
    In(Duration),
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::Unknown => write!(f, "?"),
            Eta::Never => write!(f, "\u{221e}"),
            Eta::Done => write!(f, "0s"),
            Eta::In(d) => write!(f, "{}", format_duration(*d)),
        }
    }
}

/// `Xh Ym Zs`, leaving out leading zero units.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

/// Finished-jobs-per-second over a sliding window.
#[derive(Debug, Clone)]
pub struct ThroughputEstimator {
    window: Duration,
    session_start: Instant,
    finishes: VecDeque<Instant>,
    /// Mean duration of jobs from earlier sessions, used until the first
    /// finish of this session.
    historical_mean: Option<Duration>,
}

impl ThroughputEstimator {
    pub fn new(session_start: Instant, window: Duration) -> Self {
        Self {
            window,
            session_start,
            finishes: VecDeque::new(),
            historical_mean: None,
        }
    }

    pub fn with_historical_mean(mut self, mean: Option<Duration>) -> Self {
        self.historical_mean = mean.filter(|d| !d.is_zero());
        self
    }

    /// A job reached a terminal state at `now`.
    pub fn record_finish(&mut self, now: Instant) {
        self.finishes.push_back(now);
    }

    fn prune(&mut self, now: Instant) {
        while let Some(first) = self.finishes.front() {
            if now.saturating_duration_since(*first) > self.window {
                self.finishes.pop_front();
            } else {
                break;
            }
        }
    }

    /// Jobs per second, or `None` while it is zero.
    pub fn rate(&mut self, now: Instant) -> Option<f64> {
        self.prune(now);
        if self.finishes.is_empty() {
            return None;
        }
        let span = now
            .saturating_duration_since(self.session_start)
            .min(self.window)
            .max(Duration::from_millis(1));
        Some(self.finishes.len() as f64 / span.as_secs_f64())
    }

    pub fn eta(&mut self, remaining: usize, desired: usize, now: Instant) -> Eta {
        if remaining == 0 {
            return Eta::Done;
        }
        if desired == 0 {
            return Eta::Never;
        }
        if let Some(rate) = self.rate(now) {
            return Eta::In(Duration::from_secs_f64(remaining as f64 / rate));
        }
        match self.historical_mean {
            Some(mean) => {
                let rounds = remaining.div_ceil(desired);
                Eta::In(mean.saturating_mul(u32::try_from(rounds).unwrap_or(u32::MAX)))
            }
            None => Eta::Unknown,
        }
    }
}
