// src/status/render.rs

//! Status line formatting and emission.

use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::scheduler::SchedulerStats;
use crate::status::eta::{Eta, ThroughputEstimator, DEFAULT_WINDOW};

/// Where rendered status lines go.
pub trait StatusSink: Send {
    fn emit(&mut self, line: &str);
}

/// Writes status lines to stdout, green when stdout is a terminal.
#[derive(Debug)]
pub struct TerminalSink {
    color: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
        }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for TerminalSink {
    fn emit(&mut self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = if self.color {
            writeln!(out, "\x1b[1;32m{line}\x1b[0m")
        } else {
            writeln!(out, "{line}")
        };
        let _ = out.flush();
    }
}

/// Collects lines in memory; clones share the buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.lines().pop()
    }
}

impl StatusSink for MemorySink {
    fn emit(&mut self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Everything after the clock: `running R/D   jobs C/T   eta E`.
pub fn format_status_body(stats: &SchedulerStats, eta: Eta) -> String {
    format!(
        "running {}/{}   jobs {}/{}   eta {}",
        stats.running,
        stats.desired,
        stats.completed(),
        stats.known,
        eta
    )
}

/// Full status line: `HH:MM:SS   running R/D   jobs C/T   eta E`.
pub fn format_status_line(clock: &str, stats: &SchedulerStats, eta: Eta) -> String {
    format!("{clock}   {}", format_status_body(stats, eta))
}

/// Local wall-clock time as `HH:MM:SS`.
pub fn wall_clock() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Turns scheduler snapshots into status lines.
///
/// A line is only emitted when something other than the clock changed.
pub struct StatusReporter {
    sink: Box<dyn StatusSink>,
    estimator: ThroughputEstimator,
    last_body: Option<String>,
}

impl std::fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReporter")
            .field("last_body", &self.last_body)
            .finish_non_exhaustive()
    }
}

impl StatusReporter {
    pub fn new(sink: Box<dyn StatusSink>, session_start: Instant) -> Self {
        Self {
            sink,
            estimator: ThroughputEstimator::new(session_start, DEFAULT_WINDOW),
            last_body: None,
        }
    }

    /// Seed the ETA with the mean duration of previously logged jobs.
    pub fn with_historical_mean(mut self, mean: Option<Duration>) -> Self {
        self.estimator = self.estimator.with_historical_mean(mean);
        self
    }

    /// A job became terminal.
    pub fn record_finish(&mut self, now: Instant) {
        self.estimator.record_finish(now);
    }

    pub fn eta(&mut self, stats: &SchedulerStats, now: Instant) -> Eta {
        self.estimator.eta(stats.remaining(), stats.desired, now)
    }

    /// Emit a status line if it differs from the previous one.
    ///
    /// Returns the line that was emitted.
    pub fn render(&mut self, stats: &SchedulerStats, now: Instant, clock: &str) -> Option<String> {
        let eta = self.eta(stats, now);
        let body = format_status_body(stats, eta);
        if self.last_body.as_deref() == Some(body.as_str()) {
            return None;
        }
        let line = format!("{clock}   {body}");
        self.sink.emit(&line);
        self.last_body = Some(body);
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(running: usize, desired: usize, succeeded: usize, known: usize) -> SchedulerStats {
        SchedulerStats {
            running,
            desired,
            succeeded,
            known,
            ..SchedulerStats::default()
        }
    }

    #[test]
    fn line_has_the_documented_shape() {
        let line = format_status_line(
            "12:34:56",
            &stats(2, 3, 40, 100),
            Eta::In(Duration::from_secs(3725)),
        );
        assert_eq!(line, "12:34:56   running 2/3   jobs 40/100   eta 1h 2m 5s");
    }

    #[test]
    fn unchanged_status_is_not_repeated() {
        let sink = MemorySink::new();
        let start = Instant::now();
        let mut reporter = StatusReporter::new(Box::new(sink.clone()), start);

        assert!(reporter.render(&stats(1, 1, 0, 5), start, "00:00:01").is_some());
        assert!(reporter.render(&stats(1, 1, 0, 5), start, "00:00:02").is_none());
        assert!(reporter.render(&stats(1, 2, 0, 5), start, "00:00:03").is_some());

        assert_eq!(
            sink.lines(),
            [
                "00:00:01   running 1/1   jobs 0/5   eta ?",
                "00:00:03   running 1/2   jobs 0/5   eta ?",
            ]
        );
    }

    #[test]
    fn clock_is_hh_mm_ss() {
        let clock = wall_clock();
        assert_eq!(clock.len(), 8);
        assert_eq!(clock.matches(':').count(), 2);
    }
}
