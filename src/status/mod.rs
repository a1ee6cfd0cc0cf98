// src/status/mod.rs

//! Progress reporting and live concurrency control.
//!
//! - [`eta`] estimates throughput over a sliding window and derives the ETA.
//! - [`render`] formats the status line and emits it through a [`StatusSink`].
//! - [`keys`] maps keypresses to concurrency changes.
//! - [`input`] puts the terminal in cbreak mode and reads keys off-thread.

pub mod eta;
pub mod input;
pub mod keys;
pub mod render;

pub use eta::{format_duration, Eta, ThroughputEstimator};
pub use input::{spawn_key_reader, TerminalGuard};
pub use keys::{key_command_for, next_concurrency, KeyCommand};
pub use render::{
    format_status_line, wall_clock, MemorySink, StatusReporter, StatusSink, TerminalSink,
};
