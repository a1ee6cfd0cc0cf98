// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs the user's command once per dispatched job, using
//! `tokio::process::Command`, and reports each attempt back to the runtime as
//! a `RuntimeEvent`.
//!
//! - [`backend`] provides the `ExecutorBackend` trait the runtime depends on,
//!   and `ProcessExecutor`, the production implementation.
//! - [`executor_loop`] owns the running processes, one per slot.
//! - [`job_runner`] runs a single attempt and classifies spawn failures.

pub mod backend;
pub mod executor_loop;
pub mod job_runner;

pub use backend::{ExecutorBackend, ProcessExecutor};
pub use executor_loop::{spawn_executor, ExecutorCommand};
