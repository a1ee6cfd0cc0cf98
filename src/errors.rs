// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    /// Bad arguments, missing job directory, unresolvable command.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Directory scanning kept failing past the configured tolerance.
    #[error("Scan error: {0}")]
    Scan(String),

    /// A durable append to the state log failed.
    #[error("State log write failed: {0}")]
    LogWrite(#[source] std::io::Error),

    /// A complete (newline-terminated) log line could not be parsed.
    #[error("State log corrupt at line {line}: {reason}")]
    LogCorrupt { line: usize, reason: String },

    /// The executor reported a condition that makes every further job fail.
    #[error("Executor error: {0}")]
    Executor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RunnerError {
    /// Whether this error means the user handed us something unusable.
    pub fn is_config(&self) -> bool {
        matches!(self, RunnerError::Config(_))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunnerError>;
