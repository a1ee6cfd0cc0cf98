// src/config/mod.rs

//! Configuration for runner.
//!
//! Responsibilities:
//! - Define the validated run configuration (`model.rs`).
//! - Turn CLI arguments into that configuration, rejecting anything that
//!   would make the run fail before it starts (`validate.rs`).

pub mod model;
pub mod validate;

pub use model::RunnerConfig;
pub use validate::{resolve_command, validate_args};
