// src/jobs/mod.rs

//! Job discovery.
//!
//! - [`source`] lists the job directory against the file pattern.
//! - [`scanner`] repeats that on an interval and feeds the runtime.
//! - [`watcher`] uses `notify` to wake the scanner early when the directory
//!   listing changes.

pub mod scanner;
pub mod source;
pub mod watcher;

pub use scanner::spawn_scanner;
pub use source::{build_matcher, JobSource};
pub use watcher::{spawn_dir_watcher, WatcherHandle};
