use std::fmt;

use clap::ValueEnum;

/// Lowest desired concurrency the `-` key may reach.
///
/// - `Zero`: pressing `-` at one pauses all new dispatch.
/// - `One`: at least one slot always stays available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ConcurrencyFloor {
    #[default]
    Zero,
    One,
}

impl ConcurrencyFloor {
    pub fn as_usize(self) -> usize {
        match self {
            ConcurrencyFloor::Zero => 0,
            ConcurrencyFloor::One => 1,
        }
    }
}

/// How many times a job may be attempted before a failure becomes terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttemptLimit {
    /// Failed jobs are retried forever.
    #[default]
    Unbounded,
    /// After this many failed attempts the job is terminal-Failed.
    AtMost(u32),
}

impl AttemptLimit {
    /// `None` and `Some(0)` both mean "no limit".
    pub fn from_option(max: Option<u32>) -> Self {
        match max {
            None | Some(0) => AttemptLimit::Unbounded,
            Some(n) => AttemptLimit::AtMost(n),
        }
    }

    /// True once `attempts` failed attempts exhaust the limit.
    pub fn is_exhausted(self, attempts: u32) -> bool {
        match self {
            AttemptLimit::Unbounded => false,
            AttemptLimit::AtMost(max) => attempts >= max,
        }
    }
}

impl fmt::Display for AttemptLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptLimit::Unbounded => write!(f, "unbounded"),
            AttemptLimit::AtMost(n) => write!(f, "{n}"),
        }
    }
}
