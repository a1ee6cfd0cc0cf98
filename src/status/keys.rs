// src/status/keys.rs

//! Keypress → scheduler command mapping.

use crate::types::ConcurrencyFloor;

/// A keypress the runtime reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// `+`: one more concurrent job.
    Increase,
    /// `-`: one fewer concurrent job.
    Decrease,
    /// `q`: graceful interrupt.
    Quit,
}

/// Map a raw input byte to a command. Anything else is ignored.
pub fn key_command_for(byte: u8) -> Option<KeyCommand> {
    match byte {
        b'+' => Some(KeyCommand::Increase),
        b'-' => Some(KeyCommand::Decrease),
        b'q' => Some(KeyCommand::Quit),
        _ => None,
    }
}

/// New desired concurrency after applying `key`, or `None` when the key
/// doesn't change it.
///
/// Decreasing stops at `floor`; increasing has no upper bound.
pub fn next_concurrency(key: KeyCommand, desired: usize, floor: ConcurrencyFloor) -> Option<usize> {
    match key {
        KeyCommand::Increase => Some(desired.saturating_add(1)),
        KeyCommand::Decrease if desired > floor.as_usize() => Some(desired - 1),
        KeyCommand::Decrease | KeyCommand::Quit => None,
    }
}
