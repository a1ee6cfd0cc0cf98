// src/status/input.rs

//! Keyboard input: cbreak terminal mode plus a blocking reader thread.
//!
//! The reader thread only ever sends [`RuntimeEvent::Key`]; it never touches
//! scheduler state. Reads block on stdin, so the thread is left running on
//! shutdown and goes away with the process.

use std::io::{IsTerminal, Read};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::RuntimeEvent;
use crate::status::keys::key_command_for;

/// Restores the saved terminal attributes on drop.
pub struct TerminalGuard {
    #[cfg(unix)]
    saved: libc::termios,
}

impl std::fmt::Debug for TerminalGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalGuard").finish_non_exhaustive()
    }
}

#[cfg(unix)]
impl TerminalGuard {
    /// Switch stdin to cbreak mode (no line buffering, no echo).
    ///
    /// Signal keys and output processing stay as they were, so Ctrl-C still
    /// raises SIGINT and child output renders normally.
    fn enter_cbreak() -> std::io::Result<Self> {
        let fd = libc::STDIN_FILENO;
        // SAFETY: termios is plain old data; tcgetattr fully initialises it.
        let mut saved: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut saved) } != 0 {
            return Err(std::io::Error::last_os_error());
        }

        let mut raw = saved;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw) } != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(Self { saved })
    }
}

#[cfg(unix)]
impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // SAFETY: restores attributes previously read from the same fd.
        let rc = unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &self.saved) };
        if rc != 0 {
            warn!(error = %std::io::Error::last_os_error(), "failed to restore terminal mode");
        }
    }
}

/// Start forwarding keypresses to the runtime.
///
/// Returns `None` when stdin is not an interactive terminal; the run then
/// simply has no live concurrency control.
pub fn spawn_key_reader(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Option<TerminalGuard> {
    if !std::io::stdin().is_terminal() {
        debug!("stdin is not a terminal; keyboard control disabled");
        return None;
    }

    let guard = match enter_terminal_mode() {
        Ok(guard) => guard,
        Err(e) => {
            warn!(error = %e, "cannot switch terminal to cbreak mode; keyboard control disabled");
            return None;
        }
    };

    let spawned = std::thread::Builder::new()
        .name("runner-keys".into())
        .spawn(move || read_keys(std::io::stdin().lock(), runtime_tx));
    if let Err(e) = spawned {
        warn!(error = %e, "failed to start keyboard reader thread");
        return None;
    }

    Some(guard)
}

#[cfg(unix)]
fn enter_terminal_mode() -> std::io::Result<TerminalGuard> {
    TerminalGuard::enter_cbreak()
}

#[cfg(not(unix))]
fn enter_terminal_mode() -> std::io::Result<TerminalGuard> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "keyboard control needs a Unix terminal",
    ))
}

/// Forward recognised bytes from `input` until EOF or the runtime goes away.
pub fn read_keys<R: Read>(mut input: R, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                let Some(key) = key_command_for(byte[0]) else {
                    continue;
                };
                if runtime_tx.blocking_send(RuntimeEvent::Key(key)).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "keyboard read failed; keyboard control stops");
                break;
            }
        }
    }
    debug!("keyboard reader finished");
}
