// tests/integration/main.rs

mod config_errors;
mod discovery;
#[cfg(unix)]
mod end_to_end;
#[cfg(unix)]
mod interrupt;
mod state_log;
