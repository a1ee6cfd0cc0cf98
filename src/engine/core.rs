// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - making completions durable before they reach the core
//! - sending dispatched jobs to the executor
//! - rendering status and handling shutdown timers
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, filesystem, or processes. Every event is applied to completion
//! before the next one, which is what serializes scheduler mutations.

use std::time::Instant;

use crate::engine::event_handlers::{
    handle_executor_fatal, handle_grace_expired, handle_job_completed, handle_jobs_discovered,
    handle_key, handle_scan_failed, handle_shutdown_requested, CoreContext, CoreStep, Phase,
};
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::scheduler::{Scheduler, SchedulerStats};
use crate::types::ConcurrencyFloor;

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    options: RuntimeOptions,
    floor: ConcurrencyFloor,
    phase: Phase,
    scan_failures: u32,
    /// Whether at least one scan result has been applied.
    scanned: bool,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler, options: RuntimeOptions, floor: ConcurrencyFloor) -> Self {
        Self {
            scheduler,
            options,
            floor,
            phase: Phase::Running,
            scan_failures: 0,
            scanned: false,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent, now: Instant) -> CoreStep {
        let mut ctx = CoreContext {
            scheduler: &mut self.scheduler,
            phase: &mut self.phase,
            scan_failures: &mut self.scan_failures,
            scanned: &mut self.scanned,
            options: &self.options,
            floor: self.floor,
        };

        match event {
            RuntimeEvent::JobsDiscovered { jobs } => handle_jobs_discovered(&mut ctx, jobs, now),
            RuntimeEvent::ScanFailed { error } => handle_scan_failed(&mut ctx, error),
            RuntimeEvent::JobCompleted {
                slot, job, outcome, ..
            } => handle_job_completed(&mut ctx, slot, job, outcome, now),
            RuntimeEvent::ExecutorFatal { error } => handle_executor_fatal(&mut ctx, error),
            RuntimeEvent::Key(key) => handle_key(&mut ctx, key, now),
            RuntimeEvent::ShutdownRequested => handle_shutdown_requested(&mut ctx),
            RuntimeEvent::GraceExpired => handle_grace_expired(&mut ctx),
        }
    }
}
