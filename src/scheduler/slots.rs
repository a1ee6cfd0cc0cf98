// src/scheduler/slots.rs

//! Slot table: which job runs where, and since when.

use std::time::Instant;

use crate::engine::JobId;

/// Occupant of a single slot.
#[derive(Debug, Clone)]
pub struct SlotEntry {
    pub job: JobId,
    pub started: Instant,
}

/// Growable table of execution slots.
///
/// Slots are reused lowest-index-first. The table grows on demand, so there is
/// no fixed upper bound on how many slots may exist; how many may be *occupied*
/// is decided by the scheduler.
#[derive(Debug, Default)]
pub struct SlotTable {
    slots: Vec<Option<SlotEntry>>,
    occupied: usize,
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    /// Put `job` into the lowest free slot and return its index.
    pub fn occupy(&mut self, job: JobId, started: Instant) -> usize {
        let entry = Some(SlotEntry { job, started });
        self.occupied += 1;
        match self.slots.iter().position(Option::is_none) {
            Some(index) => {
                self.slots[index] = entry;
                index
            }
            None => {
                self.slots.push(entry);
                self.slots.len() - 1
            }
        }
    }

    /// Free `index` if it currently holds `job`.
    ///
    /// Returns the entry that was removed, or `None` when the slot is empty or
    /// holds a different job.
    pub fn release(&mut self, index: usize, job: &str) -> Option<SlotEntry> {
        let slot = self.slots.get_mut(index)?;
        if slot.as_ref().map(|e| e.job.as_str()) != Some(job) {
            return None;
        }
        self.occupied -= 1;
        slot.take()
    }
}
