//! Running-job throttling for a single account.
//!
//! Jobs that would push an account past its running-job cap are parked in a
//! FIFO and released one at a time as running slots free up. A job that is
//! allowed through (or released) holds a slot reservation until it reaches the
//! running state, so admitted-but-not-yet-running jobs count against the cap.

use std::collections::{HashSet, VecDeque};

use crate::util::serde::JobId;

/// Decision taken when a job asks for a running slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The job may proceed.
    Proceed {
        /// Whether a slot was reserved on the job's behalf.
        reserved: bool,
    },
    /// The job was appended to the held FIFO.
    Hold,
}

/// Held-job FIFO plus slot reservations for one account.
#[derive(Debug, Clone, Default)]
pub struct RunGate {
    held: VecDeque<JobId>,
    released: HashSet<JobId>,
    reserved: u32,
}

impl RunGate {
    /// Create an empty gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots in use: running jobs plus outstanding reservations.
    pub const fn occupied(&self, running: u32) -> u32 {
        running.saturating_add(self.reserved)
    }

    /// Number of outstanding reservations.
    pub const fn reserved(&self) -> u32 {
        self.reserved
    }

    /// Held job ids, oldest first.
    pub fn held(&self) -> impl Iterator<Item = JobId> + '_ {
        self.held.iter().copied()
    }

    /// Number of held jobs.
    pub fn held_len(&self) -> usize {
        self.held.len()
    }

    /// True if `job` is waiting in the FIFO.
    pub fn is_held(&self, job: JobId) -> bool {
        self.held.contains(&job)
    }

    /// Ask for a slot under `cap` (`None` means no cap).
    pub fn admit(&mut self, job: JobId, running: u32, cap: Option<u32>) -> GateDecision {
        let Some(cap) = cap else {
            return GateDecision::Proceed { reserved: false };
        };
        if self.occupied(running) >= cap {
            self.held.push_back(job);
            GateDecision::Hold
        } else {
            self.reserved += 1;
            GateDecision::Proceed { reserved: true }
        }
    }

    /// Record that `job` reached the running state, consuming its reservation.
    pub fn started(&mut self, job: JobId, reserved_by_job: bool) {
        let released = self.released.remove(&job);
        if reserved_by_job || released {
            self.reserved = self.reserved.saturating_sub(1);
        }
    }

    /// Forget a job that will never run. Returns true if a reservation was freed.
    pub fn withdraw(&mut self, job: JobId, reserved_by_job: bool) -> bool {
        self.held.retain(|held| *held != job);
        let released = self.released.remove(&job);
        if reserved_by_job || released {
            self.reserved = self.reserved.saturating_sub(1);
            true
        } else {
            false
        }
    }

    /// Release the oldest held job if a slot is free under `cap`.
    pub fn release_next(&mut self, running: u32, cap: Option<u32>) -> Option<JobId> {
        if let Some(cap) = cap {
            if self.occupied(running) >= cap {
                return None;
            }
        }
        let job = self.held.pop_front()?;
        self.released.insert(job);
        self.reserved += 1;
        Some(job)
    }

    /// Put a job back at the front of the FIFO after a failed release.
    pub fn unrelease(&mut self, job: JobId) {
        if self.released.remove(&job) {
            self.reserved = self.reserved.saturating_sub(1);
            self.held.push_front(job);
        }
    }
}
