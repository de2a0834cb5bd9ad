//! Job arguments and job-scoped storage.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::account::SharedAccount;
use crate::core::priority::URGENCY_DEFAULT;
use crate::util::serde::{JobId, UserId};

/// Scheduler state of a job when a handler is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Freshly submitted.
    #[default]
    New,
    /// Waiting on dependencies.
    Depend,
    /// Waiting for a priority.
    Priority,
    /// Waiting for resources.
    Sched,
    /// Running.
    Run,
    /// Cleaning up.
    Cleanup,
    /// Finished.
    Inactive,
}

/// Arguments the scheduler passes with every lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobArgs {
    /// Job identifier.
    pub job_id: JobId,
    /// Submitting user.
    pub userid: UserId,
    /// Bank requested in the jobspec.
    pub bank: Option<String>,
    /// Queue requested in the jobspec.
    pub queue: Option<String>,
    /// Project requested in the jobspec.
    pub project: Option<String>,
    /// User-supplied urgency.
    pub urgency: i32,
    /// Scheduler state at the time of the call.
    pub state: JobState,
    /// Whether the job's eventlog contains an `alloc` event.
    pub alloc_observed: bool,
}

impl JobArgs {
    /// Arguments for a freshly submitted job with default urgency.
    pub const fn new(job_id: JobId, userid: UserId) -> Self {
        Self {
            job_id,
            userid,
            bank: None,
            queue: None,
            project: None,
            urgency: URGENCY_DEFAULT,
            state: JobState::New,
            alloc_observed: false,
        }
    }

    /// Set the requested bank.
    pub fn with_bank(mut self, bank: impl Into<String>) -> Self {
        self.bank = Some(bank.into());
        self
    }

    /// Set the requested queue.
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    /// Set the requested project.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set the urgency.
    pub const fn with_urgency(mut self, urgency: i32) -> Self {
        self.urgency = urgency;
        self
    }

    /// Set the scheduler state.
    pub const fn with_state(mut self, state: JobState) -> Self {
        self.state = state;
        self
    }

    /// Mark the job as having been allocated resources.
    pub const fn allocated(mut self) -> Self {
        self.alloc_observed = true;
        self
    }
}

/// Association between a job and the account it is charged to.
#[derive(Debug, Clone)]
pub struct JobBinding {
    /// The shared account.
    pub account: SharedAccount,
    /// Queue factor resolved for this job.
    pub queue_factor: i64,
    /// Whether the job was counted in `cur_active_jobs`.
    pub counted_active: bool,
    /// Whether the job holds a running-slot reservation.
    pub run_reserved: bool,
    /// Whether the job was counted in `cur_run_jobs`.
    pub counted_running: bool,
}

impl JobBinding {
    /// Bind to `account` with nothing counted yet.
    pub const fn new(account: SharedAccount) -> Self {
        Self {
            account,
            queue_factor: 0,
            counted_active: false,
            run_reserved: false,
            counted_running: false,
        }
    }

    /// True if the binding points at `other`.
    pub fn is_bound_to(&self, other: &SharedAccount) -> bool {
        Arc::ptr_eq(&self.account, other)
    }
}

/// Job-scoped storage owned by the host for the lifetime of one job.
#[derive(Debug, Clone, Default)]
pub struct JobAux {
    /// Account binding, established at New.
    pub binding: Option<JobBinding>,
    /// Dependency labels this engine added to the job.
    pub dependencies: Vec<String>,
}

impl JobAux {
    /// Empty storage for a new job.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the engine added dependency `label` to the job.
    pub fn contains_dep(&self, label: &str) -> bool {
        self.dependencies.iter().any(|d| d == label)
    }

    /// Forget dependency `label`.
    pub fn remove_dep(&mut self, label: &str) {
        self.dependencies.retain(|d| d != label);
    }
}
