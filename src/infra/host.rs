//! In-memory scheduler host that records every request.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::core::{HostError, JobspecUpdate, SchedulerHost};
use crate::util::serde::JobId;

/// Request issued by the engine to its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    /// Jobspec patch.
    UpdateJobspec {
        /// Target job.
        job: JobId,
        /// Patch applied.
        update: JobspecUpdate,
    },
    /// Dependency added.
    AddDependency {
        /// Target job.
        job: JobId,
        /// Dependency label.
        label: String,
    },
    /// Dependency removed.
    RemoveDependency {
        /// Target job.
        job: JobId,
        /// Dependency label.
        label: String,
    },
    /// Reprioritize everything.
    ReprioritizeAll,
}

/// Host operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOp {
    /// `update_jobspec`.
    UpdateJobspec,
    /// `add_dependency`.
    AddDependency,
    /// `remove_dependency`.
    RemoveDependency,
    /// `reprioritize_all`.
    Reprioritize,
}

/// Host for development and testing: records requests and tracks which
/// dependencies are outstanding per job.
#[derive(Debug, Default)]
pub struct RecordingHost {
    requests: Mutex<Vec<HostRequest>>,
    dependencies: Mutex<HashSet<(JobId, String)>>,
    fail_next: Mutex<HashSet<HostOp>>,
}

impl RecordingHost {
    /// Create an empty recording host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail.
    pub fn fail_next(&self, op: HostOp) {
        self.fail_next.lock().insert(op);
    }

    /// Every request recorded so far.
    pub fn requests(&self) -> Vec<HostRequest> {
        self.requests.lock().clone()
    }

    /// Drain recorded requests.
    pub fn take_requests(&self) -> Vec<HostRequest> {
        std::mem::take(&mut *self.requests.lock())
    }

    /// True if `job` currently carries dependency `label`.
    pub fn has_dependency(&self, job: JobId, label: &str) -> bool {
        self.dependencies.lock().contains(&(job, label.to_string()))
    }

    /// Jobs whose dependency was removed, in order.
    pub fn released_jobs(&self) -> Vec<JobId> {
        self.requests
            .lock()
            .iter()
            .filter_map(|r| match r {
                HostRequest::RemoveDependency { job, .. } => Some(*job),
                _ => None,
            })
            .collect()
    }

    fn check(&self, op: HostOp) -> Result<(), HostError> {
        if self.fail_next.lock().remove(&op) {
            return Err(HostError(format!("{op:?} refused")));
        }
        Ok(())
    }
}

impl SchedulerHost for RecordingHost {
    fn update_jobspec(&self, job: JobId, update: &JobspecUpdate) -> Result<(), HostError> {
        self.check(HostOp::UpdateJobspec)?;
        self.requests.lock().push(HostRequest::UpdateJobspec {
            job,
            update: update.clone(),
        });
        Ok(())
    }

    fn add_dependency(&self, job: JobId, label: &str) -> Result<(), HostError> {
        self.check(HostOp::AddDependency)?;
        self.dependencies.lock().insert((job, label.to_string()));
        self.requests.lock().push(HostRequest::AddDependency {
            job,
            label: label.to_string(),
        });
        Ok(())
    }

    fn remove_dependency(&self, job: JobId, label: &str) -> Result<(), HostError> {
        self.check(HostOp::RemoveDependency)?;
        if !self.dependencies.lock().remove(&(job, label.to_string())) {
            return Err(HostError(format!("job {job} has no dependency {label}")));
        }
        self.requests.lock().push(HostRequest::RemoveDependency {
            job,
            label: label.to_string(),
        });
        Ok(())
    }

    fn reprioritize_all(&self) -> Result<(), HostError> {
        self.check(HostOp::Reprioritize)?;
        self.requests.lock().push(HostRequest::ReprioritizeAll);
        Ok(())
    }
}
