//! Requests the engine makes of the hosting scheduler.

use crate::core::HostError;
use crate::util::serde::JobId;

/// Label of the dependency that holds jobs over their running-job limit.
pub const DEPENDENCY_LABEL: &str = "max-running-jobs-user-limit";

/// Patch to a job's stored specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobspecUpdate {
    /// Set `attributes.system.bank`.
    Bank(String),
    /// Set `attributes.system.project`.
    Project(String),
}

impl JobspecUpdate {
    /// Jobspec path being patched.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Bank(_) => "attributes.system.bank",
            Self::Project(_) => "attributes.system.project",
        }
    }

    /// New value for the path.
    pub fn value(&self) -> &str {
        match self {
            Self::Bank(v) | Self::Project(v) => v,
        }
    }
}

/// Facilities the hosting scheduler exposes to the engine.
///
/// Dependency requests are issued while an account lock is held, so
/// implementations must not call back into the engine from them.
pub trait SchedulerHost: Send + Sync {
    /// Patch the stored jobspec of `job`.
    fn update_jobspec(&self, job: JobId, update: &JobspecUpdate) -> Result<(), HostError>;
    /// Add a named dependency so the scheduler holds `job`.
    fn add_dependency(&self, job: JobId, label: &str) -> Result<(), HostError>;
    /// Remove a named dependency, letting `job` proceed.
    fn remove_dependency(&self, job: JobId, label: &str) -> Result<(), HostError>;
    /// Ask the scheduler to recompute the priority of every pending job.
    fn reprioritize_all(&self) -> Result<(), HostError>;
}

impl<H: SchedulerHost + ?Sized> SchedulerHost for std::sync::Arc<H> {
    fn update_jobspec(&self, job: JobId, update: &JobspecUpdate) -> Result<(), HostError> {
        (**self).update_jobspec(job, update)
    }

    fn add_dependency(&self, job: JobId, label: &str) -> Result<(), HostError> {
        (**self).add_dependency(job, label)
    }

    fn remove_dependency(&self, job: JobId, label: &str) -> Result<(), HostError> {
        (**self).remove_dependency(job, label)
    }

    fn reprioritize_all(&self) -> Result<(), HostError> {
        (**self).reprioritize_all()
    }
}
