//! Error types for lifecycle handlers, host requests, and ingestion.

use thiserror::Error;

use crate::util::serde::UserId;

/// Job-visible admission failures. The display string is the exact reason
/// reported back to the submitting user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Job arguments could not be unpacked.
    #[error("unable to unpack job arguments: {0}")]
    Unpack(String),
    /// No account matches the user/bank pair and real accounting data is loaded.
    #[error("cannot find user/bank or user/default bank entry for uid: {userid}")]
    UnknownAccount {
        /// Submitting user.
        userid: UserId,
    },
    /// The account exists but has been disabled.
    #[error("user/bank entry has been disabled from flux-accounting DB")]
    Disabled,
    /// The queue is defined but not permitted for the account.
    #[error("Queue not valid for user: {queue}")]
    InvalidQueue {
        /// Requested queue name.
        queue: String,
    },
    /// The project is defined but not permitted for the account.
    #[error("Project not valid for user: {project}")]
    InvalidProject {
        /// Requested project name.
        project: String,
    },
    /// The account already has its maximum number of active jobs.
    #[error("user has max active jobs")]
    MaxActiveJobs,
    /// The account's fairshare is zero.
    #[error("user fairshare value is 0")]
    ZeroFairshare,
}

/// Internal-consistency failures raised against a specific job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// Job arguments could not be unpacked after admission.
    #[error("unable to unpack job arguments: {0}")]
    Unpack(String),
    /// No account is bound to the job at a step that requires one.
    #[error("bank info is missing")]
    MissingBinding,
    /// A placeholder-bound job still cannot be resolved now that real data exists.
    #[error("cannot find user/bank or user/default bank entry for uid: {userid}")]
    Unresolvable {
        /// Submitting user.
        userid: UserId,
    },
    /// The queue became invalid after the job was admitted.
    #[error("queue not valid for user: {queue}")]
    InvalidQueue {
        /// Queue name the job carries.
        queue: String,
    },
    /// The host refused a jobspec update.
    #[error("failed to update jobspec: {0}")]
    JobspecUpdate(HostError),
    /// The host refused to add the running-jobs dependency.
    #[error("failed to add job dependency: {0}")]
    DependencyAdd(HostError),
    /// The host refused to remove the running-jobs dependency.
    #[error("failed to remove job dependency: {0}")]
    DependencyRemove(HostError),
}

/// Outcome of a lifecycle handler that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Reject the job with a reason.
    #[error(transparent)]
    Rejected(#[from] Rejection),
    /// Raise an exception against the job.
    #[error(transparent)]
    Fault(#[from] Fault),
}

/// Result alias for lifecycle handlers.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Failure reported by the hosting scheduler for an outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host request failed: {0}")]
pub struct HostError(pub String);

/// Errors produced while ingesting accounting data.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A single record was malformed and skipped.
    #[error("record {index}: {reason}")]
    Parse {
        /// Position of the record in its batch.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
    /// The batch envelope could not be decoded.
    #[error("malformed batch: {0}")]
    Json(#[from] serde_json::Error),
    /// The ingestion service is no longer running.
    #[error("ingestion service stopped")]
    ServiceStopped,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
