//! Topic-based dispatch and request/response models for host endpoints.
//!
//! Hosts that deliver lifecycle events as a topic string plus JSON arguments
//! can route them through [`dispatch`] instead of calling [`JobLifecycle`]
//! methods directly.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::priority::URGENCY_DEFAULT;
use crate::core::{
    DependOutcome, Fault, HandlerError, JobArgs, JobAux, JobLifecycle, JobState, PriorityOutcome,
    Rejection, UserSnapshot,
};
use crate::util::serde::{JobId, UserId};

/// Lifecycle topics understood by [`dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    /// `job.validate`
    Validate,
    /// `job.new`
    New,
    /// `job.state.depend`
    Depend,
    /// `job.state.priority`
    Priority,
    /// `job.priority.get`
    PriorityGet,
    /// `job.state.run`
    Run,
    /// `job.state.inactive`
    Inactive,
    /// `job.update.attributes.system.queue`
    UpdateQueue,
    /// `job.event.update`
    QueueUpdated,
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "job.validate" => Self::Validate,
            "job.new" => Self::New,
            "job.state.depend" => Self::Depend,
            "job.state.priority" => Self::Priority,
            "job.priority.get" => Self::PriorityGet,
            "job.state.run" => Self::Run,
            "job.state.inactive" => Self::Inactive,
            "job.update.attributes.system.queue" => Self::UpdateQueue,
            "job.event.update" => Self::QueueUpdated,
            other => return Err(format!("unknown topic {other}")),
        })
    }
}

/// Reply returned to the host for a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    /// The event was accepted.
    Accepted,
    /// The job was held behind the running-jobs dependency.
    Held,
    /// Priority to assign.
    Priority(i64),
    /// Priority not available yet; keep the job pending.
    Unavailable,
    /// The topic is not handled by this engine.
    Ignored,
}

#[derive(Debug, Default, Deserialize)]
struct RawSystem {
    #[serde(default)]
    bank: Option<String>,
    #[serde(default)]
    queue: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAttributes {
    #[serde(default)]
    system: RawSystem,
}

#[derive(Debug, Default, Deserialize)]
struct RawJobspec {
    #[serde(default)]
    attributes: RawAttributes,
}

const fn default_urgency() -> i32 {
    URGENCY_DEFAULT
}

#[derive(Debug, Deserialize)]
struct RawJobArgs {
    #[serde(default)]
    id: JobId,
    userid: UserId,
    #[serde(default = "default_urgency")]
    urgency: i32,
    #[serde(default)]
    state: JobState,
    #[serde(default)]
    jobspec: RawJobspec,
    #[serde(default)]
    events: Vec<String>,
}

/// Unpack host-supplied JSON arguments into [`JobArgs`].
///
/// Expected shape: `{id, userid, urgency?, state?, jobspec: {attributes:
/// {system: {bank?, queue?, project?}}}, events?}`.
pub fn unpack_job_args(args: &serde_json::Value) -> Result<JobArgs, String> {
    let raw = RawJobArgs::deserialize(args).map_err(|e| e.to_string())?;
    let system = raw.jobspec.attributes.system;
    Ok(JobArgs {
        job_id: raw.id,
        userid: raw.userid,
        bank: system.bank,
        queue: system.queue,
        project: system.project,
        urgency: raw.urgency,
        state: raw.state,
        alloc_observed: raw.events.iter().any(|e| e == "alloc"),
    })
}

/// Route a topic and its JSON arguments to the matching lifecycle handler.
pub fn dispatch<L: JobLifecycle + ?Sized>(
    engine: &L,
    topic: &str,
    args: &serde_json::Value,
    aux: &mut JobAux,
) -> Result<Reply, HandlerError> {
    let topic = match topic.parse::<Topic>() {
        Ok(topic) => topic,
        Err(e) => {
            tracing::debug!("{}", e);
            return Ok(Reply::Ignored);
        }
    };

    let job = unpack_job_args(args).map_err(|e| {
        tracing::error!("{:?}: unable to unpack arguments: {}", topic, e);
        if topic == Topic::Validate {
            HandlerError::Rejected(Rejection::Unpack(e))
        } else {
            HandlerError::Fault(Fault::Unpack(e))
        }
    })?;

    match topic {
        Topic::Validate => engine.validate(&job).map(|()| Reply::Accepted),
        Topic::New => engine.new_job(&job, aux).map(|()| Reply::Accepted),
        Topic::Depend => engine.depend(&job, aux).map(|outcome| match outcome {
            DependOutcome::Proceed => Reply::Accepted,
            DependOutcome::Held => Reply::Held,
        }),
        Topic::Priority | Topic::PriorityGet => {
            engine.priority(&job, aux).map(|outcome| match outcome {
                PriorityOutcome::Value(p) => Reply::Priority(p),
                PriorityOutcome::Unavailable => Reply::Unavailable,
            })
        }
        Topic::Run => engine.run(&job, aux).map(|()| Reply::Accepted),
        Topic::Inactive => engine.inactive(&job, aux).map(|()| Reply::Accepted),
        Topic::UpdateQueue => {
            let new_queue = args.get("value").and_then(serde_json::Value::as_str);
            engine
                .update_queue(&job, aux, new_queue)
                .map(|()| Reply::Accepted)
        }
        Topic::QueueUpdated => engine.queue_updated(&job, aux).map(|()| Reply::Accepted),
    }
}

/// Body of the query endpoint.
pub fn query_response(snapshot: &[UserSnapshot]) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(snapshot)
}
