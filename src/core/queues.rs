//! Queue definitions and queue-factor resolution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A queue as defined by the accounting database.
///
/// Node and time bounds are carried for inspection only; they are not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDef {
    /// Queue name.
    pub name: String,
    /// Minimum nodes per job (advisory).
    pub min_nodes_per_job: i64,
    /// Maximum nodes per job (advisory).
    pub max_nodes_per_job: i64,
    /// Maximum wall time per job (advisory).
    pub max_time_per_job: i64,
    /// Priority factor contributed by the queue.
    pub priority: i64,
}

/// All queues known to the accounting system, replaced wholesale on ingestion.
#[derive(Debug, Clone, Default)]
pub struct QueueTable {
    queues: HashMap<String, QueueDef>,
}

impl QueueTable {
    /// Build a table from definitions; a later duplicate name wins.
    pub fn from_defs(defs: impl IntoIterator<Item = QueueDef>) -> Self {
        Self {
            queues: defs.into_iter().map(|q| (q.name.clone(), q)).collect(),
        }
    }

    /// Look up a queue by name.
    pub fn get(&self, name: &str) -> Option<&QueueDef> {
        self.queues.get(name)
    }

    /// Number of defined queues.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// True when no queues are defined.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

/// Result of resolving a requested queue against an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueResolution {
    /// The job did not name a queue.
    NoQueueRequested,
    /// The queue is not defined anywhere; the job is not blocked.
    UnknownQueue,
    /// The queue is defined but the account may not use it.
    InvalidQueue,
    /// The queue is defined and permitted.
    Permitted {
        /// The queue's configured priority.
        factor: i64,
    },
}

impl QueueResolution {
    /// Queue factor to use for priority, or `None` for an invalid queue.
    pub const fn factor(self) -> Option<i64> {
        match self {
            Self::NoQueueRequested | Self::UnknownQueue => Some(0),
            Self::InvalidQueue => None,
            Self::Permitted { factor } => Some(factor),
        }
    }
}

/// Resolve `requested` against the queue table and an account's permitted queues.
pub fn resolve(requested: Option<&str>, table: &QueueTable, permitted: &[String]) -> QueueResolution {
    let Some(name) = requested else {
        return QueueResolution::NoQueueRequested;
    };
    let Some(def) = table.get(name) else {
        return QueueResolution::UnknownQueue;
    };
    if permitted.iter().any(|q| q == name) {
        QueueResolution::Permitted {
            factor: def.priority,
        }
    } else {
        QueueResolution::InvalidQueue
    }
}
