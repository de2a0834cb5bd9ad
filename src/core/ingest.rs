//! Bulk ingestion of accounting snapshots.
//!
//! Each batch replaces the subset of the store it targets. A malformed record
//! is logged and skipped; the rest of the batch is still applied.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::account::{AccountUpdate, RunLimit};
use crate::core::queues::{QueueDef, QueueTable};
use crate::core::store::AccountingStore;
use crate::core::IngestError;
use crate::util::serde::{split_comma_list, UserId};

/// Envelope used by every bulk endpoint: `{"data": [record, ...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Batch {
    /// Raw records, decoded one at a time.
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

impl Batch {
    /// Decode a batch envelope from JSON text.
    pub fn from_json_str(input: &str) -> Result<Self, IngestError> {
        Ok(serde_json::from_str(input)?)
    }
}

/// One user/bank row from the accounting database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// User identifier.
    pub userid: UserId,
    /// Bank name.
    pub bank: String,
    /// The user's default bank.
    #[serde(alias = "def_bank")]
    pub default_bank: String,
    /// Fairshare value.
    pub fairshare: f64,
    /// Running-job limit (0 or -1 unlimited, -2 detach hatch).
    pub max_running_jobs: i64,
    /// Active-job limit (0 unlimited).
    pub max_active_jobs: i64,
    /// Comma-separated permitted queues.
    #[serde(default)]
    pub queues: String,
    /// 0 when the account is disabled.
    pub active: i64,
    /// Comma-separated permitted projects.
    #[serde(default)]
    pub projects: String,
    /// Default project; empty or `*` for none.
    #[serde(default, alias = "def_project")]
    pub default_project: Option<String>,
}

impl AccountRecord {
    /// Validate the record and convert it into a store update.
    pub fn into_update(self) -> Result<AccountUpdate, String> {
        if self.bank.is_empty() {
            return Err("bank must not be empty".into());
        }
        if !self.fairshare.is_finite() {
            return Err(format!("fairshare {} is not a finite number", self.fairshare));
        }
        let max_run_jobs = RunLimit::from_wire(self.max_running_jobs)
            .ok_or_else(|| format!("unsupported max_running_jobs {}", self.max_running_jobs))?;
        let max_active_jobs = match self.max_active_jobs {
            0 => None,
            n if n > 0 => Some(u32::try_from(n).unwrap_or(u32::MAX)),
            n => return Err(format!("unsupported max_active_jobs {n}")),
        };
        let default_bank = if self.default_bank.is_empty() {
            self.bank.clone()
        } else {
            self.default_bank
        };
        let default_project = self
            .default_project
            .filter(|p| !p.is_empty() && p != "*");

        Ok(AccountUpdate {
            userid: self.userid,
            bank: self.bank,
            default_bank,
            fairshare: self.fairshare,
            max_run_jobs,
            max_active_jobs,
            queues: split_comma_list(&self.queues),
            active: self.active != 0,
            projects: split_comma_list(&self.projects),
            default_project,
        })
    }
}

/// One queue row from the accounting database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    /// Queue name.
    pub queue: String,
    /// Minimum nodes per job (advisory).
    #[serde(default)]
    pub min_nodes_per_job: i64,
    /// Maximum nodes per job (advisory).
    #[serde(default)]
    pub max_nodes_per_job: i64,
    /// Maximum wall time per job (advisory).
    #[serde(default)]
    pub max_time_per_job: i64,
    /// Priority factor of the queue.
    pub priority: i64,
}

/// One project row from the accounting database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Project name.
    pub project: String,
}

/// Summary of an applied batch.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Records applied.
    pub applied: usize,
    /// Records skipped, with the reason.
    pub skipped: Vec<IngestError>,
}

fn decode<T, U>(
    kind: &str,
    records: &[serde_json::Value],
    convert: impl Fn(T) -> Result<U, String>,
) -> (Vec<U>, Vec<IngestError>)
where
    T: for<'de> Deserialize<'de>,
{
    let mut parsed = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    for (index, raw) in records.iter().enumerate() {
        let result = T::deserialize(raw)
            .map_err(|e| e.to_string())
            .and_then(&convert);
        match result {
            Ok(value) => parsed.push(value),
            Err(reason) => {
                tracing::warn!("skipping malformed {} record {}: {}", kind, index, reason);
                skipped.push(IngestError::Parse { index, reason });
            }
        }
    }
    (parsed, skipped)
}

/// Create or overwrite accounts and default banks. Counters are not touched.
pub fn apply_account_batch(store: &AccountingStore, records: &[serde_json::Value]) -> IngestReport {
    let (updates, skipped) = decode("account", records, AccountRecord::into_update);
    store.apply_account_updates(&updates);
    tracing::info!(
        "applied {} account records ({} skipped)",
        updates.len(),
        skipped.len()
    );
    IngestReport {
        applied: updates.len(),
        skipped,
    }
}

/// Replace every queue definition with the valid records of the batch.
pub fn apply_queue_batch(store: &AccountingStore, records: &[serde_json::Value]) -> IngestReport {
    let (defs, skipped) = decode("queue", records, |r: QueueRecord| {
        if r.queue.is_empty() {
            return Err("queue name must not be empty".to_string());
        }
        Ok(QueueDef {
            name: r.queue,
            min_nodes_per_job: r.min_nodes_per_job,
            max_nodes_per_job: r.max_nodes_per_job,
            max_time_per_job: r.max_time_per_job,
            priority: r.priority,
        })
    });
    let applied = defs.len();
    store.replace_queues(QueueTable::from_defs(defs));
    tracing::info!("replaced queue table with {} queues ({} skipped)", applied, skipped.len());
    IngestReport { applied, skipped }
}

/// Replace the set of known projects with the valid records of the batch.
pub fn apply_project_batch(store: &AccountingStore, records: &[serde_json::Value]) -> IngestReport {
    let (names, skipped) = decode("project", records, |r: ProjectRecord| {
        if r.project.is_empty() {
            return Err("project name must not be empty".to_string());
        }
        Ok(r.project)
    });
    let applied = names.len();
    store.replace_projects(names.into_iter().collect::<BTreeSet<_>>());
    tracing::info!("replaced project set with {} projects ({} skipped)", applied, skipped.len());
    IngestReport { applied, skipped }
}
