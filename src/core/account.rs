//! Per user/bank accounting records.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::backpressure::RunGate;
use crate::util::serde::{JobId, UserId};

/// Bank name given to placeholder accounts.
pub const PLACEHOLDER_BANK: &str = "unknown";

/// Snapshot value of `max_run_jobs` for a placeholder account.
pub const MAX_RUN_JOBS_MISSING: i64 = -1;
/// Wire value of `max_running_jobs` that detaches a job's binding at New.
pub const MAX_RUN_JOBS_DETACH: i64 = -2;

/// Account shared by every job bound to it.
pub type SharedAccount = Arc<Mutex<Account>>;

/// Whether an account came from the accounting feed or was synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    /// Loaded from the accounting feed.
    Real,
    /// Stand-in for a user the store has not heard of yet.
    Placeholder,
}

/// Running-job limit of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLimit {
    /// No cap.
    Unlimited,
    /// Hard cap on concurrently running jobs.
    Capped(u32),
    /// Test hatch: jobs are left unbound at New so later steps exercise the
    /// missing-binding path.
    DetachBinding,
}

impl RunLimit {
    /// Decode the feed's integer encoding. `None` for unsupported negatives.
    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            0 | MAX_RUN_JOBS_MISSING => Some(Self::Unlimited),
            MAX_RUN_JOBS_DETACH => Some(Self::DetachBinding),
            n if n > 0 => Some(u32::try_from(n).map_or(Self::Capped(u32::MAX), Self::Capped)),
            _ => None,
        }
    }

    /// The cap, if one applies.
    pub const fn cap(self) -> Option<u32> {
        match self {
            Self::Capped(n) => Some(n),
            Self::Unlimited | Self::DetachBinding => None,
        }
    }

    const fn to_wire(self) -> i64 {
        match self {
            Self::Unlimited => 0,
            Self::Capped(n) => n as i64,
            Self::DetachBinding => MAX_RUN_JOBS_DETACH,
        }
    }
}

/// Limits and metadata refreshed from the accounting feed.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUpdate {
    /// User the record belongs to.
    pub userid: UserId,
    /// Bank the record belongs to.
    pub bank: String,
    /// Bank to use when a job omits one.
    pub default_bank: String,
    /// Fairshare value.
    pub fairshare: f64,
    /// Running-job limit.
    pub max_run_jobs: RunLimit,
    /// Active-job limit, `None` for unlimited.
    pub max_active_jobs: Option<u32>,
    /// Permitted queue names.
    pub queues: Vec<String>,
    /// Whether the account may submit jobs.
    pub active: bool,
    /// Permitted project names.
    pub projects: Vec<String>,
    /// Project to use when a job omits one.
    pub default_project: Option<String>,
}

/// Accounting state for one user/bank pair.
#[derive(Debug, Clone)]
pub struct Account {
    /// Owning user.
    pub userid: UserId,
    /// Bank name.
    pub bank_name: String,
    /// Real or placeholder.
    pub kind: AccountKind,
    /// Fairshare supplied by the accounting feed.
    pub fairshare: f64,
    /// Running-job limit.
    pub max_run_jobs: RunLimit,
    /// Jobs currently running.
    pub cur_run_jobs: u32,
    /// Active-job limit, `None` for unlimited.
    pub max_active_jobs: Option<u32>,
    /// Jobs currently active (submitted and not yet inactive).
    pub cur_active_jobs: u32,
    /// Held-job FIFO and running-slot reservations.
    pub gate: RunGate,
    /// Permitted queue names.
    pub queues: Vec<String>,
    /// Last queue factor resolved for a job of this account. Informational only.
    pub queue_factor: i64,
    /// Whether the account may submit jobs.
    pub active: bool,
    /// Permitted project names.
    pub projects: Vec<String>,
    /// Project to use when a job omits one.
    pub default_project: Option<String>,
}

impl Account {
    /// Build a real account from a feed record with zeroed counters.
    pub fn from_update(update: &AccountUpdate) -> Self {
        let mut account = Self {
            userid: update.userid,
            bank_name: update.bank.clone(),
            kind: AccountKind::Real,
            fairshare: 0.0,
            max_run_jobs: RunLimit::Unlimited,
            cur_run_jobs: 0,
            max_active_jobs: None,
            cur_active_jobs: 0,
            gate: RunGate::new(),
            queues: Vec::new(),
            queue_factor: 0,
            active: true,
            projects: Vec::new(),
            default_project: None,
        };
        account.refresh(update);
        account
    }

    /// Synthesize a placeholder for a user whose account is not yet known.
    pub fn placeholder(userid: UserId, fairshare: f64) -> Self {
        Self {
            userid,
            bank_name: PLACEHOLDER_BANK.to_string(),
            kind: AccountKind::Placeholder,
            fairshare,
            max_run_jobs: RunLimit::Unlimited,
            cur_run_jobs: 0,
            max_active_jobs: None,
            cur_active_jobs: 0,
            gate: RunGate::new(),
            queues: Vec::new(),
            queue_factor: 0,
            active: true,
            projects: Vec::new(),
            default_project: None,
        }
    }

    /// Overwrite limits and metadata; running/active counters and the held
    /// FIFO are left untouched.
    pub fn refresh(&mut self, update: &AccountUpdate) {
        self.kind = AccountKind::Real;
        self.fairshare = update.fairshare;
        self.max_run_jobs = update.max_run_jobs;
        self.max_active_jobs = update.max_active_jobs;
        self.queues.clone_from(&update.queues);
        self.active = update.active;
        self.projects.clone_from(&update.projects);
        self.default_project.clone_from(&update.default_project);
    }

    /// True for synthesized placeholder accounts.
    pub fn is_placeholder(&self) -> bool {
        self.kind == AccountKind::Placeholder
    }

    /// True when the account has reached a positive active-job cap.
    pub fn at_active_limit(&self) -> bool {
        self.max_active_jobs
            .is_some_and(|max| self.cur_active_jobs >= max)
    }

    /// True when `project` may be used by this account.
    pub fn permits_project(&self, project: &str) -> bool {
        self.projects.iter().any(|p| p == project)
    }

    /// Export the account for the query endpoint.
    pub fn snapshot(&self) -> AccountSnapshot {
        let max_run_jobs = if self.is_placeholder() {
            MAX_RUN_JOBS_MISSING
        } else {
            self.max_run_jobs.to_wire()
        };
        AccountSnapshot {
            bank_name: self.bank_name.clone(),
            fairshare: self.fairshare,
            max_run_jobs,
            cur_run_jobs: self.cur_run_jobs,
            max_active_jobs: self.max_active_jobs.unwrap_or(0),
            cur_active_jobs: self.cur_active_jobs,
            held_jobs: self.gate.held().collect(),
            queues: self.queues.clone(),
            queue_factor: self.queue_factor,
            active: self.active,
            projects: self.projects.clone(),
            def_project: self.default_project.clone(),
        }
    }
}

/// Exported view of one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Bank name.
    pub bank_name: String,
    /// Fairshare value.
    pub fairshare: f64,
    /// Running-job limit (0 unlimited, -1 placeholder, -2 detach hatch).
    pub max_run_jobs: i64,
    /// Jobs currently running.
    pub cur_run_jobs: u32,
    /// Active-job limit (0 unlimited).
    pub max_active_jobs: u32,
    /// Jobs currently active.
    pub cur_active_jobs: u32,
    /// Held job ids, oldest first.
    pub held_jobs: Vec<JobId>,
    /// Permitted queues.
    pub queues: Vec<String>,
    /// Last resolved queue factor.
    pub queue_factor: i64,
    /// Whether the account may submit jobs.
    pub active: bool,
    /// Permitted projects.
    #[serde(default)]
    pub projects: Vec<String>,
    /// Default project.
    #[serde(default)]
    pub def_project: Option<String>,
}

/// Exported view of every bank a user belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    /// User identifier.
    pub userid: UserId,
    /// The user's accounts.
    pub banks: Vec<AccountSnapshot>,
}
