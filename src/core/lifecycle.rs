//! Job lifecycle state machine.
//!
//! The host calls one [`JobLifecycle`] method per job per transition:
//! validate → new → depend → priority → run → (update)* → inactive. The engine
//! consults and mutates the [`AccountingStore`] synchronously inside each call.
//! Per-job inputs (queue factor, what was counted) live on the job's
//! [`JobBinding`]; the shared account only carries aggregate counters and limits.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::core::account::{RunLimit, SharedAccount, UserSnapshot};
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::backpressure::GateDecision;
use crate::core::host::{JobspecUpdate, SchedulerHost, DEPENDENCY_LABEL};
use crate::core::ingest::{self, IngestReport};
use crate::core::job::{JobArgs, JobAux, JobBinding, JobState};
use crate::core::priority;
use crate::core::queues::{self, QueueResolution};
use crate::core::store::{AccountingStore, Lookup};
use crate::core::{Fault, HandlerError, HandlerResult, HostError, Rejection};

/// Outcome of the depend step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependOutcome {
    /// The job may proceed.
    Proceed,
    /// The job was held behind the running-jobs dependency.
    Held,
}

/// Outcome of the priority step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityOutcome {
    /// Priority assigned to the job.
    Value(i64),
    /// Accounting data is not available yet; the job stays pending.
    Unavailable,
}

/// One method per lifecycle event the host dispatches.
pub trait JobLifecycle {
    /// Admission check at submission (and on reload).
    fn validate(&self, job: &JobArgs) -> HandlerResult<()>;
    /// Bind the job to its account and count it as active.
    fn new_job(&self, job: &JobArgs, aux: &mut JobAux) -> HandlerResult<()>;
    /// Hold the job if its account is at the running-job limit.
    fn depend(&self, job: &JobArgs, aux: &mut JobAux) -> HandlerResult<DependOutcome>;
    /// Compute the job's priority (state change or reprioritization).
    fn priority(&self, job: &JobArgs, aux: &mut JobAux) -> HandlerResult<PriorityOutcome>;
    /// Approve or reject a proposed queue change.
    fn update_queue(&self, job: &JobArgs, aux: &JobAux, new_queue: Option<&str>) -> HandlerResult<()>;
    /// Recompute the queue factor after a queue change was applied.
    fn queue_updated(&self, job: &JobArgs, aux: &mut JobAux) -> HandlerResult<()>;
    /// Count the job as running.
    fn run(&self, job: &JobArgs, aux: &mut JobAux) -> HandlerResult<()>;
    /// Release the job's counters and free a held job if possible.
    fn inactive(&self, job: &JobArgs, aux: &mut JobAux) -> HandlerResult<()>;
}

enum Admission {
    Placeholder,
    Detached,
    Admitted {
        bank: String,
        default_project: Option<String>,
    },
}

/// Accounting-backed admission and priority engine.
pub struct PriorityEngine<H> {
    config: EngineConfig,
    store: Arc<AccountingStore>,
    host: H,
    audit: Option<Mutex<Box<dyn AuditSink>>>,
}

impl<H: SchedulerHost> PriorityEngine<H> {
    /// Create an engine over `store`, talking to `host`.
    pub fn new(config: EngineConfig, store: Arc<AccountingStore>, host: H) -> Self {
        Self {
            config,
            store,
            host,
            audit: None,
        }
    }

    /// Attach an audit sink.
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Mutex::new(audit));
        self
    }

    /// The accounting store.
    pub fn store(&self) -> &Arc<AccountingStore> {
        &self.store
    }

    /// The hosting scheduler.
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Engine configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot of every account for the query endpoint.
    pub fn query(&self) -> Vec<UserSnapshot> {
        self.store.export()
    }

    /// Apply a batch of account records.
    pub fn ingest_accounts(&self, records: &[serde_json::Value]) -> IngestReport {
        ingest::apply_account_batch(&self.store, records)
    }

    /// Replace queue definitions from a batch of queue records.
    pub fn ingest_queues(&self, records: &[serde_json::Value]) -> IngestReport {
        ingest::apply_queue_batch(&self.store, records)
    }

    /// Replace known projects from a batch of project records.
    pub fn ingest_projects(&self, records: &[serde_json::Value]) -> IngestReport {
        ingest::apply_project_batch(&self.store, records)
    }

    /// Ask the host to recompute priorities for every pending job.
    pub fn reprioritize(&self) -> Result<(), HostError> {
        tracing::info!("requesting reprioritization of all pending jobs");
        self.host.reprioritize_all()
    }

    fn record(&self, job: &JobArgs, bank: Option<String>, action: AuditAction, detail: Option<String>) {
        if let Some(audit) = &self.audit {
            audit
                .lock()
                .record(build_audit_event(job.job_id, job.userid, bank, action, detail));
        }
    }

    fn reject(&self, job: &JobArgs, bank: Option<String>, rejection: Rejection) -> HandlerError {
        tracing::info!("job {} (uid {}) rejected: {}", job.job_id, job.userid, rejection);
        self.record(job, bank, AuditAction::Reject, Some(rejection.to_string()));
        HandlerError::Rejected(rejection)
    }

    fn fault(&self, job: &JobArgs, fault: Fault) -> HandlerError {
        tracing::error!("job {} (uid {}): {}", job.job_id, job.userid, fault);
        self.record(job, None, AuditAction::Fault, Some(fault.to_string()));
        HandlerError::Fault(fault)
    }

    fn placeholder(&self, job: &JobArgs) -> SharedAccount {
        let account = self
            .store
            .placeholder_for(job.userid, self.config.placeholder_fairshare);
        self.record(job, None, AuditAction::Placeholder, None);
        account
    }

    fn update_jobspec(&self, job: &JobArgs, update: &JobspecUpdate) -> HandlerResult<()> {
        tracing::debug!("job {}: setting {}={}", job.job_id, update.key(), update.value());
        self.host
            .update_jobspec(job.job_id, update)
            .map_err(|e| self.fault(job, Fault::JobspecUpdate(e)))
    }
}

impl<H: SchedulerHost> JobLifecycle for PriorityEngine<H> {
    #[allow(clippy::float_cmp)]
    fn validate(&self, job: &JobArgs) -> HandlerResult<()> {
        let account = match self.store.lookup(job.userid, job.bank.as_deref()) {
            Lookup::Found(account) => account,
            Lookup::Placeholder(_) => {
                tracing::debug!("job {}: uid {} still on placeholder account", job.job_id, job.userid);
                return Ok(());
            }
            Lookup::NotFound if self.store.only_placeholders_present() => {
                self.placeholder(job);
                tracing::info!(
                    "job {}: no accounting data for uid {}, holding in priority",
                    job.job_id,
                    job.userid
                );
                return Ok(());
            }
            Lookup::NotFound => {
                return Err(self.reject(
                    job,
                    job.bank.clone(),
                    Rejection::UnknownAccount { userid: job.userid },
                ));
            }
        };

        let table = self.store.queues();
        let projects = self.store.projects();
        let acct = account.lock();
        let bank = Some(acct.bank_name.clone());

        if !acct.active {
            return Err(self.reject(job, bank, Rejection::Disabled));
        }
        if queues::resolve(job.queue.as_deref(), &table, &acct.queues) == QueueResolution::InvalidQueue {
            let queue = job.queue.clone().unwrap_or_default();
            return Err(self.reject(job, bank, Rejection::InvalidQueue { queue }));
        }
        if self.config.reject_zero_fairshare && acct.fairshare == 0.0 {
            return Err(self.reject(job, bank, Rejection::ZeroFairshare));
        }
        if let Some(project) = job.project.as_deref() {
            if projects.contains(project) && !acct.permits_project(project) {
                let project = project.to_string();
                return Err(self.reject(job, bank, Rejection::InvalidProject { project }));
            }
        }
        if job.state == JobState::New && acct.at_active_limit() {
            return Err(self.reject(job, bank, Rejection::MaxActiveJobs));
        }
        Ok(())
    }

    fn new_job(&self, job: &JobArgs, aux: &mut JobAux) -> HandlerResult<()> {
        let (mut binding, resolved_default) = match aux.binding.clone() {
            Some(binding) => (binding, false),
            None => match self.store.lookup(job.userid, job.bank.as_deref()) {
                Lookup::Found(account) => (JobBinding::new(account), job.bank.is_none()),
                Lookup::Placeholder(account) => (JobBinding::new(account), false),
                Lookup::NotFound => (JobBinding::new(self.placeholder(job)), false),
            },
        };

        let table = self.store.queues();
        let admission = {
            let mut guard = binding.account.lock();
            let acct = &mut *guard;
            if acct.is_placeholder() {
                Admission::Placeholder
            } else if acct.max_run_jobs == RunLimit::DetachBinding {
                Admission::Detached
            } else {
                let bank = Some(acct.bank_name.clone());
                let Some(factor) = queues::resolve(job.queue.as_deref(), &table, &acct.queues).factor() else {
                    let queue = job.queue.clone().unwrap_or_default();
                    return Err(self.reject(job, bank, Rejection::InvalidQueue { queue }));
                };
                if !binding.counted_active {
                    if acct.at_active_limit() {
                        return Err(self.reject(job, bank, Rejection::MaxActiveJobs));
                    }
                    acct.cur_active_jobs += 1;
                    binding.counted_active = true;
                }
                acct.queue_factor = factor;
                binding.queue_factor = factor;
                Admission::Admitted {
                    bank: acct.bank_name.clone(),
                    default_project: acct.default_project.clone(),
                }
            }
        };

        match admission {
            Admission::Placeholder => {
                tracing::debug!("job {} bound to placeholder for uid {}", job.job_id, job.userid);
                aux.binding = Some(binding);
            }
            Admission::Detached => {
                tracing::warn!("job {}: account requests detached binding", job.job_id);
                aux.binding = None;
            }
            Admission::Admitted {
                bank,
                default_project,
            } => {
                aux.binding = Some(binding);
                if resolved_default {
                    self.update_jobspec(job, &JobspecUpdate::Bank(bank.clone()))?;
                }
                if let (None, Some(project)) = (job.project.as_ref(), default_project) {
                    self.update_jobspec(job, &JobspecUpdate::Project(project))?;
                }
                tracing::info!("job {} admitted under uid {} bank {}", job.job_id, job.userid, bank);
                self.record(job, Some(bank), AuditAction::Accept, None);
            }
        }
        Ok(())
    }

    fn depend(&self, job: &JobArgs, aux: &mut JobAux) -> HandlerResult<DependOutcome> {
        let Some(binding) = aux.binding.as_mut() else {
            return Err(self.fault(job, Fault::MissingBinding));
        };

        // The dependency is added under the account lock so a concurrent
        // release can never observe a held job without it.
        let (decision, bank) = {
            let mut guard = binding.account.lock();
            let acct = &mut *guard;
            let decision = if acct.is_placeholder() {
                GateDecision::Proceed { reserved: false }
            } else {
                let running = acct.cur_run_jobs;
                acct.gate.admit(job.job_id, running, acct.max_run_jobs.cap())
            };
            if decision == GateDecision::Hold {
                if let Err(e) = self.host.add_dependency(job.job_id, DEPENDENCY_LABEL) {
                    acct.gate.withdraw(job.job_id, false);
                    drop(guard);
                    return Err(self.fault(job, Fault::DependencyAdd(e)));
                }
            }
            (decision, acct.bank_name.clone())
        };

        match decision {
            GateDecision::Proceed { reserved } => {
                binding.run_reserved = reserved;
                Ok(DependOutcome::Proceed)
            }
            GateDecision::Hold => {
                aux.dependencies.push(DEPENDENCY_LABEL.to_string());
                tracing::info!(
                    "job {} held: uid {} bank {} at max running jobs",
                    job.job_id,
                    job.userid,
                    bank
                );
                self.record(job, Some(bank), AuditAction::Hold, None);
                Ok(DependOutcome::Held)
            }
        }
    }

    fn priority(&self, job: &JobArgs, aux: &mut JobAux) -> HandlerResult<PriorityOutcome> {
        let Some(binding) = aux.binding.as_mut() else {
            return Err(self.fault(job, Fault::MissingBinding));
        };

        if binding.account.lock().is_placeholder() {
            let account = match self.store.lookup(job.userid, job.bank.as_deref()) {
                Lookup::Found(account) => account,
                Lookup::Placeholder(_) => return Ok(PriorityOutcome::Unavailable),
                Lookup::NotFound if self.store.only_placeholders_present() => {
                    return Ok(PriorityOutcome::Unavailable);
                }
                Lookup::NotFound => {
                    return Err(self.fault(job, Fault::Unresolvable { userid: job.userid }));
                }
            };

            // The job passed Depend against the placeholder, so the real
            // account's running-job cap is applied here instead.
            let table = self.store.queues();
            let (bank, decision) = {
                let mut guard = account.lock();
                let acct = &mut *guard;
                let Some(factor) = queues::resolve(job.queue.as_deref(), &table, &acct.queues).factor() else {
                    let queue = job.queue.clone().unwrap_or_default();
                    drop(guard);
                    return Err(self.fault(job, Fault::InvalidQueue { queue }));
                };
                let running = acct.cur_run_jobs;
                let decision = acct.gate.admit(job.job_id, running, acct.max_run_jobs.cap());
                if decision == GateDecision::Hold {
                    if let Err(e) = self.host.add_dependency(job.job_id, DEPENDENCY_LABEL) {
                        acct.gate.withdraw(job.job_id, false);
                        drop(guard);
                        return Err(self.fault(job, Fault::DependencyAdd(e)));
                    }
                }
                acct.cur_active_jobs += 1;
                acct.queue_factor = factor;
                binding.queue_factor = factor;
                (acct.bank_name.clone(), decision)
            };
            binding.account = account;
            binding.counted_active = true;

            tracing::info!("job {} rebound to uid {} bank {}", job.job_id, job.userid, bank);
            self.record(job, Some(bank.clone()), AuditAction::Rebind, None);
            match decision {
                GateDecision::Proceed { reserved } => binding.run_reserved = reserved,
                GateDecision::Hold => {
                    aux.dependencies.push(DEPENDENCY_LABEL.to_string());
                    tracing::info!(
                        "job {} held on rebind: uid {} bank {} at max running jobs",
                        job.job_id,
                        job.userid,
                        bank
                    );
                    self.record(job, Some(bank.clone()), AuditAction::Hold, None);
                }
            }
            if job.bank.is_none() {
                self.update_jobspec(job, &JobspecUpdate::Bank(bank))?;
            }
        }

        let fairshare = binding.account.lock().fairshare;
        let value = priority::compute(fairshare, binding.queue_factor, job.urgency);
        tracing::debug!("job {} priority {}", job.job_id, value);
        self.record(job, None, AuditAction::Prioritize, Some(value.to_string()));
        Ok(PriorityOutcome::Value(value))
    }

    fn update_queue(&self, job: &JobArgs, aux: &JobAux, new_queue: Option<&str>) -> HandlerResult<()> {
        let Some(binding) = aux.binding.as_ref() else {
            return Err(self.fault(job, Fault::MissingBinding));
        };
        let table = self.store.queues();
        let acct = binding.account.lock();
        if acct.is_placeholder() {
            return Ok(());
        }
        if queues::resolve(new_queue, &table, &acct.queues) == QueueResolution::InvalidQueue {
            let bank = Some(acct.bank_name.clone());
            let queue = new_queue.unwrap_or_default().to_string();
            return Err(self.reject(job, bank, Rejection::InvalidQueue { queue }));
        }
        Ok(())
    }

    fn queue_updated(&self, job: &JobArgs, aux: &mut JobAux) -> HandlerResult<()> {
        let Some(binding) = aux.binding.as_mut() else {
            return Err(self.fault(job, Fault::MissingBinding));
        };
        let table = self.store.queues();
        let mut acct = binding.account.lock();
        if acct.is_placeholder() {
            return Ok(());
        }
        let Some(factor) = queues::resolve(job.queue.as_deref(), &table, &acct.queues).factor() else {
            let queue = job.queue.clone().unwrap_or_default();
            return Err(self.fault(job, Fault::InvalidQueue { queue }));
        };
        acct.queue_factor = factor;
        binding.queue_factor = factor;
        Ok(())
    }

    fn run(&self, job: &JobArgs, aux: &mut JobAux) -> HandlerResult<()> {
        let Some(binding) = aux.binding.as_mut() else {
            return Err(self.fault(job, Fault::MissingBinding));
        };
        {
            let mut acct = binding.account.lock();
            acct.gate.started(job.job_id, binding.run_reserved);
            if !binding.counted_running {
                acct.cur_run_jobs += 1;
            }
        }
        binding.run_reserved = false;
        binding.counted_running = true;
        aux.remove_dep(DEPENDENCY_LABEL);
        Ok(())
    }

    fn inactive(&self, job: &JobArgs, aux: &mut JobAux) -> HandlerResult<()> {
        let Some(binding) = aux.binding.take() else {
            return Err(self.fault(job, Fault::MissingBinding));
        };

        let (released, bank) = {
            let mut guard = binding.account.lock();
            let acct = &mut *guard;
            if binding.counted_active {
                acct.cur_active_jobs = acct.cur_active_jobs.saturating_sub(1);
            }
            let mut slot_freed = acct.gate.withdraw(job.job_id, binding.run_reserved);
            if job.alloc_observed {
                if binding.counted_running {
                    acct.cur_run_jobs = acct.cur_run_jobs.saturating_sub(1);
                }
                slot_freed = true;
            }
            let released = if slot_freed {
                let running = acct.cur_run_jobs;
                acct.gate.release_next(running, acct.max_run_jobs.cap())
            } else {
                None
            };
            if let Some(next) = released {
                if let Err(e) = self.host.remove_dependency(next, DEPENDENCY_LABEL) {
                    acct.gate.unrelease(next);
                    drop(guard);
                    return Err(self.fault(job, Fault::DependencyRemove(e)));
                }
            }
            (released, acct.bank_name.clone())
        };

        if let Some(next) = released {
            tracing::info!("released held job {} for uid {} bank {}", next, job.userid, bank);
            self.record(
                job,
                Some(bank),
                AuditAction::Release,
                Some(format!("released job {next}")),
            );
        }
        Ok(())
    }
}
