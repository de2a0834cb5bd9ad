//! # mf_priority
//!
//! A multi-factor admission and priority engine for batch schedulers, driven
//! by live accounting data.
//!
//! The hosting scheduler calls into the engine at each stage of a job's life
//! (validate, new, depend, priority, run, inactive). The engine answers from an
//! in-memory [`core::AccountingStore`] that an external accounting feed keeps
//! current through bulk ingestion batches.
//!
//! ## Priority
//!
//! ```text
//! priority = round(100000 * fairshare + 10000 * queue_factor + (urgency - 16))
//! ```
//!
//! Urgency 0 (held) always yields priority 0 and urgency 31 (expedited) always
//! yields the maximum, 4294967295.
//!
//! ## Running-job limits
//!
//! Jobs of an account at its `max_running_jobs` cap are held behind a
//! dependency at the depend step and released in FIFO order as running jobs
//! of the same account finish.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mf_priority::builders::EngineBuilder;
//! use mf_priority::config::EngineConfig;
//! use mf_priority::core::{JobArgs, JobAux, JobLifecycle};
//! use mf_priority::infra::RecordingHost;
//!
//! mf_priority::util::init_tracing();
//! let engine = EngineBuilder::new(EngineConfig::default()).build(Arc::new(RecordingHost::new()))?;
//! engine.ingest_accounts(&records);
//!
//! let job = JobArgs::new(1, 42);
//! let mut aux = JobAux::new();
//! engine.validate(&job)?;
//! engine.new_job(&job, &mut aux)?;
//! engine.depend(&job, &mut aux)?;
//! let priority = engine.priority(&job, &mut aux)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Accounting state, admission decisions, and priority computation.
pub mod core;
/// Engine configuration.
pub mod config;
/// Builders to construct the engine from configuration.
pub mod builders;
/// Scheduler host adapters.
pub mod infra;
/// Topic dispatch, endpoint models, and async ingestion.
pub mod runtime;
/// Shared utilities.
pub mod util;
