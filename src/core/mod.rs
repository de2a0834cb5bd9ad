//! Accounting state, admission decisions, and priority computation.

pub mod account;
pub mod audit;
pub mod backpressure;
pub mod error;
pub mod host;
pub mod ingest;
pub mod job;
pub mod lifecycle;
pub mod priority;
pub mod queues;
pub mod spawn;
pub mod store;

pub use account::{Account, AccountKind, AccountSnapshot, AccountUpdate, RunLimit, SharedAccount, UserSnapshot};
pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use backpressure::{GateDecision, RunGate};
pub use error::{AppResult, Fault, HandlerError, HandlerResult, HostError, IngestError, Rejection};
pub use host::{JobspecUpdate, SchedulerHost, DEPENDENCY_LABEL};
pub use ingest::{AccountRecord, Batch, IngestReport, ProjectRecord, QueueRecord};
pub use job::{JobArgs, JobAux, JobBinding, JobState};
pub use lifecycle::{DependOutcome, JobLifecycle, PriorityEngine, PriorityOutcome};
pub use queues::{QueueDef, QueueResolution, QueueTable};
pub use spawn::Spawn;
pub use store::{AccountingStore, Lookup};
