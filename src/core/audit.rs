//! Audit trail of admission and throttling decisions.

use std::collections::VecDeque;
use std::fmt;

use crate::util::clock::now_ms;
use crate::util::serde::{JobId, UserId};

/// Decision recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Job admitted at validate/new.
    Accept,
    /// Job rejected.
    Reject,
    /// Job bound to a placeholder account.
    Placeholder,
    /// Placeholder binding replaced with a real account.
    Rebind,
    /// Job held over its running-job limit.
    Hold,
    /// Held job released.
    Release,
    /// Priority assigned.
    Prioritize,
    /// Exception raised against the job.
    Fault,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Placeholder => "placeholder",
            Self::Rebind => "rebind",
            Self::Hold => "hold",
            Self::Release => "release",
            Self::Prioritize => "prioritize",
            Self::Fault => "fault",
        };
        f.write_str(name)
    }
}

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related job.
    pub job_id: JobId,
    /// Submitting user.
    pub userid: UserId,
    /// Bank charged, if known.
    pub bank: Option<String>,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

impl<S: AuditSink> AuditSink for std::sync::Arc<parking_lot::Mutex<S>> {
    fn record(&mut self, event: AuditEvent) {
        self.lock().record(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    job_id: JobId,
    userid: UserId,
    bank: Option<String>,
    action: AuditAction,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        job_id,
        userid,
        bank,
        action,
        created_at_ms: now_ms(),
        detail,
    }
}
