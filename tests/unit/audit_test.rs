//! Tests for audit sink

use mf_priority::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(1, 42, Some("a".into()), AuditAction::Hold, None);
    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].job_id, 1);
    assert_eq!(events[0].action, AuditAction::Hold);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    for job in 1..=3 {
        sink.record(build_audit_event(job, 1, None, AuditAction::Prioritize, None));
    }

    let jobs: Vec<u64> = sink.events().iter().map(|e| e.job_id).collect();
    assert_eq!(jobs, vec![2, 3]);
}

#[test]
fn test_event_ids_are_unique() {
    let a = build_audit_event(1, 1, None, AuditAction::Accept, None);
    let b = build_audit_event(1, 1, None, AuditAction::Accept, None);
    assert_ne!(a.event_id, b.event_id);
    assert_eq!(AuditAction::Release.to_string(), "release");
}
