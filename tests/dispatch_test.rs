//! Topic routing with JSON arguments as a host would deliver them.

mod common;

use common::{account, engine};
use mf_priority::core::{Fault, HandlerError, JobAux, Rejection};
use mf_priority::runtime::{dispatch, Reply};
use serde_json::json;

fn args(id: u64, userid: u32) -> serde_json::Value {
    json!({
        "id": id,
        "userid": userid,
        "urgency": 16,
        "jobspec": {"attributes": {"system": {"bank": "a"}}}
    })
}

#[test]
fn test_full_lifecycle_over_topics() {
    let (engine, host) = engine();
    engine.ingest_accounts(&[account(4, "a", 0.5, 1)]);

    let mut first = JobAux::new();
    assert_eq!(dispatch(&engine, "job.validate", &args(1, 4), &mut first), Ok(Reply::Accepted));
    assert_eq!(dispatch(&engine, "job.new", &args(1, 4), &mut first), Ok(Reply::Accepted));
    assert_eq!(dispatch(&engine, "job.state.depend", &args(1, 4), &mut first), Ok(Reply::Accepted));
    assert_eq!(
        dispatch(&engine, "job.state.priority", &args(1, 4), &mut first),
        Ok(Reply::Priority(50_000))
    );
    assert_eq!(dispatch(&engine, "job.state.run", &args(1, 4), &mut first), Ok(Reply::Accepted));

    let mut second = JobAux::new();
    dispatch(&engine, "job.new", &args(2, 4), &mut second).unwrap();
    assert_eq!(dispatch(&engine, "job.state.depend", &args(2, 4), &mut second), Ok(Reply::Held));

    let mut done = args(1, 4);
    done["events"] = json!(["submit", "alloc", "finish"]);
    assert_eq!(dispatch(&engine, "job.state.inactive", &done, &mut first), Ok(Reply::Accepted));
    assert_eq!(host.released_jobs(), vec![2]);
}

#[test]
fn test_unknown_topic_is_ignored() {
    let (engine, _host) = engine();
    let mut aux = JobAux::new();
    assert_eq!(dispatch(&engine, "job.state.sched", &args(1, 4), &mut aux), Ok(Reply::Ignored));
}

#[test]
fn test_unpack_failure_rejects_at_validate_and_faults_elsewhere() {
    let (engine, _host) = engine();
    let mut aux = JobAux::new();
    let bad = json!({"id": 1});

    assert!(matches!(
        dispatch(&engine, "job.validate", &bad, &mut aux),
        Err(HandlerError::Rejected(Rejection::Unpack(_)))
    ));
    assert!(matches!(
        dispatch(&engine, "job.state.priority", &bad, &mut aux),
        Err(HandlerError::Fault(Fault::Unpack(_)))
    ));
}

#[test]
fn test_queue_update_proposal_reads_value() {
    let (engine, _host) = engine();
    engine.ingest_queues(&[json!({"queue": "gold", "priority": 3})]);
    engine.ingest_accounts(&[account(4, "a", 0.5, 0)]);

    let mut aux = JobAux::new();
    dispatch(&engine, "job.new", &args(1, 4), &mut aux).unwrap();

    let mut proposal = args(1, 4);
    proposal["value"] = json!("gold");
    assert_eq!(
        dispatch(&engine, "job.update.attributes.system.queue", &proposal, &mut aux),
        Err(HandlerError::Rejected(Rejection::InvalidQueue { queue: "gold".into() }))
    );
}

#[test]
fn test_priority_get_matches_state_priority() {
    let (engine, _host) = engine();
    engine.ingest_accounts(&[account(4, "a", 0.25, 0)]);

    let mut aux = JobAux::new();
    dispatch(&engine, "job.new", &args(1, 4), &mut aux).unwrap();
    let a = dispatch(&engine, "job.state.priority", &args(1, 4), &mut aux).unwrap();
    let b = dispatch(&engine, "job.priority.get", &args(1, 4), &mut aux).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, Reply::Priority(25_000));
}
