//! Tests for error types

use mf_priority::core::{Fault, HandlerError, HostError, IngestError, Rejection};

#[test]
fn test_rejection_messages() {
    assert_eq!(
        Rejection::UnknownAccount { userid: 7 }.to_string(),
        "cannot find user/bank or user/default bank entry for uid: 7"
    );
    assert_eq!(
        Rejection::InvalidQueue { queue: "gold".into() }.to_string(),
        "Queue not valid for user: gold"
    );
    assert_eq!(Rejection::MaxActiveJobs.to_string(), "user has max active jobs");
    assert_eq!(Rejection::ZeroFairshare.to_string(), "user fairshare value is 0");
}

#[test]
fn test_handler_error_is_transparent() {
    let err: HandlerError = Fault::MissingBinding.into();
    assert_eq!(err.to_string(), "bank info is missing");

    let err: HandlerError = Rejection::Disabled.into();
    assert!(matches!(err, HandlerError::Rejected(Rejection::Disabled)));
}

#[test]
fn test_host_error_wrapped_in_fault() {
    let fault = Fault::DependencyRemove(HostError("gone".into()));
    assert_eq!(
        fault.to_string(),
        "failed to remove job dependency: host request failed: gone"
    );
}

#[test]
fn test_ingest_errors() {
    let err = IngestError::Parse {
        index: 3,
        reason: "missing field".into(),
    };
    assert_eq!(err.to_string(), "record 3: missing field");
    assert_eq!(IngestError::ServiceStopped.to_string(), "ingestion service stopped");
}
