//! Tests for builder modules

use std::sync::Arc;

use mf_priority::builders::EngineBuilder;
use mf_priority::config::EngineConfig;
use mf_priority::core::{AccountingStore, JobArgs, JobLifecycle};
use mf_priority::infra::RecordingHost;

#[test]
fn test_builder_rejects_invalid_config() {
    let cfg = EngineConfig {
        audit_capacity: 0,
        ..EngineConfig::default()
    };
    assert!(EngineBuilder::new(cfg).build(RecordingHost::new()).is_err());
}

#[test]
fn test_builder_shares_store() {
    let store = Arc::new(AccountingStore::new());
    let engine = EngineBuilder::new(EngineConfig::default())
        .with_store(Arc::clone(&store))
        .build(RecordingHost::new())
        .unwrap();

    engine.validate(&JobArgs::new(1, 42)).unwrap();
    assert_eq!(store.account_count(), 1);
    assert!(Arc::ptr_eq(engine.store(), &store));
}

#[test]
fn test_in_memory_audit_uses_configured_capacity() {
    let cfg = EngineConfig {
        audit_capacity: 2,
        ..EngineConfig::default()
    };
    let (builder, sink) = EngineBuilder::new(cfg).with_in_memory_audit();
    assert_eq!(builder.config().audit_capacity, 2);
    let engine = builder.build(RecordingHost::new()).unwrap();

    for uid in 1..=3u32 {
        engine.validate(&JobArgs::new(u64::from(uid), uid)).unwrap();
    }
    assert_eq!(sink.lock().events().len(), 2);
}
