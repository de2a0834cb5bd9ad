//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use mf_priority::builders::EngineBuilder;
use mf_priority::config::EngineConfig;
use mf_priority::core::{Lookup, PriorityEngine, SharedAccount};
use mf_priority::infra::RecordingHost;
use serde_json::{json, Value};

pub type TestEngine = PriorityEngine<Arc<RecordingHost>>;

pub fn engine() -> (TestEngine, Arc<RecordingHost>) {
    let host = Arc::new(RecordingHost::new());
    let engine = EngineBuilder::new(EngineConfig::default())
        .build(Arc::clone(&host))
        .unwrap();
    (engine, host)
}

pub fn account(userid: u32, bank: &str, fairshare: f64, max_running_jobs: i64) -> Value {
    json!({
        "userid": userid,
        "bank": bank,
        "def_bank": bank,
        "fairshare": fairshare,
        "max_running_jobs": max_running_jobs,
        "max_active_jobs": 0,
        "queues": "",
        "active": 1,
        "projects": "",
        "def_project": ""
    })
}

pub fn with_field(mut record: Value, key: &str, value: Value) -> Value {
    record[key] = value;
    record
}

pub fn found(engine: &TestEngine, userid: u32, bank: &str) -> SharedAccount {
    match engine.store().lookup(userid, Some(bank)) {
        Lookup::Found(account) => account,
        other => panic!("expected account {userid}/{bank}, got {other:?}"),
    }
}
