//! Tests for configuration validation

use mf_priority::config::EngineConfig;

#[test]
fn test_default_config_is_valid() {
    let cfg = EngineConfig::default();
    assert!(cfg.validate().is_ok());
    assert!((cfg.placeholder_fairshare - 0.1).abs() < f64::EPSILON);
    assert!(cfg.reject_zero_fairshare);
}

#[test]
fn test_invalid_placeholder_fairshare() {
    let cfg = EngineConfig {
        placeholder_fairshare: 1.5,
        ..EngineConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_audit_capacity() {
    let cfg = EngineConfig {
        audit_capacity: 0,
        ..EngineConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_from_json() {
    let cfg = EngineConfig::from_json_str(r#"{"reject_zero_fairshare": false}"#).unwrap();
    assert!(!cfg.reject_zero_fairshare);
    assert_eq!(cfg.audit_capacity, 1024);

    assert!(EngineConfig::from_json_str(r#"{"placeholder_fairshare": -1.0}"#).is_err());
    assert!(EngineConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_from_env() {
    std::env::set_var("MF_PRIORITY_AUDIT_CAPACITY", "64");
    std::env::set_var("MF_PRIORITY_REJECT_ZERO_FAIRSHARE", "false");
    let cfg = EngineConfig::from_env().unwrap();
    assert_eq!(cfg.audit_capacity, 64);
    assert!(!cfg.reject_zero_fairshare);

    std::env::set_var("MF_PRIORITY_AUDIT_CAPACITY", "lots");
    let err = EngineConfig::from_env().unwrap_err();
    assert!(format!("{err:#}").contains("MF_PRIORITY_AUDIT_CAPACITY=lots"));

    std::env::set_var("MF_PRIORITY_AUDIT_CAPACITY", "0");
    assert!(EngineConfig::from_env().is_err());

    std::env::remove_var("MF_PRIORITY_AUDIT_CAPACITY");
    std::env::remove_var("MF_PRIORITY_REJECT_ZERO_FAIRSHARE");
}
