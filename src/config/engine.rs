//! Engine configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Tunables for the priority engine. Weights and sentinels are fixed constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fairshare given to placeholder accounts.
    pub placeholder_fairshare: f64,
    /// Reject jobs of real accounts whose fairshare is exactly zero.
    pub reject_zero_fairshare: bool,
    /// Capacity of the in-memory audit trail.
    pub audit_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            placeholder_fairshare: 0.1,
            reject_zero_fairshare: true,
            audit_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !self.placeholder_fairshare.is_finite()
            || !(0.0..=1.0).contains(&self.placeholder_fairshare)
        {
            return Err("placeholder_fairshare must be within [0, 1]".into());
        }
        if self.audit_capacity == 0 {
            return Err("audit_capacity must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse engine configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `MF_PRIORITY_*` environment variables, loading a
    /// `.env` file first if one is present. Unset variables keep their defaults.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var("MF_PRIORITY_PLACEHOLDER_FAIRSHARE") {
            cfg.placeholder_fairshare = raw
                .parse()
                .with_context(|| format!("MF_PRIORITY_PLACEHOLDER_FAIRSHARE={raw}"))?;
        }
        if let Ok(raw) = std::env::var("MF_PRIORITY_REJECT_ZERO_FAIRSHARE") {
            cfg.reject_zero_fairshare = raw
                .parse()
                .with_context(|| format!("MF_PRIORITY_REJECT_ZERO_FAIRSHARE={raw}"))?;
        }
        if let Ok(raw) = std::env::var("MF_PRIORITY_AUDIT_CAPACITY") {
            cfg.audit_capacity = raw
                .parse()
                .with_context(|| format!("MF_PRIORITY_AUDIT_CAPACITY={raw}"))?;
        }
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}
