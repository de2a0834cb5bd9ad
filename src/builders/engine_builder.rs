//! Builder to construct a [`PriorityEngine`] from configuration.

use std::sync::Arc;

use anyhow::anyhow;
use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::core::{AccountingStore, AppResult, AuditSink, InMemoryAuditSink, PriorityEngine, SchedulerHost};

/// Assembles an engine from configuration, an optional shared store, and an
/// optional audit sink.
pub struct EngineBuilder {
    config: EngineConfig,
    store: Option<Arc<AccountingStore>>,
    audit: Option<Box<dyn AuditSink>>,
}

impl EngineBuilder {
    /// Start from the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            store: None,
            audit: None,
        }
    }

    /// Configuration the engine will be built with.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Share an existing store instead of creating an empty one.
    #[must_use]
    pub fn with_store(mut self, store: Arc<AccountingStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Record decisions into `audit`.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Record decisions into a bounded in-memory sink sized by
    /// `audit_capacity`, returning a handle to read it back.
    pub fn with_in_memory_audit(self) -> (Self, Arc<Mutex<InMemoryAuditSink>>) {
        let sink = Arc::new(Mutex::new(InMemoryAuditSink::new(self.config.audit_capacity)));
        let builder = self.with_audit(Box::new(Arc::clone(&sink)));
        (builder, sink)
    }

    /// Validate the configuration and build the engine around `host`.
    pub fn build<H: SchedulerHost>(self, host: H) -> AppResult<PriorityEngine<H>> {
        self.config
            .validate()
            .map_err(|e| anyhow!("config invalid: {e}"))?;
        let store = self.store.unwrap_or_default();
        let engine = PriorityEngine::new(self.config, store, host);
        tracing::info!("priority engine built");
        Ok(match self.audit {
            Some(audit) => engine.with_audit(audit),
            None => engine,
        })
    }
}
