//! Background ingestion service.
//!
//! Bulk updates are pushed onto a channel and acknowledged immediately; a
//! worker task applies them in arrival order. Each [`IngestTicket`] resolves
//! once its batch has been applied, so callers that need read-after-write can
//! await it.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::core::{Batch, IngestError, IngestReport, PriorityEngine, SchedulerHost, Spawn};

/// Work accepted by the ingestion service.
#[derive(Debug, Clone)]
pub enum IngestRequest {
    /// Create or refresh accounts.
    Accounts(Batch),
    /// Replace queue definitions.
    Queues(Batch),
    /// Replace known projects.
    Projects(Batch),
    /// Ask the host to reprioritize every pending job.
    Reprioritize,
}

struct Envelope {
    request: IngestRequest,
    done: oneshot::Sender<IngestReport>,
}

/// Completion handle for one pushed request.
#[derive(Debug)]
pub struct IngestTicket {
    rx: oneshot::Receiver<IngestReport>,
}

impl IngestTicket {
    /// Wait until the request has been applied.
    pub async fn applied(self) -> Result<IngestReport, IngestError> {
        self.rx.await.map_err(|_| IngestError::ServiceStopped)
    }
}

/// Sender side of the ingestion service. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IngestHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl IngestHandle {
    /// Enqueue a request. Returns as soon as the request is accepted.
    pub fn push(&self, request: IngestRequest) -> Result<IngestTicket, IngestError> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(Envelope { request, done })
            .map_err(|_| IngestError::ServiceStopped)?;
        Ok(IngestTicket { rx })
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

fn apply<H: SchedulerHost>(engine: &PriorityEngine<H>, request: IngestRequest) -> IngestReport {
    match request {
        IngestRequest::Accounts(batch) => engine.ingest_accounts(&batch.data),
        IngestRequest::Queues(batch) => engine.ingest_queues(&batch.data),
        IngestRequest::Projects(batch) => engine.ingest_projects(&batch.data),
        IngestRequest::Reprioritize => {
            if let Err(e) = engine.reprioritize() {
                tracing::error!("reprioritization request failed: {}", e);
            }
            IngestReport::default()
        }
    }
}

/// Start the ingestion worker on `spawner` and return its handle.
///
/// The worker stops once every handle has been dropped.
pub fn spawn_ingestion<H, S>(engine: Arc<PriorityEngine<H>>, spawner: &S) -> IngestHandle
where
    H: SchedulerHost + 'static,
    S: Spawn,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
    spawner.spawn(async move {
        tracing::info!("ingestion service started");
        while let Some(Envelope { request, done }) = rx.recv().await {
            let report = apply(&engine, request);
            let _ = done.send(report);
        }
        tracing::info!("ingestion service stopped");
    });
    IngestHandle { tx }
}
