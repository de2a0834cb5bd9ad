//! Host-facing dispatch, endpoint models, and tokio adapters.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod service;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_spawner;

pub use api::{dispatch, unpack_job_args, Reply, Topic};
#[cfg(feature = "tokio-runtime")]
pub use service::{spawn_ingestion, IngestHandle, IngestRequest, IngestTicket};
#[cfg(feature = "tokio-runtime")]
pub use tokio_spawner::TokioSpawner;
