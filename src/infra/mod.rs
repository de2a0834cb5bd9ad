//! Infrastructure adapters implementing the engine's host-facing traits.

pub mod host;

pub use host::{HostOp, HostRequest, RecordingHost};
