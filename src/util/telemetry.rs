//! Tracing setup for hosts that don't bring their own subscriber.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG_FILTER: &str = "mf_priority=info";

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// [`DEFAULT_LOG_FILTER`].
///
/// Returns `false` when a global subscriber was already installed, in which
/// case the existing one is left alone.
pub fn init_tracing() -> bool {
    if tracing::dispatcher::has_been_set() {
        return false;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
