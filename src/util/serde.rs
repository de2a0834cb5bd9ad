//! Identifiers and serde helpers shared by the accounting feed and job arguments.

/// Numeric user identifier as reported by the scheduler.
pub type UserId = u32;

/// Scheduler-assigned job identifier.
pub type JobId = u64;

/// Split a comma-separated list from the accounting feed.
///
/// Entries are trimmed; empty entries are dropped and duplicates keep their
/// first position.
pub fn split_comma_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    out
}
