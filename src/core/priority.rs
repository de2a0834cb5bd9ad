//! Multi-factor priority calculation.
//!
//! A job's priority combines the account's fairshare, the factor of the queue
//! it was submitted under, and the user-supplied urgency:
//!
//! ```text
//! priority = round(100000 * fairshare + 10000 * queue_factor + (urgency - 16))
//! ```
//!
//! The HOLD and EXPEDITE urgencies short-circuit to the ends of the range.

/// Weight applied to the fairshare value.
pub const FAIRSHARE_WEIGHT: f64 = 100_000.0;
/// Weight applied to the queue factor.
pub const QUEUE_WEIGHT: f64 = 10_000.0;

/// Urgency assigned when the user does not supply one.
pub const URGENCY_DEFAULT: i32 = 16;
/// Urgency that holds a job indefinitely.
pub const URGENCY_HOLD: i32 = 0;
/// Urgency that runs a job ahead of everything else.
pub const URGENCY_EXPEDITE: i32 = 31;

/// Lowest priority a job can carry.
pub const PRIORITY_MIN: i64 = 0;
/// Highest priority a job can carry.
pub const PRIORITY_MAX: i64 = 4_294_967_295;

/// Compute a bounded job priority.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn compute(fairshare: f64, queue_factor: i64, urgency: i32) -> i64 {
    if urgency == URGENCY_HOLD {
        return PRIORITY_MIN;
    }
    if urgency == URGENCY_EXPEDITE {
        return PRIORITY_MAX;
    }

    let raw = (FAIRSHARE_WEIGHT * fairshare)
        + (QUEUE_WEIGHT * queue_factor as f64)
        + f64::from(urgency - URGENCY_DEFAULT);
    let priority = raw.round();

    if priority.is_nan() || priority < 0.0 {
        return PRIORITY_MIN;
    }
    if priority >= PRIORITY_MAX as f64 {
        return PRIORITY_MAX;
    }
    priority as i64
}
