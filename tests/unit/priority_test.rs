//! Tests for the priority formula

use mf_priority::core::priority::{compute, PRIORITY_MAX, PRIORITY_MIN, URGENCY_DEFAULT};
use rand::Rng;

#[test]
fn test_priority_monotonic_in_fairshare() {
    let mut rng = rand::rng();
    for _ in 0..500 {
        let a: f64 = rng.random_range(0.0..1.0);
        let b: f64 = rng.random_range(0.0..1.0);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let factor = rng.random_range(0..10);
        let urgency = rng.random_range(1..31);
        assert!(compute(lo, factor, urgency) <= compute(hi, factor, urgency));
    }
}

#[test]
fn test_priority_monotonic_in_queue_factor() {
    let mut rng = rand::rng();
    for _ in 0..500 {
        let a: i64 = rng.random_range(-1_000..1_000);
        let b: i64 = rng.random_range(-1_000..1_000);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let fairshare: f64 = rng.random_range(0.0..1.0);
        let urgency = rng.random_range(1..31);
        assert!(compute(fairshare, lo, urgency) <= compute(fairshare, hi, urgency));
    }
}

#[test]
fn test_priority_stays_in_range() {
    let mut rng = rand::rng();
    for _ in 0..500 {
        let fairshare: f64 = rng.random_range(0.0..1.0);
        let factor = rng.random_range(-1_000_000..1_000_000i64);
        let urgency = rng.random_range(0..=31);
        let p = compute(fairshare, factor, urgency);
        assert!((PRIORITY_MIN..=PRIORITY_MAX).contains(&p));
    }
}

#[test]
fn test_large_queue_factor_saturates() {
    assert_eq!(compute(1.0, 1_000_000, URGENCY_DEFAULT), PRIORITY_MAX);
}
