//! Tests for utility functions

use mf_priority::util::{init_tracing, now_ms, split_comma_list};

#[test]
fn test_split_comma_list_dedups_in_order() {
    assert_eq!(split_comma_list("batch,debug,batch"), vec!["batch", "debug"]);
    assert_eq!(split_comma_list(",,"), Vec::<String>::new());
}

#[test]
fn test_now_ms_advances() {
    let a = now_ms();
    let b = now_ms();
    assert!(b >= a);
    assert!(a > 0);
}

#[test]
fn test_init_tracing_installs_once() {
    init_tracing();
    assert!(!init_tracing());
}
