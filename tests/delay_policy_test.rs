//! Delay policy and retry escalation arithmetic

use kodegen_tools_channelscout::compute_delay;
use kodegen_tools_channelscout::crawl_engine::{RetryState, seconds};
use std::time::Duration;

#[test]
fn test_delay_is_a_minute_per_200_characters() {
    assert_eq!(compute_delay(""), 0.0);
    for len in [1usize, 36, 200, 399, 1000] {
        let target = "x".repeat(len);
        let expected = (len as f64 / 200.0) * 60.0;
        assert!((compute_delay(&target) - expected).abs() < 1e-9);
    }
}

#[test]
fn test_delay_counts_characters_not_bytes() {
    assert!((compute_delay("é".repeat(200).as_str()) - 60.0).abs() < 1e-9);
}

#[test]
fn test_retry_state_sequence() {
    let d = compute_delay("https://www.youtube.com/watch?v=abc123");
    let mut state = RetryState::new(d);
    let mut seen = Vec::new();
    while state.has_attempts_left() {
        seen.push(state.delay);
        state.escalate();
    }
    assert_eq!(seen.len(), 3);
    assert!((seen[1] - d * 1.1).abs() < 1e-9);
    assert!((seen[2] - d * 1.21).abs() < 1e-9);
}

#[test]
fn test_seconds_clamps_bad_values() {
    assert_eq!(seconds(-1.0), Duration::ZERO);
    assert_eq!(seconds(f64::NAN), Duration::ZERO);
    assert_eq!(seconds(1.5), Duration::from_millis(1500));
}
