//! Content-adaptive wait before each navigation.
//!
//! Longer, more specific URLs get a proportionally longer wait: every 200
//! characters of target URL cost one minute.

use crate::utils::{DELAY_SECONDS_PER_UNIT, DELAY_URL_LENGTH_UNIT};

/// Seconds to wait before navigating to `target`
///
/// Length is counted in characters, so multi-byte URLs are not penalised
/// for their encoding.
#[inline]
#[must_use]
pub fn compute_delay(target: &str) -> f64 {
    (target.chars().count() as f64 / DELAY_URL_LENGTH_UNIT) * DELAY_SECONDS_PER_UNIT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_target_has_no_delay() {
        assert_eq!(compute_delay(""), 0.0);
    }

    #[test]
    fn test_formula() {
        let target = "https://www.youtube.com/watch?v=abc123";
        let expected = (target.len() as f64 / 200.0) * 60.0;
        assert!((compute_delay(target) - expected).abs() < f64::EPSILON);
        assert!((compute_delay(&"a".repeat(200)) - 60.0).abs() < f64::EPSILON);
    }
}
