//! Timeout utilities for page operations
//!
//! Provides async timeout wrappers to prevent indefinite hangs during
//! page navigation, element lookup, and script evaluation.

use std::future::Future;
use std::time::Duration;

use crate::page_driver::DriverError;

/// Helper function to wrap async page operations with explicit timeout
///
/// Prevents indefinite hangs on page operations by applying `tokio::time::timeout`.
/// Distinguishes between timeout and operation failures.
///
/// # Arguments
/// * `operation` - The async Future to execute with a timeout
/// * `timeout_secs` - Timeout duration in seconds
/// * `operation_name` - Human-readable name for error messages
///
/// # Returns
/// * `Ok(T)` - Operation completed successfully
/// * `Err` - The operation's own error, or [`DriverError::Timeout`]
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout_secs: u64,
    operation_name: &str,
) -> Result<T, DriverError>
where
    F: Future<Output = Result<T, DriverError>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), operation).await {
        Ok(result) => result,
        Err(_) => Err(DriverError::Timeout(format!(
            "{operation_name} timeout after {timeout_secs} seconds"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_slow_operation_times_out() {
        let result: Result<(), _> = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            },
            5,
            "goto",
        )
        .await;
        match result {
            Err(DriverError::Timeout(msg)) => assert_eq!(msg, "goto timeout after 5 seconds"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_operation_error_passes_through() {
        let result: Result<(), _> =
            with_page_timeout(async { Err(DriverError::Closed) }, 5, "goto").await;
        assert!(matches!(result, Err(DriverError::Closed)));
    }
}
