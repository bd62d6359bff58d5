//! Browser and resource cleanup functionality
//!
//! This module handles cleanup tasks once a crawl session ends, whether the
//! run finished, failed, or was cancelled.

use chromiumoxide::Browser;
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::browser_profile::BrowserProfile;
use crate::page_driver::PageDriver;

/// Result of cleanup operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

impl CleanupResult {
    fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            Self::Success
        } else {
            Self::PartialFailure(errors)
        }
    }
}

/// Close the browser, stop its CDP handler and remove the session profile
pub async fn cleanup_browser_and_profile(
    mut browser: Browser,
    handler_task: JoinHandle<()>,
    profile: BrowserProfile,
) -> CleanupResult {
    let mut errors = Vec::new();

    debug!(target: "channelscout::cleanup", "Closing browser");
    if let Err(e) = browser.close().await {
        warn!(target: "channelscout::cleanup", "Failed to close browser: {e}");
        errors.push(format!("Browser close failed: {e}"));
    } else {
        debug!(target: "channelscout::cleanup", "Browser closed successfully");
    }

    // Wait for browser process to fully exit (prevents "not closed manually" warning)
    debug!(target: "channelscout::cleanup", "Waiting for browser process to exit");
    if let Err(e) = browser.wait().await {
        warn!(target: "channelscout::cleanup", "Failed to wait for browser exit: {e}");
        errors.push(format!("Browser wait failed: {e}"));
    }

    handler_task.abort();

    let profile_dir = profile.release();
    debug!(target: "channelscout::cleanup", "Removing profile {}", profile_dir.display());
    if let Err(e) = std::fs::remove_dir_all(&profile_dir) {
        warn!(target: "channelscout::cleanup", "Failed to remove profile directory: {e}");
        errors.push(format!("Directory cleanup failed: {e}"));
    }

    CleanupResult::from_errors(errors)
}

/// Quit a driver and log how it went. Never fails the caller.
pub async fn release_driver<D: PageDriver>(driver: D) -> CleanupResult {
    let result = match driver.quit().await {
        Ok(()) => CleanupResult::Success,
        Err(e) => CleanupResult::PartialFailure(vec![e.to_string()]),
    };

    match &result {
        CleanupResult::Success => info!(target: "channelscout::cleanup", "Browser session released"),
        CleanupResult::PartialFailure(errors) => warn!(
            target: "channelscout::cleanup",
            "Browser session released with errors: {}",
            errors.join("; ")
        ),
    }
    result
}
