//! Getter methods for `HarvestConfig`
//!
//! This module provides all the accessor methods for retrieving configuration
//! values from a `HarvestConfig` instance.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::HarvestConfig;
use crate::utils::{CHECKPOINT_FILE_NAME, PROFILES_DIR_NAME};

impl HarvestConfig {
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    #[must_use]
    pub fn user_agents_path(&self) -> Option<&Path> {
        self.user_agents_path.as_deref()
    }

    #[must_use]
    pub fn browser_executable(&self) -> Option<&Path> {
        self.browser_executable.as_deref()
    }

    #[must_use]
    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    /// Lookback window as a chrono duration, ready for store queries
    #[must_use]
    pub fn lookback_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.lookback_days))
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn thumbnail_offset(&self) -> usize {
        self.thumbnail_offset
    }

    #[must_use]
    pub fn thumbnail_min_count(&self) -> usize {
        self.thumbnail_min_count
    }

    #[must_use]
    pub fn robots_fetch_floor(&self) -> Duration {
        Duration::from_millis(self.robots_fetch_floor_ms)
    }

    #[must_use]
    pub fn page_load_timeout_secs(&self) -> u64 {
        self.page_load_timeout_secs
    }

    #[must_use]
    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_secs.map(Duration::from_secs)
    }

    /// Where the phase-one checkpoint lives
    #[must_use]
    pub fn checkpoint_path(&self) -> PathBuf {
        self.cache_dir.join(CHECKPOINT_FILE_NAME)
    }

    /// Parent directory of the per-session browser profiles
    #[must_use]
    pub fn profiles_dir(&self) -> PathBuf {
        self.cache_dir.join(PROFILES_DIR_NAME)
    }
}
