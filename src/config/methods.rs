//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use std::path::PathBuf;

use super::builder::HarvestConfigBuilder;

impl<State> HarvestConfigBuilder<State> {
    #[must_use]
    pub fn user_agents_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_agents_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn browser_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.browser_executable = Some(path.into());
        self
    }

    /// Only content newer than this many days is considered
    #[must_use]
    pub fn lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    /// Set browser headless mode
    ///
    /// Headless is the default. Headed mode is only useful for watching a
    /// run locally.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use kodegen_tools_channelscout::config::HarvestConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let config = HarvestConfig::builder()
    ///     .cache_dir("/tmp/channelscout")
    ///     .database_url("sqlite::memory:")
    ///     .headless(false)
    ///     .build()?;
    /// assert!(!config.headless());
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Which thumbnail on a channel listing counts as the latest upload
    #[must_use]
    pub fn thumbnail_offset(mut self, offset: usize) -> Self {
        self.thumbnail_offset = offset;
        self
    }

    #[must_use]
    pub fn thumbnail_min_count(mut self, count: usize) -> Self {
        self.thumbnail_min_count = count;
        self
    }

    #[must_use]
    pub fn robots_fetch_floor_ms(mut self, millis: u64) -> Self {
        self.robots_fetch_floor_ms = millis;
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.page_load_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn run_deadline_secs(mut self, secs: Option<u64>) -> Self {
        self.run_deadline_secs = secs;
        self
    }
}
