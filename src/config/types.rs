//! Core configuration types for the channel harvest
//!
//! This module contains the main `HarvestConfig` struct that defines where
//! content comes from, where results go, and how politely the crawl behaves.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::{
    DEFAULT_LOOKBACK_DAYS, DEFAULT_PAGE_LOAD_TIMEOUT_SECS, DEFAULT_ROBOTS_FETCH_FLOOR_MS,
    DEFAULT_THUMBNAIL_MIN_COUNT, DEFAULT_THUMBNAIL_OFFSET,
};

/// Main configuration struct for a harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Directory receiving the JSON artifact and the phase-one checkpoint.
    ///
    /// **INVARIANT:** Always an absolute path without `..` components
    /// (normalized in builder).
    pub(crate) cache_dir: PathBuf,

    /// sqlx connection string for the content store, e.g. `sqlite://content.db`
    pub(crate) database_url: String,

    /// Newline-delimited user-agent file. When unset the built-in Chrome
    /// agent is used.
    pub(crate) user_agents_path: Option<PathBuf>,

    /// Chrome/Chromium binary. When unset the browser is looked up on `PATH`
    /// and downloaded as a last resort.
    pub(crate) browser_executable: Option<PathBuf>,

    /// How far back the store is queried for unprocessed content
    ///
    /// Default: 14 days
    pub(crate) lookback_days: u32,

    pub(crate) headless: bool,

    /// Index of the thumbnail taken as "latest" on a channel listing
    ///
    /// Default: 2 (the third thumbnail; the first ones are often pinned)
    pub(crate) thumbnail_offset: usize,

    /// Fewer thumbnails than this on a listing means there is nothing to take
    ///
    /// Default: 3
    pub(crate) thumbnail_min_count: usize,

    /// Minimum wall-clock time of one robots.txt fetch-and-parse attempt
    ///
    /// Default: 1000 ms
    pub(crate) robots_fetch_floor_ms: u64,

    /// Timeout in seconds for `page.goto()` and element lookups
    ///
    /// Default: 30 seconds
    pub(crate) page_load_timeout_secs: u64,

    /// Whole-run deadline. The binary cancels the run once it passes.
    pub(crate) run_deadline_secs: Option<u64>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join("channelscout"),
            database_url: "sqlite::memory:".to_string(),
            user_agents_path: None,
            browser_executable: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            headless: true,
            thumbnail_offset: DEFAULT_THUMBNAIL_OFFSET,
            thumbnail_min_count: DEFAULT_THUMBNAIL_MIN_COUNT,
            robots_fetch_floor_ms: DEFAULT_ROBOTS_FETCH_FLOOR_MS,
            page_load_timeout_secs: DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
            run_deadline_secs: None,
        }
    }
}
