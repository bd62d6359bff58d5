//! Type-safe builder for `HarvestConfig` using the typestate pattern
//!
//! This module provides a fluent builder interface with compile-time validation
//! ensuring that required fields are set before building a `HarvestConfig`.

use anyhow::{Context, Result, anyhow, bail};
use std::marker::PhantomData;
use std::path::{Component, PathBuf};

use crate::utils::{
    DEFAULT_LOOKBACK_DAYS, DEFAULT_PAGE_LOAD_TIMEOUT_SECS, DEFAULT_ROBOTS_FETCH_FLOOR_MS,
    DEFAULT_THUMBNAIL_MIN_COUNT, DEFAULT_THUMBNAIL_OFFSET,
};

use super::types::HarvestConfig;

// Type states for the builder
pub struct WithCacheDir;
pub struct Complete;

pub struct HarvestConfigBuilder<State = ()> {
    pub(crate) cache_dir: Option<PathBuf>,
    pub(crate) database_url: Option<String>,
    pub(crate) user_agents_path: Option<PathBuf>,
    pub(crate) browser_executable: Option<PathBuf>,
    pub(crate) lookback_days: u32,
    pub(crate) headless: bool,
    pub(crate) thumbnail_offset: usize,
    pub(crate) thumbnail_min_count: usize,
    pub(crate) robots_fetch_floor_ms: u64,
    pub(crate) page_load_timeout_secs: u64,
    pub(crate) run_deadline_secs: Option<u64>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for HarvestConfigBuilder<()> {
    fn default() -> Self {
        Self {
            cache_dir: None,
            database_url: None,
            user_agents_path: None,
            browser_executable: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            headless: true,
            thumbnail_offset: DEFAULT_THUMBNAIL_OFFSET,
            thumbnail_min_count: DEFAULT_THUMBNAIL_MIN_COUNT,
            robots_fetch_floor_ms: DEFAULT_ROBOTS_FETCH_FLOOR_MS,
            page_load_timeout_secs: DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
            run_deadline_secs: None,
            _phantom: PhantomData,
        }
    }
}

impl HarvestConfig {
    /// Create a builder for configuring a `HarvestConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> HarvestConfigBuilder<()> {
        HarvestConfigBuilder::default()
    }
}

impl<State> HarvestConfigBuilder<State> {
    fn transition<Next>(self) -> HarvestConfigBuilder<Next> {
        HarvestConfigBuilder {
            cache_dir: self.cache_dir,
            database_url: self.database_url,
            user_agents_path: self.user_agents_path,
            browser_executable: self.browser_executable,
            lookback_days: self.lookback_days,
            headless: self.headless,
            thumbnail_offset: self.thumbnail_offset,
            thumbnail_min_count: self.thumbnail_min_count,
            robots_fetch_floor_ms: self.robots_fetch_floor_ms,
            page_load_timeout_secs: self.page_load_timeout_secs,
            run_deadline_secs: self.run_deadline_secs,
            _phantom: PhantomData,
        }
    }
}

impl HarvestConfigBuilder<()> {
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> HarvestConfigBuilder<WithCacheDir> {
        self.cache_dir = Some(dir.into());
        self.transition()
    }
}

impl HarvestConfigBuilder<WithCacheDir> {
    pub fn database_url(mut self, url: impl Into<String>) -> HarvestConfigBuilder<Complete> {
        self.database_url = Some(url.into());
        self.transition()
    }
}

// Build method only available when all required fields are set
impl HarvestConfigBuilder<Complete> {
    pub fn build(self) -> Result<HarvestConfig> {
        let cache_dir = self
            .cache_dir
            .ok_or_else(|| anyhow!("cache_dir is required"))?;
        if cache_dir.as_os_str().is_empty() {
            bail!("cache_dir must not be empty");
        }
        if cache_dir.components().any(|c| matches!(c, Component::ParentDir)) {
            bail!("cache_dir must not contain '..': {}", cache_dir.display());
        }
        let cache_dir = if cache_dir.is_absolute() {
            cache_dir
        } else {
            std::env::current_dir()
                .context("Failed to resolve working directory for cache_dir")?
                .join(cache_dir)
        };

        let database_url = self
            .database_url
            .ok_or_else(|| anyhow!("database_url is required"))?;
        if database_url.trim().is_empty() {
            bail!("database_url must not be empty");
        }

        if self.lookback_days == 0 {
            bail!("lookback_days must be at least 1");
        }
        if self.thumbnail_min_count <= self.thumbnail_offset {
            bail!(
                "thumbnail_min_count ({}) must exceed thumbnail_offset ({})",
                self.thumbnail_min_count,
                self.thumbnail_offset
            );
        }
        if self.page_load_timeout_secs == 0 {
            bail!("page_load_timeout_secs must be at least 1");
        }

        Ok(HarvestConfig {
            cache_dir,
            database_url,
            user_agents_path: self.user_agents_path,
            browser_executable: self.browser_executable,
            lookback_days: self.lookback_days,
            headless: self.headless,
            thumbnail_offset: self.thumbnail_offset,
            thumbnail_min_count: self.thumbnail_min_count,
            robots_fetch_floor_ms: self.robots_fetch_floor_ms,
            page_load_timeout_secs: self.page_load_timeout_secs,
            run_deadline_secs: self.run_deadline_secs,
        })
    }
}
