//! Environment-driven configuration for the binary
//!
//! Every setting has a `CHANNELSCOUT_` variable. Only the database URL is
//! mandatory; the cache directory falls back to the user cache directory.

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;
use std::str::FromStr;

use super::types::HarvestConfig;

pub const ENV_CACHE_DIR: &str = "CHANNELSCOUT_CACHE_DIR";
pub const ENV_DATABASE_URL: &str = "CHANNELSCOUT_DATABASE_URL";
pub const ENV_USER_AGENTS: &str = "CHANNELSCOUT_USER_AGENTS";
pub const ENV_BROWSER: &str = "CHANNELSCOUT_BROWSER";
pub const ENV_LOOKBACK_DAYS: &str = "CHANNELSCOUT_LOOKBACK_DAYS";
pub const ENV_HEADLESS: &str = "CHANNELSCOUT_HEADLESS";
pub const ENV_THUMBNAIL_OFFSET: &str = "CHANNELSCOUT_THUMBNAIL_OFFSET";
pub const ENV_THUMBNAIL_MIN_COUNT: &str = "CHANNELSCOUT_THUMBNAIL_MIN_COUNT";
pub const ENV_ROBOTS_FLOOR_MS: &str = "CHANNELSCOUT_ROBOTS_FLOOR_MS";
pub const ENV_PAGE_TIMEOUT_SECS: &str = "CHANNELSCOUT_PAGE_TIMEOUT_SECS";
pub const ENV_RUN_DEADLINE_SECS: &str = "CHANNELSCOUT_RUN_DEADLINE_SECS";

impl HarvestConfig {
    /// Build a config from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup (the environment, a map in tests)
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup(ENV_DATABASE_URL).ok_or_else(|| anyhow!("{ENV_DATABASE_URL} is not set"))?;

        let cache_dir = match lookup(ENV_CACHE_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::cache_dir()
                .map(|d| d.join("channelscout"))
                .ok_or_else(|| anyhow!("{ENV_CACHE_DIR} is not set and no user cache directory exists"))?,
        };

        let mut builder = HarvestConfig::builder()
            .cache_dir(cache_dir)
            .database_url(database_url);

        if let Some(path) = lookup(ENV_USER_AGENTS) {
            builder = builder.user_agents_path(path);
        }
        if let Some(path) = lookup(ENV_BROWSER) {
            builder = builder.browser_executable(path);
        }
        if let Some(days) = parse_var(&lookup, ENV_LOOKBACK_DAYS)? {
            builder = builder.lookback_days(days);
        }
        if let Some(headless) = lookup(ENV_HEADLESS) {
            builder = builder.headless(parse_flag(ENV_HEADLESS, &headless)?);
        }
        if let Some(offset) = parse_var(&lookup, ENV_THUMBNAIL_OFFSET)? {
            builder = builder.thumbnail_offset(offset);
        }
        if let Some(count) = parse_var(&lookup, ENV_THUMBNAIL_MIN_COUNT)? {
            builder = builder.thumbnail_min_count(count);
        }
        if let Some(millis) = parse_var(&lookup, ENV_ROBOTS_FLOOR_MS)? {
            builder = builder.robots_fetch_floor_ms(millis);
        }
        if let Some(secs) = parse_var(&lookup, ENV_PAGE_TIMEOUT_SECS)? {
            builder = builder.page_load_timeout_secs(secs);
        }
        builder = builder.run_deadline_secs(parse_var(&lookup, ENV_RUN_DEADLINE_SECS)?);

        builder.build()
    }
}

fn parse_var<L, T>(lookup: &L, key: &str) -> Result<Option<T>>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {key}: '{raw}'"))
        })
        .transpose()
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("Invalid value for {key}: '{raw}'")),
    }
}
