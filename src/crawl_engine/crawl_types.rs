//! Core types for the two-phase crawl.
//!
//! This module contains the error type shared by every component, the phase
//! tag threaded through navigation and extraction, the per-target retry
//! state, and the `WorkItem` record that accumulates results across phases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::page_driver::DriverError;
use crate::resolver::Metadata;
use crate::utils::{InvalidUrlError, MAX_NAVIGATION_ATTEMPTS, RETRY_DELAY_MULTIPLIER};

/// Error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page driver failure (transient)
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Navigation did not complete (transient)
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Expected element was not on the page (transient)
    #[error("Element not found for selector '{0}'")]
    ElementMissing(String),

    /// A discovered or constructed URL failed the allow-list
    #[error("Rejected URL: {0}")]
    InvalidUrl(#[from] InvalidUrlError),

    /// Store rows or other structural input violated an assumption
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The result could not be written
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// Data store error
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Metadata resolution failed
    #[error("Resolver error: {0}")]
    Resolver(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation cancelled
    #[error("Crawl operation was cancelled")]
    Cancelled,

    /// Other errors
    #[error("Crawl error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the whole context chain
        Self::Other(format!("{err:#}"))
    }
}

impl CrawlError {
    /// Whether another navigation attempt may succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Driver(_) | Self::Navigation(_) | Self::ElementMissing(_)
        )
    }
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

/// Which of the two crawl stages is executing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrawlPhase {
    /// Content page to author channel
    FirstRun,
    /// Author channel to latest upload
    SecondRun,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstRun => write!(f, "first run"),
            Self::SecondRun => write!(f, "second run"),
        }
    }
}

/// Attempt counter and current wait for a single target's navigation
#[derive(Debug, Clone, PartialEq)]
pub struct RetryState {
    pub attempt: u8,
    /// Seconds
    pub delay: f64,
}

impl RetryState {
    #[must_use]
    pub fn new(base_delay: f64) -> Self {
        Self {
            attempt: 0,
            delay: base_delay,
        }
    }

    #[must_use]
    pub fn is_last_attempt(&self) -> bool {
        self.attempt + 1 >= MAX_NAVIGATION_ATTEMPTS
    }

    #[must_use]
    pub fn has_attempts_left(&self) -> bool {
        self.attempt < MAX_NAVIGATION_ATTEMPTS
    }

    /// Move to the next attempt with a 10% longer wait
    pub fn escalate(&mut self) {
        self.attempt += 1;
        self.delay *= RETRY_DELAY_MULTIPLIER;
    }

    #[must_use]
    pub fn wait(&self) -> Duration {
        seconds(self.delay)
    }
}

/// Duration from fractional seconds, clamping negatives and NaN to zero
#[must_use]
pub fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

/// One crawl target's accumulated state across both phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    #[serde(rename = "uniform_resource_locator")]
    pub target: String,
    /// HTML-escaped author name
    pub author: String,
    #[serde(default)]
    pub author_channel: Option<String>,
    #[serde(default)]
    pub latest_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Store rows this item stands for
    #[serde(default)]
    pub source_ids: Vec<i64>,
    /// Runs whose visit to the channel listing was exhausted
    #[serde(default, skip_serializing_if = "is_zero")]
    pub listing_attempts: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl WorkItem {
    /// Build a phase-one item. The author name is HTML-escaped here.
    #[must_use]
    pub fn new(target: impl Into<String>, author: &str, source_id: i64) -> Self {
        Self {
            target: target.into(),
            author: html_escape::encode_text(author).into_owned(),
            author_channel: None,
            latest_content: None,
            likes: None,
            views: None,
            rating: None,
            source_ids: vec![source_id],
            listing_attempts: 0,
        }
    }

    /// Record the latest upload. Refused while the channel is unresolved.
    pub fn set_latest_content(&mut self, url: String) -> CrawlResult<()> {
        if self.author_channel.is_none() {
            return Err(CrawlError::Validation(format!(
                "latest content for {} set before its channel was resolved",
                self.target
            )));
        }
        self.latest_content = Some(url);
        Ok(())
    }
}

/// One line of the persisted artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestRecord {
    #[serde(flatten)]
    pub item: WorkItem,
    pub metadata: Metadata,
}
