//! Source of crawl work
//!
//! Content rows name a piece of content by platform and platform reference;
//! author rows carry channel references the store already knows. Rows stay
//! pending until a run that reached the second phase marks them processed.

pub mod sqlite;

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::crawl_engine::CrawlResult;

pub use sqlite::SqliteContentStore;

/// One unprocessed piece of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentRow {
    pub id: i64,
    pub platform: String,
    pub platform_ref: String,
    pub author: String,
}

/// Channel reference the store holds for a content row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthorRow {
    pub content_id: i64,
    pub channel_ref: Option<String>,
}

/// Relational store the orchestrator reads work from
pub trait ContentStore {
    /// Unprocessed content created within `window` of now, oldest first
    fn recent_content(
        &self,
        window: chrono::Duration,
    ) -> impl Future<Output = CrawlResult<Vec<ContentRow>>>;

    /// Known channel references for `rows`. Rows without an author entry are
    /// simply absent from the result.
    fn authors_for_content(
        &self,
        rows: &[ContentRow],
    ) -> impl Future<Output = CrawlResult<Vec<AuthorRow>>>;

    /// Mark rows done; returns how many rows changed
    fn mark_processed(&self, ids: &[i64]) -> impl Future<Output = CrawlResult<u64>>;
}
