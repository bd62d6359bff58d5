//! Metadata lookup for discovered uploads

pub mod oembed;

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::crawl_engine::CrawlResult;

pub use oembed::OEmbedResolver;

/// What the platform says about one upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub url: String,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Resolves a content URL to its metadata
pub trait MetadataResolver {
    fn resolve(&self, url: &str) -> impl Future<Output = CrawlResult<Metadata>>;
}
