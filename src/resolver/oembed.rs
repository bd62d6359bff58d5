//! oEmbed-backed metadata resolver

use serde::Deserialize;
use std::time::Duration;

use super::{Metadata, MetadataResolver};
use crate::crawl_engine::{CrawlError, CrawlResult};

pub const YOUTUBE_OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

const OEMBED_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: String,
    author_name: String,
    #[serde(default)]
    author_url: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    provider_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OEmbedResolver {
    client: reqwest::Client,
    endpoint: String,
}

impl OEmbedResolver {
    pub fn new(user_agent: &str) -> anyhow::Result<Self> {
        Self::with_endpoint(user_agent, YOUTUBE_OEMBED_ENDPOINT)
    }

    /// Resolver against a different oEmbed endpoint
    pub fn with_endpoint(user_agent: &str, endpoint: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(OEMBED_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn request_url(&self, url: &str) -> String {
        format!(
            "{}?url={}&format=json",
            self.endpoint,
            urlencoding::encode(url)
        )
    }
}

impl MetadataResolver for OEmbedResolver {
    async fn resolve(&self, url: &str) -> CrawlResult<Metadata> {
        let response = self
            .client
            .get(self.request_url(url))
            .send()
            .await
            .map_err(|e| CrawlError::Resolver(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Resolver(format!(
                "{url}: oEmbed returned {}",
                status.as_u16()
            )));
        }

        let body: OEmbedResponse = response
            .json()
            .await
            .map_err(|e| CrawlError::Resolver(format!("{url}: malformed oEmbed body: {e}")))?;

        Ok(Metadata {
            url: url.to_string(),
            title: body.title,
            author: body.author_name,
            author_url: body.author_url,
            duration_seconds: None,
            published_at: None,
            thumbnail_url: body.thumbnail_url,
            provider: body.provider_name,
        })
    }
}
