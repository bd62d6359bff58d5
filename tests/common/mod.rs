//! Test doubles shared by the channelscout integration tests

#![allow(dead_code)]

use anyhow::Result;
use kodegen_tools_channelscout::crawl_engine::{RobotsFetch, RobotsFetchError, RobotsResponse};
use kodegen_tools_channelscout::utils::{CHANNEL_ANCHOR_SELECTOR, THUMBNAIL_ANCHOR_SELECTOR};
use kodegen_tools_channelscout::{
    AuthorRow, ContentRow, ContentStore, CrawlError, CrawlResult, DriverError, HarvestConfig,
    Metadata, MetadataResolver, PageDriver, PageElement,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Creates a temporary directory for test output
pub fn create_test_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Config writing into `dir` with default politeness settings
pub fn test_config(dir: &Path) -> HarvestConfig {
    HarvestConfig::builder()
        .cache_dir(dir)
        .database_url("sqlite::memory:")
        .build()
        .unwrap()
}

pub fn watch_url(video: &str) -> String {
    format!("https://www.youtube.com/watch?v={video}")
}

pub fn content_row(id: i64, video: &str, author: &str) -> ContentRow {
    ContentRow {
        id,
        platform: "youtube".into(),
        platform_ref: video.into(),
        author: author.into(),
    }
}

// =============================================================================
// Page driver
// =============================================================================

/// What the fake browser shows for one URL
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    /// The first visit lands here instead
    pub redirect_once_to: Option<String>,
    pub channel_anchor: Option<String>,
    pub thumbnails: Vec<String>,
}

impl FakePage {
    pub fn content(channel: &str) -> Self {
        Self {
            channel_anchor: Some(channel.into()),
            ..Self::default()
        }
    }

    pub fn listing(thumbnails: &[&str]) -> Self {
        Self {
            thumbnails: thumbnails.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// Everything the fake browser was asked to do
#[derive(Debug, Default)]
pub struct DriverLog {
    pub launches: usize,
    pub navigations: Vec<String>,
    pub quits: usize,
}

/// A scripted site shared between the test and the drivers it launches
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pages: Arc<Mutex<HashMap<String, FakePage>>>,
    navigation_failures: Arc<Mutex<HashMap<String, usize>>>,
    pub log: Arc<Mutex<DriverLog>>,
}

impl FakeSite {
    pub fn page(self, url: &str, page: FakePage) -> Self {
        self.pages.lock().unwrap().insert(url.to_string(), page);
        self
    }

    /// Make the next `times` navigations to `url` fail
    pub fn failing(self, url: &str, times: usize) -> Self {
        self.navigation_failures
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
        self
    }

    pub fn driver(&self) -> FakeDriver {
        self.log.lock().unwrap().launches += 1;
        FakeDriver {
            site: self.clone(),
            current: "about:blank".into(),
            redirected: HashSet::new(),
        }
    }

    /// Launcher in the shape the orchestrator expects
    pub fn launcher(&self) -> impl FnOnce() -> std::future::Ready<Result<FakeDriver>> + '_ {
        move || std::future::ready(Ok(self.driver()))
    }

    pub fn navigations(&self) -> Vec<String> {
        self.log.lock().unwrap().navigations.clone()
    }

    pub fn launches(&self) -> usize {
        self.log.lock().unwrap().launches
    }

    pub fn quits(&self) -> usize {
        self.log.lock().unwrap().quits
    }
}

#[derive(Debug)]
pub struct FakeDriver {
    site: FakeSite,
    current: String,
    redirected: HashSet<String>,
}

impl FakeDriver {
    fn current_page(&self) -> Option<FakePage> {
        self.site.pages.lock().unwrap().get(&self.current).cloned()
    }
}

impl PageDriver for FakeDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.site.log.lock().unwrap().navigations.push(url.to_string());

        if let Some(remaining) = self.site.navigation_failures.lock().unwrap().get_mut(url)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(DriverError::Navigation(format!("{url}: net::ERR_TIMED_OUT")));
        }

        let redirect = self
            .site
            .pages
            .lock()
            .unwrap()
            .get(url)
            .and_then(|p| p.redirect_once_to.clone());
        self.current = match redirect {
            Some(target) if self.redirected.insert(url.to_string()) => target,
            _ => url.to_string(),
        };
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.current.clone())
    }

    async fn find_element(&mut self, selector: &str) -> Result<Option<PageElement>, DriverError> {
        if selector != CHANNEL_ANCHOR_SELECTOR {
            return Ok(None);
        }
        Ok(self
            .current_page()
            .and_then(|p| p.channel_anchor)
            .map(PageElement::anchor))
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<PageElement>, DriverError> {
        if selector != THUMBNAIL_ANCHOR_SELECTOR {
            return Ok(Vec::new());
        }
        Ok(self
            .current_page()
            .map(|p| p.thumbnails.into_iter().map(PageElement::anchor).collect())
            .unwrap_or_default())
    }

    async fn execute_script(&mut self, _script: &str) -> Result<serde_json::Value, DriverError> {
        Ok(serde_json::Value::Null)
    }

    async fn quit(self) -> Result<(), DriverError> {
        self.site.log.lock().unwrap().quits += 1;
        Ok(())
    }
}

// =============================================================================
// robots.txt
// =============================================================================

/// Robots source answering from a script, then with an empty robots.txt
#[derive(Debug, Clone, Default)]
pub struct StaticRobots {
    script: Arc<Mutex<VecDeque<Result<RobotsResponse, String>>>>,
    pub fetched: Arc<Mutex<Vec<String>>>,
}

impl StaticRobots {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn then(self, response: Result<RobotsResponse, &str>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(response.map_err(str::to_string));
        self
    }

    pub fn body(body: &str) -> Self {
        Self::default().then(Ok(RobotsResponse::Body(body.to_string())))
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

impl RobotsFetch for StaticRobots {
    async fn fetch(&self, robots_url: &str) -> Result<RobotsResponse, RobotsFetchError> {
        self.fetched.lock().unwrap().push(robots_url.to_string());
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(RobotsFetchError::Other(message)),
            None => Ok(RobotsResponse::Body(String::new())),
        }
    }
}

// =============================================================================
// Store and resolver
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct FakeStore {
    rows: Vec<ContentRow>,
    authors: Vec<AuthorRow>,
    pub processed: Arc<Mutex<Vec<i64>>>,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<ContentRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Same store with one more row; processed state is shared
    pub fn with_row(&self, row: ContentRow) -> Self {
        let mut store = self.clone();
        store.rows.push(row);
        store
    }

    pub fn known_channel(mut self, content_id: i64, channel_ref: &str) -> Self {
        self.authors.push(AuthorRow {
            content_id,
            channel_ref: Some(channel_ref.into()),
        });
        self
    }

    pub fn processed_ids(&self) -> Vec<i64> {
        let mut ids = self.processed.lock().unwrap().clone();
        ids.sort_unstable();
        ids
    }
}

impl ContentStore for FakeStore {
    async fn recent_content(&self, _window: chrono::Duration) -> CrawlResult<Vec<ContentRow>> {
        let processed = self.processed.lock().unwrap();
        Ok(self
            .rows
            .iter()
            .filter(|r| !processed.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn authors_for_content(&self, rows: &[ContentRow]) -> CrawlResult<Vec<AuthorRow>> {
        Ok(self
            .authors
            .iter()
            .filter(|a| rows.iter().any(|r| r.id == a.content_id))
            .cloned()
            .collect())
    }

    async fn mark_processed(&self, ids: &[i64]) -> CrawlResult<u64> {
        self.processed.lock().unwrap().extend_from_slice(ids);
        Ok(ids.len() as u64)
    }
}

/// Resolver that knows every URL except the ones it is told to fail
#[derive(Debug, Clone, Default)]
pub struct FakeResolver {
    failing: HashSet<String>,
}

impl FakeResolver {
    pub fn failing_for(urls: &[&str]) -> Self {
        Self {
            failing: urls.iter().map(|u| u.to_string()).collect(),
        }
    }
}

impl MetadataResolver for FakeResolver {
    async fn resolve(&self, url: &str) -> CrawlResult<Metadata> {
        if self.failing.contains(url) {
            return Err(CrawlError::Resolver(format!("{url}: oEmbed returned 404")));
        }
        Ok(Metadata {
            url: url.to_string(),
            title: format!("Title of {url}"),
            author: "Someone".into(),
            author_url: None,
            duration_seconds: None,
            published_at: None,
            thumbnail_url: None,
            provider: Some("YouTube".into()),
        })
    }
}
