//! robots.txt compliance gate
//!
//! Fetches, parses and caches robots.txt per origin and answers whether a
//! user agent may fetch a target. The cache lives for one run and holds at
//! most one entry per origin. A failed fetch caches nothing, so the next
//! check for that origin fetches again, and the check itself fails closed.
//!
//! Every fetch-and-parse attempt takes at least `fetch_floor` of wall-clock
//! time; when the attempt is quicker the remainder is slept off.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use texting_robots::Robot;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::crawl_types::CrawlError;
use super::navigator::cancellable_sleep;
use crate::utils::{ROBOTS_REQUEST_TIMEOUT_SECS, robots_path_of};

/// Outcome of a robots.txt request that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsResponse {
    /// 2xx with the file body
    Body(String),
    /// 401 or 403: the whole origin is off limits
    Unauthorized(u16),
    /// Any other 4xx: there is no robots.txt, everything is allowed
    ClientError(u16),
}

/// A robots.txt fetch that produced nothing usable
#[derive(Debug, Error)]
pub enum RobotsFetchError {
    #[error("robots.txt request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("robots.txt returned status {1} for {0}")]
    Status(String, u16),

    #[error("failed to read robots.txt body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("unparseable robots.txt: {0}")]
    Parse(String),

    #[error("robots.txt fetch cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Source of robots.txt documents
pub trait RobotsFetch {
    fn fetch(
        &self,
        robots_url: &str,
    ) -> impl Future<Output = Result<RobotsResponse, RobotsFetchError>>;
}

/// Plain HTTPS fetcher
#[derive(Debug, Clone)]
pub struct HttpRobotsFetcher {
    client: reqwest::Client,
}

impl HttpRobotsFetcher {
    pub fn new(user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(ROBOTS_REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

impl RobotsFetch for HttpRobotsFetcher {
    async fn fetch(&self, robots_url: &str) -> Result<RobotsResponse, RobotsFetchError> {
        let response = self
            .client
            .get(robots_url)
            .send()
            .await
            .map_err(RobotsFetchError::Request)?;

        let status = response.status().as_u16();
        match status {
            200..=299 => {
                let body = response.text().await.map_err(RobotsFetchError::Body)?;
                Ok(RobotsResponse::Body(body))
            }
            401 | 403 => Ok(RobotsResponse::Unauthorized(status)),
            400..=499 => Ok(RobotsResponse::ClientError(status)),
            _ => Err(RobotsFetchError::Status(robots_url.to_string(), status)),
        }
    }
}

/// Directives cached for one origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsRules {
    AllowAll,
    DisallowAll,
    /// A robots.txt body known to parse
    Parsed(String),
}

impl RobotsRules {
    /// Validate a robots.txt body
    pub fn parse(body: &str) -> Result<Self, RobotsFetchError> {
        Robot::new("*", body.as_bytes())
            .map_err(|e| RobotsFetchError::Parse(format!("{e:#}")))?;
        Ok(Self::Parsed(body.to_string()))
    }

    /// Whether `user_agent` may fetch `target`
    ///
    /// Groups are selected by the agent's product token. A body that no
    /// longer parses denies.
    #[must_use]
    pub fn can_fetch(&self, user_agent: &str, target: &str) -> bool {
        match self {
            Self::AllowAll => true,
            Self::DisallowAll => false,
            // Robot is not Clone, so the body is cached and compiled per check
            Self::Parsed(body) => Robot::new(&product_token(user_agent), body.as_bytes())
                .map(|robot| robot.allowed(target))
                .unwrap_or(false),
        }
    }
}

/// `Mozilla/5.0 (X11)` -> `mozilla`
fn product_token(user_agent: &str) -> String {
    user_agent
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Cached robots.txt for one origin
#[derive(Debug, Clone)]
pub struct RobotsEntry {
    pub origin: String,
    pub rules: RobotsRules,
    pub fetched_at: DateTime<Utc>,
}

/// Why a compliance check came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceReason {
    Permitted,
    DisallowedByRules,
    /// robots.txt could not be fetched or parsed
    RobotsUnavailable,
    /// The target URL itself could not be evaluated
    InvalidTarget,
}

/// Verdict of the compliance gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplianceCheck {
    pub allowed: bool,
    pub reason: ComplianceReason,
}

impl ComplianceCheck {
    const fn new(allowed: bool, reason: ComplianceReason) -> Self {
        Self { allowed, reason }
    }
}

/// Per-run robots.txt cache and evaluator
#[derive(Debug)]
pub struct RobotsGate<F> {
    fetcher: F,
    cache: HashMap<String, RobotsEntry>,
    fetch_floor: Duration,
}

impl<F: RobotsFetch> RobotsGate<F> {
    #[must_use]
    pub fn new(fetcher: F, fetch_floor: Duration) -> Self {
        Self {
            fetcher,
            cache: HashMap::new(),
            fetch_floor,
        }
    }

    /// Whether `origin` has a cached entry
    #[must_use]
    pub fn is_cached(&self, origin: &str) -> bool {
        self.cache.contains_key(origin)
    }

    #[must_use]
    pub fn entry(&self, origin: &str) -> Option<&RobotsEntry> {
        self.cache.get(origin)
    }

    /// May `user_agent` fetch `target` on `origin`?
    ///
    /// Fetches and caches robots.txt on first use of an origin. Never allows
    /// a target whose robots status is unknown, including when `cancel` fires
    /// during the fetch.
    pub async fn check_allowed(
        &mut self,
        origin: &str,
        target: &str,
        user_agent: &str,
        cancel: &CancellationToken,
    ) -> ComplianceCheck {
        if !self.cache.contains_key(origin) {
            match self.fetch_entry(origin, cancel).await {
                Ok(entry) => {
                    self.cache.insert(origin.to_string(), entry);
                }
                Err(e) => {
                    warn!(target: "channelscout::robots", "robots.txt unavailable for {origin}: {e}");
                    return ComplianceCheck::new(false, ComplianceReason::RobotsUnavailable);
                }
            }
        }

        let Some(entry) = self.cache.get(origin) else {
            return ComplianceCheck::new(false, ComplianceReason::RobotsUnavailable);
        };

        if robots_path_of(target).is_err() {
            warn!(target: "channelscout::robots", "Cannot evaluate robots rules for {target}");
            return ComplianceCheck::new(false, ComplianceReason::InvalidTarget);
        }

        if entry.rules.can_fetch(user_agent, target) {
            ComplianceCheck::new(true, ComplianceReason::Permitted)
        } else {
            info!(target: "channelscout::robots", "robots.txt on {origin} disallows {target}");
            ComplianceCheck::new(false, ComplianceReason::DisallowedByRules)
        }
    }

    async fn fetch_entry(
        &self,
        origin: &str,
        cancel: &CancellationToken,
    ) -> Result<RobotsEntry, RobotsFetchError> {
        let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));
        debug!(target: "channelscout::robots", "Fetching {robots_url}");

        let started = Instant::now();
        let result = self
            .fetcher
            .fetch(&robots_url)
            .await
            .and_then(|response| {
                let rules = match response {
                    RobotsResponse::Body(body) => RobotsRules::parse(&body)?,
                    RobotsResponse::Unauthorized(status) => {
                        debug!("robots.txt for {origin} returned {status}, disallowing all");
                        RobotsRules::DisallowAll
                    }
                    RobotsResponse::ClientError(status) => {
                        debug!("robots.txt for {origin} returned {status}, allowing all");
                        RobotsRules::AllowAll
                    }
                };
                Ok(RobotsEntry {
                    origin: origin.to_string(),
                    rules,
                    fetched_at: Utc::now(),
                })
            });

        let elapsed = started.elapsed();
        if elapsed < self.fetch_floor {
            match cancellable_sleep(self.fetch_floor - elapsed, cancel).await {
                Ok(()) => {}
                Err(CrawlError::Cancelled) => return Err(RobotsFetchError::Cancelled),
                Err(e) => return Err(RobotsFetchError::Other(e.to_string())),
            }
        }

        result
    }
}
