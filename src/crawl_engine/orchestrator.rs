//! Main crawl orchestration logic
//!
//! One run walks `DeterminePhase -> FirstRun -> SecondRun -> Resolve ->
//! Persist`, entering at whichever phase the store and the checkpoint call
//! for. A resumed run still gives pending rows outside the checkpoint their
//! phase one. Navigation is strictly sequential over a single browser session,
//! launched only when a page actually has to be visited and released exactly
//! once however the run ends.

use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use super::cleanup::release_driver;
use super::crawl_types::{CrawlError, CrawlPhase, CrawlResult, HarvestRecord, WorkItem, seconds};
use super::delay_policy::compute_delay;
use super::extractor::ExtractionSettings;
use super::navigator::{CrawlSession, NavigationOutcome, cancellable_sleep, enter_target};
use super::robots::{RobotsFetch, RobotsGate};
use crate::config::HarvestConfig;
use crate::content_saver::{clear_checkpoint, load_checkpoint, persist_dataset, save_checkpoint};
use crate::content_store::{AuthorRow, ContentRow, ContentStore};
use crate::page_driver::{DriverError, PageDriver};
use crate::resolver::MetadataResolver;
use crate::utils::{
    ALLOWED_PLATFORMS, CHANNEL_URL_PREFIX, MAX_LISTING_ATTEMPTS, WATCH_URL_PREFIX, sanitize_url,
};

static PLATFORM_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid platform ref regex"));

/// What woke the phase decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTrigger {
    /// A scheduler tick
    Startup {
        pending_rows: usize,
        checkpointed_items: usize,
    },
    /// Phase one just finished
    FirstRunCompleted { channel_items: usize },
}

/// Which phase to run next, `None` when there is nothing to do
#[must_use]
pub fn determine_phase(trigger: PhaseTrigger) -> Option<CrawlPhase> {
    match trigger {
        PhaseTrigger::Startup {
            checkpointed_items, ..
        } if checkpointed_items > 0 => Some(CrawlPhase::SecondRun),
        PhaseTrigger::Startup { pending_rows, .. } if pending_rows > 0 => {
            Some(CrawlPhase::FirstRun)
        }
        PhaseTrigger::FirstRunCompleted { channel_items } if channel_items > 0 => {
            Some(CrawlPhase::SecondRun)
        }
        _ => None,
    }
}

/// How a run ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No pending rows and no checkpoint
    Idle,
    /// Phase one found no channel for any of `attempted` items
    NoChannels { attempted: usize },
    Persisted {
        path: PathBuf,
        records: usize,
        processed_rows: u64,
    },
}

/// Channels after phase two: finished for good, or worth another run
#[derive(Debug, Default)]
struct ChannelVisits {
    settled: Vec<WorkItem>,
    retry: Vec<WorkItem>,
}

/// Browser session that starts on first use
struct LazyDriver<D, L> {
    launch: Option<L>,
    driver: Option<D>,
}

impl<D, L, Fut> LazyDriver<D, L>
where
    D: PageDriver,
    L: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<D>>,
{
    fn new(launch: L) -> Self {
        Self {
            launch: Some(launch),
            driver: None,
        }
    }

    async fn get(&mut self) -> CrawlResult<&mut D> {
        if self.driver.is_none() {
            let launch = self
                .launch
                .take()
                .ok_or_else(|| CrawlError::Driver(DriverError::Closed))?;
            info!(target: "channelscout::crawl", "Launching browser session");
            let driver = launch()
                .await
                .map_err(|e| CrawlError::Driver(DriverError::Launch(format!("{e:#}"))))?;
            self.driver = Some(driver);
        }
        self.driver
            .as_mut()
            .ok_or(CrawlError::Driver(DriverError::Closed))
    }

    async fn release(self) {
        if let Some(driver) = self.driver {
            release_driver(driver).await;
        }
    }
}

/// Drives one run against a store, a resolver and a robots source
pub struct Orchestrator<S, R, F> {
    store: S,
    resolver: R,
    session: CrawlSession<F>,
    cache_dir: PathBuf,
    checkpoint_path: PathBuf,
    lookback: chrono::Duration,
}

impl<S, R, F> Orchestrator<S, R, F>
where
    S: ContentStore,
    R: MetadataResolver,
    F: RobotsFetch,
{
    pub fn new(
        config: &HarvestConfig,
        store: S,
        resolver: R,
        fetcher: F,
        user_agent: impl Into<String>,
    ) -> Self {
        let extraction = ExtractionSettings {
            thumbnail_offset: config.thumbnail_offset(),
            thumbnail_min_count: config.thumbnail_min_count(),
        };
        Self {
            store,
            resolver,
            session: CrawlSession::new(
                RobotsGate::new(fetcher, config.robots_fetch_floor()),
                user_agent,
                extraction,
            ),
            cache_dir: config.cache_dir().to_path_buf(),
            checkpoint_path: config.checkpoint_path(),
            lookback: config.lookback_window(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &CrawlSession<F> {
        &self.session
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one tick. `launch` starts the browser and is only called when a
    /// page has to be visited.
    pub async fn run<D, L, Fut>(
        &mut self,
        launch: L,
        cancel: &CancellationToken,
    ) -> CrawlResult<RunOutcome>
    where
        D: PageDriver,
        L: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<D>>,
    {
        let rows = self.store.recent_content(self.lookback).await?;
        let checkpointed = load_checkpoint(&self.checkpoint_path).await?;

        let trigger = PhaseTrigger::Startup {
            pending_rows: rows.len(),
            checkpointed_items: checkpointed.len(),
        };
        let Some(phase) = determine_phase(trigger) else {
            info!(target: "channelscout::crawl", "No unprocessed content, nothing to do");
            return Ok(RunOutcome::Idle);
        };
        info!(
            target: "channelscout::crawl",
            "Starting at {phase} ({} pending rows, {} checkpointed items)",
            rows.len(),
            checkpointed.len()
        );

        let mut driver = LazyDriver::new(launch);
        let result = self
            .execute(phase, rows, checkpointed, &mut driver, cancel)
            .await;
        driver.release().await;

        match &result {
            Ok(outcome) => info!(target: "channelscout::crawl", "Run finished: {outcome:?}"),
            Err(CrawlError::Cancelled) => warn!(target: "channelscout::crawl", "Run cancelled"),
            Err(e) => error!(target: "channelscout::crawl", "Run failed: {e}"),
        }
        result
    }

    async fn execute<D, L, Fut>(
        &mut self,
        phase: CrawlPhase,
        rows: Vec<ContentRow>,
        checkpointed: Vec<WorkItem>,
        driver: &mut LazyDriver<D, L>,
        cancel: &CancellationToken,
    ) -> CrawlResult<RunOutcome>
    where
        D: PageDriver,
        L: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<D>>,
    {
        let channel_items = match phase {
            CrawlPhase::FirstRun => {
                let (channel_items, attempted) = self.first_run(&rows, driver, cancel).await?;
                let trigger = PhaseTrigger::FirstRunCompleted {
                    channel_items: channel_items.len(),
                };
                if determine_phase(trigger).is_none() {
                    warn!(target: "channelscout::crawl", "No channel found for any of {attempted} items");
                    return Ok(RunOutcome::NoChannels { attempted });
                }
                save_checkpoint(&self.checkpoint_path, &channel_items).await?;
                channel_items
            }
            CrawlPhase::SecondRun => {
                let mut items = checkpointed;
                let fresh = rows_outside(&rows, &items);
                if !fresh.is_empty() {
                    info!(
                        target: "channelscout::crawl",
                        "{} pending rows are not checkpointed, running phase one for them",
                        fresh.len()
                    );
                    let (found, _) = self.first_run(&fresh, driver, cancel).await?;
                    if !found.is_empty() {
                        items.extend(found);
                        save_checkpoint(&self.checkpoint_path, &items).await?;
                    }
                }
                items
            }
        };

        let ChannelVisits { settled, retry } = self.second_run(channel_items, driver, cancel).await?;
        let processed_ids: Vec<i64> = settled
            .iter()
            .flat_map(|item| item.source_ids.iter().copied())
            .collect();

        let records = self.resolve(settled, cancel).await?;
        if records.is_empty() {
            // dead ends must not hold the checkpoint forever
            self.settle(&processed_ids, &retry).await?;
            return Err(CrawlError::Persistence(
                "no channel produced a resolvable upload".into(),
            ));
        }

        let path = persist_dataset(&self.cache_dir, &records).await?;
        let processed_rows = self.settle(&processed_ids, &retry).await?;

        Ok(RunOutcome::Persisted {
            path,
            records: records.len(),
            processed_rows,
        })
    }

    /// Mark finished rows processed and keep only retryable channels checkpointed
    async fn settle(&self, processed_ids: &[i64], retry: &[WorkItem]) -> CrawlResult<u64> {
        let processed_rows = self.store.mark_processed(processed_ids).await?;
        if retry.is_empty() {
            clear_checkpoint(&self.checkpoint_path).await?;
        } else {
            info!(
                target: "channelscout::crawl",
                "Keeping {} unreachable channels for the next run",
                retry.len()
            );
            save_checkpoint(&self.checkpoint_path, retry).await?;
        }
        Ok(processed_rows)
    }

    /// Content page to channel. Returns the items with a channel and how
    /// many items there were.
    async fn first_run<D, L, Fut>(
        &mut self,
        rows: &[ContentRow],
        driver: &mut LazyDriver<D, L>,
        cancel: &CancellationToken,
    ) -> CrawlResult<(Vec<WorkItem>, usize)>
    where
        D: PageDriver,
        L: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<D>>,
    {
        let mut items = build_work_items(rows)?;
        let known = self.store.authors_for_content(rows).await?;
        let seeded = seed_known_channels(&mut items, &known);
        if seeded > 0 {
            info!(target: "channelscout::crawl", "{seeded} items already have a known channel");
        }

        let attempted = items.len();
        let mut resolved = Vec::with_capacity(attempted);
        for mut item in items {
            if item.author_channel.is_some() {
                resolved.push(item);
                continue;
            }
            if cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }

            let delay = compute_delay(&item.target);
            debug!(target: "channelscout::crawl", "Waiting {delay:.1}s before {}", item.target);
            cancellable_sleep(seconds(delay), cancel).await?;

            let report = enter_target(
                driver.get().await?,
                &mut self.session,
                &item.target,
                delay,
                CrawlPhase::FirstRun,
                cancel,
            )
            .await?;

            match report.outcome {
                NavigationOutcome::Extracted(channel) => {
                    item.author_channel = Some(channel);
                    resolved.push(item);
                }
                outcome => {
                    warn!(target: "channelscout::crawl", "No channel for {}: {outcome:?}", item.target);
                }
            }
        }

        Ok((resolved, attempted))
    }

    /// Channel listing to latest upload. Every channel either settles, with
    /// or without `latest_content`, or is kept for a later run when its
    /// listing could not be reached.
    async fn second_run<D, L, Fut>(
        &mut self,
        items: Vec<WorkItem>,
        driver: &mut LazyDriver<D, L>,
        cancel: &CancellationToken,
    ) -> CrawlResult<ChannelVisits>
    where
        D: PageDriver,
        L: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<D>>,
    {
        let channels = collapse_by_channel(items);
        info!(target: "channelscout::crawl", "Visiting {} unique channels", channels.len());

        let mut visits = ChannelVisits::default();
        for mut item in channels {
            if cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }
            let Some(channel) = item.author_channel.clone() else {
                continue;
            };

            let delay = compute_delay(&channel);
            debug!(target: "channelscout::crawl", "Waiting {delay:.1}s before {channel}");
            cancellable_sleep(seconds(delay), cancel).await?;

            let report = enter_target(
                driver.get().await?,
                &mut self.session,
                &channel,
                delay,
                CrawlPhase::SecondRun,
                cancel,
            )
            .await?;

            match report.outcome {
                NavigationOutcome::Extracted(latest) => item.set_latest_content(latest)?,
                NavigationOutcome::Exhausted => {
                    item.listing_attempts += 1;
                    if item.listing_attempts < MAX_LISTING_ATTEMPTS {
                        warn!(
                            target: "channelscout::crawl",
                            "Listing for {channel} unreachable ({}/{MAX_LISTING_ATTEMPTS}), retrying next run",
                            item.listing_attempts
                        );
                        visits.retry.push(item);
                        continue;
                    }
                    error!(
                        target: "channelscout::crawl",
                        "Giving up on {channel} after {MAX_LISTING_ATTEMPTS} runs"
                    );
                }
                outcome => {
                    warn!(target: "channelscout::crawl", "No latest upload for {channel}: {outcome:?}");
                }
            }
            visits.settled.push(item);
        }

        Ok(visits)
    }

    async fn resolve(
        &self,
        items: Vec<WorkItem>,
        cancel: &CancellationToken,
    ) -> CrawlResult<Vec<HarvestRecord>> {
        let mut records = Vec::new();
        for item in items {
            if cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }
            let Some(latest) = item.latest_content.as_deref() else {
                continue;
            };
            match self.resolver.resolve(latest).await {
                Ok(metadata) => records.push(HarvestRecord { item, metadata }),
                Err(e) => warn!(target: "channelscout::crawl", "Dropping {latest}: {e}"),
            }
        }
        Ok(records)
    }
}

/// Turn store rows into phase-one items. Any malformed row fails the run.
pub fn build_work_items(rows: &[ContentRow]) -> CrawlResult<Vec<WorkItem>> {
    rows.iter()
        .map(|row| {
            if !ALLOWED_PLATFORMS.contains(&row.platform.as_str()) {
                return Err(CrawlError::Validation(format!(
                    "row {} has unsupported platform '{}'",
                    row.id, row.platform
                )));
            }
            if !PLATFORM_REF.is_match(&row.platform_ref) {
                return Err(CrawlError::Validation(format!(
                    "row {} has malformed platform ref '{}'",
                    row.id, row.platform_ref
                )));
            }
            let target = sanitize_url(&format!("{WATCH_URL_PREFIX}{}", row.platform_ref))?;
            Ok(WorkItem::new(target, &row.author, row.id))
        })
        .collect()
}

/// Rows no checkpointed item stands for
fn rows_outside(rows: &[ContentRow], items: &[WorkItem]) -> Vec<ContentRow> {
    rows.iter()
        .filter(|row| !items.iter().any(|item| item.source_ids.contains(&row.id)))
        .cloned()
        .collect()
}

/// Give items the channel the store already knows; returns how many were seeded
pub fn seed_known_channels(items: &mut [WorkItem], known: &[AuthorRow]) -> usize {
    let channels: HashMap<i64, &str> = known
        .iter()
        .filter_map(|row| Some((row.content_id, row.channel_ref.as_deref()?)))
        .collect();

    let mut seeded = 0;
    for item in items.iter_mut() {
        let Some(channel_ref) = item.source_ids.first().and_then(|id| channels.get(id)) else {
            continue;
        };
        if !PLATFORM_REF.is_match(channel_ref) {
            warn!(target: "channelscout::crawl", "Ignoring malformed channel ref '{channel_ref}'");
            continue;
        }
        match sanitize_url(&format!("{CHANNEL_URL_PREFIX}{channel_ref}")) {
            Ok(channel) => {
                item.author_channel = Some(channel);
                seeded += 1;
            }
            Err(e) => warn!(target: "channelscout::crawl", "Ignoring channel ref '{channel_ref}': {e}"),
        }
    }
    seeded
}

/// One item per channel, in first-seen order, carrying every source row
pub fn collapse_by_channel(items: Vec<WorkItem>) -> Vec<WorkItem> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<WorkItem> = Vec::new();

    for item in items {
        let Some(channel) = item.author_channel.clone() else {
            continue;
        };
        match index.get(&channel) {
            Some(&i) => {
                let existing = &mut unique[i];
                for id in item.source_ids {
                    if !existing.source_ids.contains(&id) {
                        existing.source_ids.push(id);
                    }
                }
            }
            None => {
                index.insert(channel, unique.len());
                unique.push(item);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, platform: &str, platform_ref: &str) -> ContentRow {
        ContentRow {
            id,
            platform: platform.into(),
            platform_ref: platform_ref.into(),
            author: format!("author {id}"),
        }
    }

    #[test]
    fn test_determine_phase() {
        let startup = |pending_rows, checkpointed_items| PhaseTrigger::Startup {
            pending_rows,
            checkpointed_items,
        };
        assert_eq!(determine_phase(startup(3, 0)), Some(CrawlPhase::FirstRun));
        assert_eq!(determine_phase(startup(3, 2)), Some(CrawlPhase::SecondRun));
        assert_eq!(determine_phase(startup(0, 0)), None);
        assert_eq!(
            determine_phase(PhaseTrigger::FirstRunCompleted { channel_items: 1 }),
            Some(CrawlPhase::SecondRun)
        );
        assert_eq!(
            determine_phase(PhaseTrigger::FirstRunCompleted { channel_items: 0 }),
            None
        );
    }

    #[test]
    fn test_build_work_items() {
        let items = build_work_items(&[row(7, "youtube", "abc_123-X")]).unwrap();
        assert_eq!(items[0].target, "https://www.youtube.com/watch?v=abc_123-X");
        assert_eq!(items[0].source_ids, vec![7]);

        assert!(matches!(
            build_work_items(&[row(1, "vimeo", "abc")]),
            Err(CrawlError::Validation(_))
        ));
        assert!(matches!(
            build_work_items(&[row(1, "youtube", "abc&x=1")]),
            Err(CrawlError::Validation(_))
        ));
    }

    #[test]
    fn test_seed_known_channels() {
        let mut items = build_work_items(&[row(1, "youtube", "a"), row(2, "youtube", "b")]).unwrap();
        let known = vec![
            AuthorRow {
                content_id: 2,
                channel_ref: Some("UC123".into()),
            },
            AuthorRow {
                content_id: 1,
                channel_ref: None,
            },
        ];
        assert_eq!(seed_known_channels(&mut items, &known), 1);
        assert!(items[0].author_channel.is_none());
        assert_eq!(
            items[1].author_channel.as_deref(),
            Some("https://www.youtube.com/channel/UC123")
        );
    }

    #[test]
    fn test_collapse_by_channel_merges_sources() {
        let mut items = build_work_items(&[
            row(1, "youtube", "a"),
            row(2, "youtube", "b"),
            row(3, "youtube", "c"),
        ])
        .unwrap();
        items[0].author_channel = Some("https://www.youtube.com/@x".into());
        items[1].author_channel = Some("https://www.youtube.com/@y".into());
        items[2].author_channel = Some("https://www.youtube.com/@x".into());

        let unique = collapse_by_channel(items);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].source_ids, vec![1, 3]);
        assert_eq!(unique[1].source_ids, vec![2]);
    }

    #[test]
    fn test_rows_outside_checkpoint() {
        let rows = vec![row(1, "youtube", "a"), row(2, "youtube", "b")];
        let checkpointed = build_work_items(&rows[..1]).unwrap();
        let fresh = rows_outside(&rows, &checkpointed);
        assert_eq!(fresh.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2]);
    }
}
