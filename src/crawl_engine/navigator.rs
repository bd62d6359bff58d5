//! Navigation with robots gating, redirect recovery and escalating retries.
//!
//! One call handles one target: up to three attempts, each preceded by a
//! robots.txt check and followed by extraction. The wait after every failed
//! attempt grows by 10%.

use log::{debug, error, info, warn};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::crawl_types::{CrawlError, CrawlPhase, CrawlResult, RetryState, seconds};
use super::extractor::{Extraction, ExtractionSettings, extract};
use super::robots::{ComplianceCheck, ComplianceReason, RobotsFetch, RobotsGate};
use crate::page_driver::PageDriver;
use crate::utils::{CHANNEL_LISTING_SUFFIX, RETRY_DELAY_MULTIPLIER, origin_of};

/// Everything one run's navigations share
#[derive(Debug)]
pub struct CrawlSession<F> {
    pub robots: RobotsGate<F>,
    pub user_agent: String,
    pub extraction: ExtractionSettings,
}

impl<F: RobotsFetch> CrawlSession<F> {
    #[must_use]
    pub fn new(robots: RobotsGate<F>, user_agent: impl Into<String>, extraction: ExtractionSettings) -> Self {
        Self {
            robots,
            user_agent: user_agent.into(),
            extraction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Sanitized link produced by extraction
    Extracted(String),
    /// robots.txt refused the target or could not be read
    Disallowed(ComplianceCheck),
    /// The channel listing was too short to pick from
    InsufficientContent,
    /// Extraction produced something unusable; not retried
    Rejected(String),
    /// Every attempt failed transiently
    Exhausted,
}

/// Result of [`enter_target`] plus the wait used on each attempt, in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationReport {
    pub outcome: NavigationOutcome,
    pub delays: Vec<f64>,
}

/// Sleep for `duration` unless the run is cancelled first
pub async fn cancellable_sleep(duration: Duration, cancel: &CancellationToken) -> CrawlResult<()> {
    tokio::select! {
        () = cancel.cancelled() => Err(CrawlError::Cancelled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

/// URL actually loaded for `target` in `phase`
#[must_use]
pub fn phase_url(target: &str, phase: CrawlPhase) -> String {
    match phase {
        CrawlPhase::FirstRun => target.to_string(),
        CrawlPhase::SecondRun => {
            format!("{}{CHANNEL_LISTING_SUFFIX}", target.trim_end_matches('/'))
        }
    }
}

/// Navigate to `target` and extract what `phase` is looking for
///
/// Only cancellation is returned as an error; every other failure ends up
/// in the report's outcome.
pub async fn enter_target<D, F>(
    driver: &mut D,
    session: &mut CrawlSession<F>,
    target: &str,
    base_delay: f64,
    phase: CrawlPhase,
    cancel: &CancellationToken,
) -> CrawlResult<NavigationReport>
where
    D: PageDriver,
    F: RobotsFetch,
{
    let intended = phase_url(target, phase);
    let mut state = RetryState::new(base_delay);
    let mut delays = Vec::new();

    let report = |outcome: NavigationOutcome, delays: Vec<f64>| -> CrawlResult<NavigationReport> {
        Ok(NavigationReport { outcome, delays })
    };

    let origin = match origin_of(&intended) {
        Ok(origin) => origin,
        Err(e) => {
            error!(target: "channelscout::navigate", "Cannot navigate to {intended}: {e}");
            return report(
                NavigationOutcome::Disallowed(ComplianceCheck {
                    allowed: false,
                    reason: ComplianceReason::InvalidTarget,
                }),
                delays,
            );
        }
    };

    while state.has_attempts_left() {
        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }
        delays.push(state.delay);

        let check = session
            .robots
            .check_allowed(&origin, &intended, &session.user_agent, cancel)
            .await;
        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }
        if !check.allowed {
            info!(
                target: "channelscout::navigate",
                "Skipping {intended} ({:?})",
                check.reason
            );
            return report(NavigationOutcome::Disallowed(check), delays);
        }

        match attempt(driver, &session.extraction, &intended, state.delay, phase, cancel).await {
            Ok(Extraction::Found(link)) => {
                info!(
                    target: "channelscout::navigate",
                    "{phase}: {target} -> {link} (attempt {})",
                    state.attempt + 1
                );
                return report(NavigationOutcome::Extracted(link), delays);
            }
            Ok(Extraction::InsufficientContent { found }) => {
                info!(
                    target: "channelscout::navigate",
                    "{phase}: {intended} lists only {found} uploads, skipping"
                );
                return report(NavigationOutcome::InsufficientContent, delays);
            }
            Err(CrawlError::Cancelled) => return Err(CrawlError::Cancelled),
            Err(e) if e.is_transient() => {
                warn!(
                    target: "channelscout::navigate",
                    "{phase}: attempt {} for {intended} failed: {e}",
                    state.attempt + 1
                );
                if state.is_last_attempt() {
                    error!(
                        target: "channelscout::navigate",
                        "{phase}: giving up on {intended} after {} attempts",
                        state.attempt + 1
                    );
                    break;
                }
                cancellable_sleep(state.wait(), cancel).await?;
                state.escalate();
            }
            Err(e) => {
                error!(target: "channelscout::navigate", "{phase}: dropping {target}: {e}");
                return report(NavigationOutcome::Rejected(e.to_string()), delays);
            }
        }
    }

    report(NavigationOutcome::Exhausted, delays)
}

/// One navigation attempt: load, settle, recover from a redirect, extract
async fn attempt<D: PageDriver>(
    driver: &mut D,
    settings: &ExtractionSettings,
    intended: &str,
    delay: f64,
    phase: CrawlPhase,
    cancel: &CancellationToken,
) -> CrawlResult<Extraction> {
    driver.navigate(intended).await?;
    cancellable_sleep(seconds(delay), cancel).await?;

    let landed = driver.current_url().await?;
    if landed != intended {
        debug!(
            target: "channelscout::navigate",
            "Redirected to {landed}, navigating to {intended} again"
        );
        cancellable_sleep(seconds(delay * RETRY_DELAY_MULTIPLIER), cancel).await?;
        driver.navigate(intended).await?;
        cancellable_sleep(seconds(delay), cancel).await?;
    }

    extract(driver, phase, settings).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_url() {
        let channel = "https://www.youtube.com/@someone";
        assert_eq!(phase_url(channel, CrawlPhase::FirstRun), channel);
        assert_eq!(
            phase_url(channel, CrawlPhase::SecondRun),
            "https://www.youtube.com/@someone/videos"
        );
        assert_eq!(
            phase_url("https://www.youtube.com/@someone/", CrawlPhase::SecondRun),
            "https://www.youtube.com/@someone/videos"
        );
    }
}
