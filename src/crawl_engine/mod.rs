//! Crawl Engine Module
//!
//! This module contains the two-phase crawl: the robots gate, the delay
//! policy, navigation with retries, extraction, and the orchestrator that
//! sequences them into a run.

// Sub-modules
pub mod cleanup;
pub mod crawl_types;
pub mod delay_policy;
pub mod extractor;
pub mod navigator;
pub mod orchestrator;
pub mod page_timeout;
pub mod robots;

// Re-export crawl types
pub use crawl_types::{
    CrawlError, CrawlPhase, CrawlResult, HarvestRecord, RetryState, WorkItem, seconds,
};

pub use delay_policy::compute_delay;
pub use extractor::{Extraction, ExtractionSettings, extract};
pub use navigator::{
    CrawlSession, NavigationOutcome, NavigationReport, cancellable_sleep, enter_target, phase_url,
};
pub use orchestrator::{Orchestrator, PhaseTrigger, RunOutcome, determine_phase};
pub use robots::{
    ComplianceCheck, ComplianceReason, HttpRobotsFetcher, RobotsFetch, RobotsFetchError,
    RobotsGate, RobotsResponse, RobotsRules,
};
pub use cleanup::{CleanupResult, release_driver};
