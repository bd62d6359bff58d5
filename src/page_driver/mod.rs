//! Page driver boundary
//!
//! The crawl engine only ever talks to a browser through [`PageDriver`]. One
//! driver is one browser session; it is never shared between concurrent
//! navigations and it is released exactly once through [`PageDriver::quit`],
//! which consumes it.

pub mod chromium;

use std::future::Future;
use thiserror::Error;

pub use chromium::ChromiumDriver;

/// Failure reported by a page driver
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("browser protocol error: {0}")]
    Protocol(String),

    #[error("{0}")]
    Timeout(String),

    #[error("session already closed")]
    Closed,
}

/// Snapshot of an element taken when it was queried
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageElement {
    /// Resolved (absolute) link target for anchors
    pub href: Option<String>,
    pub text: Option<String>,
}

impl PageElement {
    #[must_use]
    pub fn anchor(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            text: None,
        }
    }
}

/// Browser automation capability used by navigation and extraction
pub trait PageDriver {
    fn navigate(&mut self, url: &str) -> impl Future<Output = Result<(), DriverError>>;

    fn current_url(&mut self) -> impl Future<Output = Result<String, DriverError>>;

    /// First element matching `selector`, `None` when absent
    fn find_element(
        &mut self,
        selector: &str,
    ) -> impl Future<Output = Result<Option<PageElement>, DriverError>>;

    /// Every element matching `selector`, in document order
    fn find_elements(
        &mut self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<PageElement>, DriverError>>;

    fn execute_script(
        &mut self,
        script: &str,
    ) -> impl Future<Output = Result<serde_json::Value, DriverError>>;

    /// End the session and release everything it holds
    fn quit(self) -> impl Future<Output = Result<(), DriverError>>
    where
        Self: Sized;
}
