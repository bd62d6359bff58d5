//! `PageDriver` over a chromiumoxide browser session

use chromiumoxide::element::Element;
use chromiumoxide::{Browser, Page};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use super::{DriverError, PageDriver, PageElement};
use crate::browser_profile::BrowserProfile;
use crate::browser_setup::{launch_browser, resolve_browser_executable};
use crate::config::HarvestConfig;
use crate::crawl_engine::cleanup::{CleanupResult, cleanup_browser_and_profile};
use crate::crawl_engine::page_timeout::with_page_timeout;

/// One Chrome session with a single tab and its own temporary profile
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    profile: BrowserProfile,
    page_load_timeout_secs: u64,
}

impl ChromiumDriver {
    /// Start a browser presenting `user_agent` for the whole session
    pub async fn launch(config: &HarvestConfig, user_agent: &str) -> anyhow::Result<Self> {
        let executable = resolve_browser_executable(config.browser_executable()).await?;
        let profile = BrowserProfile::create(&config.profiles_dir())?;
        let timeout_secs = config.page_load_timeout_secs();

        let (mut browser, handler_task) = launch_browser(
            executable,
            config.headless(),
            user_agent,
            profile.path(),
            Duration::from_secs(timeout_secs),
        )
        .await?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // the profile is removed when it drops
                let _ = browser.close().await;
                handler_task.abort();
                return Err(anyhow::anyhow!("Failed to open initial tab: {e}"));
            }
        };

        info!("Browser session started with profile {}", profile.path().display());
        Ok(Self {
            browser,
            page,
            handler_task,
            profile,
            page_load_timeout_secs: timeout_secs,
        })
    }

    async fn snapshot(&self, element: &Element) -> Result<PageElement, DriverError> {
        let href = element
            .attribute("href")
            .await
            .map_err(|e| DriverError::Protocol(format!("reading href: {e}")))?;
        let text = element.inner_text().await.ok().flatten();

        // anchors often carry site-relative links
        let href = match href {
            Some(raw) => Some(self.absolutize(&raw).await),
            None => None,
        };
        Ok(PageElement { href, text })
    }

    async fn absolutize(&self, href: &str) -> String {
        if url::Url::parse(href).is_ok() {
            return href.to_string();
        }
        let base = self.page.url().await.ok().flatten();
        base.and_then(|b| url::Url::parse(&b).ok())
            .and_then(|b| b.join(href).ok())
            .map_or_else(|| href.to_string(), String::from)
    }
}

impl PageDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        debug!("Navigating to {url}");
        with_page_timeout(
            async {
                self.page
                    .goto(url)
                    .await
                    .map(|_| ())
                    .map_err(|e| DriverError::Navigation(format!("{url}: {e}")))
            },
            self.page_load_timeout_secs,
            "Page navigation",
        )
        .await
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| DriverError::Protocol(e.to_string()))?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn find_element(&mut self, selector: &str) -> Result<Option<PageElement>, DriverError> {
        let element = match with_page_timeout(
            async {
                self.page
                    .find_element(selector)
                    .await
                    .map_err(|e| DriverError::Protocol(e.to_string()))
            },
            self.page_load_timeout_secs,
            "Element lookup",
        )
        .await
        {
            Ok(element) => element,
            Err(e) => {
                // chromiumoxide reports a missing node as an error
                trace!("No element for '{selector}': {e}");
                return Ok(None);
            }
        };
        self.snapshot(&element).await.map(Some)
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<PageElement>, DriverError> {
        let elements = with_page_timeout(
            async {
                self.page
                    .find_elements(selector)
                    .await
                    .map_err(|e| DriverError::Protocol(e.to_string()))
            },
            self.page_load_timeout_secs,
            "Element lookup",
        )
        .await?;

        let mut snapshots = Vec::with_capacity(elements.len());
        for element in &elements {
            snapshots.push(self.snapshot(element).await?);
        }
        Ok(snapshots)
    }

    async fn execute_script(&mut self, script: &str) -> Result<serde_json::Value, DriverError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| DriverError::Protocol(format!("script evaluation: {e}")))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn quit(self) -> Result<(), DriverError> {
        let Self {
            browser,
            page,
            handler_task,
            profile,
            ..
        } = self;
        drop(page);

        match cleanup_browser_and_profile(browser, handler_task, profile).await {
            CleanupResult::Success => Ok(()),
            CleanupResult::PartialFailure(errors) => Err(DriverError::Protocol(errors.join("; "))),
        }
    }
}
