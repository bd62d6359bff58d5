//! Pulls the one link each phase is after out of a loaded page.

use log::{debug, info};

use super::crawl_types::{CrawlError, CrawlPhase, CrawlResult};
use crate::page_driver::PageDriver;
use crate::utils::{CHANNEL_ANCHOR_SELECTOR, THUMBNAIL_ANCHOR_SELECTOR, sanitize_url};

/// Brings lazily rendered listing thumbnails into the DOM
fn scroll_listing_script() -> String {
    // a JSON string literal is a valid JS string literal
    let selector = serde_json::Value::from(THUMBNAIL_ANCHOR_SELECTOR);
    format!(
        "(function() {{
            window.scrollTo(0, document.documentElement.scrollHeight);
            return document.querySelectorAll({selector}).length;
        }})()"
    )
}

/// Which thumbnail counts as latest and how many a listing needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionSettings {
    pub thumbnail_offset: usize,
    pub thumbnail_min_count: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            thumbnail_offset: crate::utils::DEFAULT_THUMBNAIL_OFFSET,
            thumbnail_min_count: crate::utils::DEFAULT_THUMBNAIL_MIN_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Sanitized link
    Found(String),
    /// The listing had fewer thumbnails than required
    InsufficientContent { found: usize },
}

/// Run the extraction for `phase` against the page the driver is on
///
/// A missing anchor is an `ElementMissing` error and may be retried; a link
/// that fails sanitizing is an `InvalidUrl` error and must not be.
pub async fn extract<D: PageDriver>(
    driver: &mut D,
    phase: CrawlPhase,
    settings: &ExtractionSettings,
) -> CrawlResult<Extraction> {
    match phase {
        CrawlPhase::FirstRun => extract_channel(driver).await,
        CrawlPhase::SecondRun => extract_latest(driver, settings).await,
    }
}

async fn extract_channel<D: PageDriver>(driver: &mut D) -> CrawlResult<Extraction> {
    let anchor = driver
        .find_element(CHANNEL_ANCHOR_SELECTOR)
        .await?
        .ok_or_else(|| CrawlError::ElementMissing(CHANNEL_ANCHOR_SELECTOR.to_string()))?;
    let href = anchor
        .href
        .ok_or_else(|| CrawlError::ElementMissing(format!("{CHANNEL_ANCHOR_SELECTOR} href")))?;

    let channel = sanitize_url(&href)?;
    debug!(target: "channelscout::extract", "Found channel {channel}");
    Ok(Extraction::Found(channel))
}

async fn extract_latest<D: PageDriver>(
    driver: &mut D,
    settings: &ExtractionSettings,
) -> CrawlResult<Extraction> {
    driver.execute_script(&scroll_listing_script()).await?;

    let thumbnails = driver.find_elements(THUMBNAIL_ANCHOR_SELECTOR).await?;
    if thumbnails.len() < settings.thumbnail_min_count {
        info!(
            target: "channelscout::extract",
            "Listing has {} thumbnails, need {}",
            thumbnails.len(),
            settings.thumbnail_min_count
        );
        return Ok(Extraction::InsufficientContent {
            found: thumbnails.len(),
        });
    }

    let href = thumbnails
        .get(settings.thumbnail_offset)
        .and_then(|t| t.href.clone())
        .ok_or_else(|| {
            CrawlError::ElementMissing(format!(
                "{THUMBNAIL_ANCHOR_SELECTOR}[{}] href",
                settings.thumbnail_offset
            ))
        })?;

    let latest = sanitize_url(&href)?;
    debug!(target: "channelscout::extract", "Found latest upload {latest}");
    Ok(Extraction::Found(latest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_script_uses_thumbnail_selector() {
        let script = scroll_listing_script();
        assert!(script.contains(&format!("querySelectorAll(\"{THUMBNAIL_ANCHOR_SELECTOR}\")")));
    }
}
