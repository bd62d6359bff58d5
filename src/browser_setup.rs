//! Chromium discovery and launch
//!
//! The executable comes from config when set, otherwise from `PATH`, and only
//! when both come up empty is a managed build downloaded into the user cache.

use anyhow::{Context, Result, bail};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

use crate::utils::{BROWSER_BINARY_NAMES, MANAGED_BROWSER_DIR};

/// Pick the browser binary for this run
///
/// A configured path that does not exist is an error; it never falls back.
pub async fn resolve_browser_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if !path.is_file() {
            bail!("Configured browser executable does not exist: {}", path.display());
        }
        debug!("Using configured browser {}", path.display());
        return Ok(path.to_path_buf());
    }

    if let Some(path) = find_on_path(BROWSER_BINARY_NAMES, std::env::var_os("PATH").as_deref()) {
        info!("Found browser on PATH: {}", path.display());
        return Ok(path);
    }

    warn!("No Chromium on PATH, downloading a managed build");
    download_managed_browser().await
}

/// First `names` entry that resolves to an executable on `path_var`
pub fn find_on_path(names: &[&str], path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    names
        .iter()
        .find_map(|name| which::which_in(name, Some(path_var), Path::new(".")).ok())
}

/// Fetch Chromium into the user cache and return its executable
pub async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(MANAGED_BROWSER_DIR);
    tokio::fs::create_dir_all(&cache_dir)
        .await
        .with_context(|| format!("Failed to create {}", cache_dir.display()))?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );
    let revision = fetcher.fetch().await.context("Failed to fetch browser")?;

    info!("Managed Chromium ready at {}", revision.folder_path.display());
    Ok(revision.executable_path)
}

/// Start Chromium for one crawl session and spawn its CDP handler
///
/// Every page of the session presents `user_agent`. The profile directory is
/// owned by the caller.
pub async fn launch_browser(
    executable: PathBuf,
    headless: bool,
    user_agent: &str,
    user_data_dir: &Path,
    request_timeout: Duration,
) -> Result<(Browser, JoinHandle<()>)> {
    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(request_timeout)
        .window_size(1366, 768)
        .user_data_dir(user_data_dir.to_path_buf())
        .chrome_executable(executable)
        .arg(format!("--user-agent={user_agent}"))
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .arg("--mute-audio");
    builder = if headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    let config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .context("Failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(event) = handler.next().await {
            // chromiumoxide cannot decode every CDP event newer browsers send
            if let Err(e) = event {
                trace!("Browser handler: {e}");
            }
        }
        debug!("Browser handler finished");
    });

    Ok((browser, handler_task))
}
