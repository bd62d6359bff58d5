//! Phase-one checkpoint
//!
//! Items that resolved a channel in phase one are kept on disk until the run
//! that consumes them persists its artifact, so a crash or cancellation
//! during phase two does not repeat phase one.

use std::path::Path;

use crate::crawl_engine::{CrawlResult, WorkItem};

/// Replace the checkpoint with `items`
pub async fn save_checkpoint(path: &Path, items: &[WorkItem]) -> CrawlResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec_pretty(items)
        .map_err(|e| crate::crawl_engine::CrawlError::Persistence(e.to_string()))?;

    // rename keeps a half-written file from ever being read back
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;

    log::debug!(
        target: "channelscout::checkpoint",
        "Checkpointed {} items to {}",
        items.len(),
        path.display()
    );
    Ok(())
}

/// Items left by an earlier run. A missing or unreadable checkpoint yields none.
pub async fn load_checkpoint(path: &Path) -> CrawlResult<Vec<WorkItem>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_slice::<Vec<WorkItem>>(&bytes) {
        Ok(items) => Ok(items.into_iter().filter(|i| i.author_channel.is_some()).collect()),
        Err(e) => {
            log::warn!(
                target: "channelscout::checkpoint",
                "Ignoring corrupt checkpoint {}: {e}",
                path.display()
            );
            Ok(Vec::new())
        }
    }
}

pub async fn clear_checkpoint(path: &Path) -> CrawlResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
