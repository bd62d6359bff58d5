use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::crawl_engine::{CrawlError, CrawlResult};

/// Mode of the written artifact: rw-r--r--
pub const ARTIFACT_MODE: u32 = 0o644;

/// Write one run's dataset as a pretty JSON array to `<dir>/<unix_ts>.json`
///
/// Fails without touching the filesystem when the dataset is empty, when
/// `dir` is empty, or when it contains a `..` component.
pub async fn persist_dataset<T: Serialize>(dir: &Path, records: &[T]) -> CrawlResult<PathBuf> {
    write_artifact(dir, chrono::Utc::now().timestamp(), records).await
}

/// Write `<dir>/<stamp>.json`, refusing to replace an existing artifact
pub(crate) async fn write_artifact<T: Serialize>(
    dir: &Path,
    stamp: i64,
    records: &[T],
) -> CrawlResult<PathBuf> {
    if records.is_empty() {
        return Err(CrawlError::Persistence("refusing to persist an empty dataset".into()));
    }
    validate_output_dir(dir)?;

    let json = serde_json::to_string_pretty(records)
        .map_err(|e| CrawlError::Persistence(format!("JSON serialization failed: {e}")))?;

    tokio::fs::create_dir_all(dir).await?;

    let path = dir.join(format!("{stamp}.json"));
    let mut file = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(CrawlError::Persistence(format!(
                "artifact {} already exists",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(json.as_bytes()).await?;
    file.flush().await?;
    drop(file);
    set_artifact_permissions(&path).await?;

    log::info!(
        target: "channelscout::persist",
        "Saved {} records to {}",
        records.len(),
        path.display()
    );
    Ok(path)
}

pub(crate) fn validate_output_dir(dir: &Path) -> CrawlResult<()> {
    if dir.as_os_str().is_empty() {
        return Err(CrawlError::Persistence("output directory is empty".into()));
    }
    if dir.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(CrawlError::Persistence(format!(
            "output directory must not contain '..': {}",
            dir.display()
        )));
    }
    Ok(())
}

#[cfg(unix)]
async fn set_artifact_permissions(path: &Path) -> CrawlResult<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(ARTIFACT_MODE)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn set_artifact_permissions(_path: &Path) -> CrawlResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dir_validation() {
        assert!(validate_output_dir(Path::new("")).is_err());
        assert!(validate_output_dir(Path::new("/tmp/../etc")).is_err());
        assert!(validate_output_dir(Path::new("/tmp/cache")).is_ok());
    }

    #[tokio::test]
    async fn test_same_second_artifact_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_artifact(dir.path(), 1_700_000_000, &["first"]).await.unwrap();

        let second = write_artifact(dir.path(), 1_700_000_000, &["second"]).await;

        assert!(matches!(second, Err(CrawlError::Persistence(_))));
        let kept: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(first).unwrap()).unwrap();
        assert_eq!(kept, vec!["first"]);
    }
}
