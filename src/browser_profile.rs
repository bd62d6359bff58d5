//! Per-session Chrome profiles
//!
//! Each browser session runs in its own directory under the profiles
//! directory of the cache dir. [`BrowserProfile`] removes it when dropped and
//! [`sweep_stale_profiles`] clears the ones a crashed run left behind.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::utils::PROFILE_DIR_PREFIX;

/// Profile directory owned by one browser session
#[derive(Debug)]
pub struct BrowserProfile {
    path: PathBuf,
    remove_on_drop: bool,
}

impl BrowserProfile {
    /// Create a fresh, uniquely named profile under `parent`
    ///
    /// # Example
    /// ```
    /// # fn main() -> anyhow::Result<()> {
    /// use kodegen_tools_channelscout::browser_profile::BrowserProfile;
    ///
    /// let parent = std::env::temp_dir().join("channelscout-doc-profiles");
    /// let profile = BrowserProfile::create(&parent)?;
    /// assert!(profile.path().starts_with(&parent));
    /// # Ok(())
    /// # }
    /// ```
    pub fn create(parent: &Path) -> Result<Self> {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        let path = parent.join(format!("{PROFILE_DIR_PREFIX}_{}", Uuid::new_v4().simple()));
        std::fs::create_dir(&path)
            .with_context(|| format!("Failed to create profile {}", path.display()))?;

        debug!("Created browser profile {}", path.display());
        Ok(Self {
            path,
            remove_on_drop: true,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hand removal over to the caller
    #[must_use]
    pub fn release(mut self) -> PathBuf {
        self.remove_on_drop = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for BrowserProfile {
    fn drop(&mut self) {
        if !self.remove_on_drop {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed browser profile {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove profile {}: {e}", self.path.display()),
        }
    }
}

/// PID recorded in a profile's `SingletonLock` (`<host>-<pid>` symlink)
fn lock_owner(profile: &Path) -> Option<i32> {
    let target = std::fs::read_link(profile.join("SingletonLock")).ok()?;
    target.to_str()?.rsplit('-').next()?.parse().ok()
}

#[cfg(unix)]
fn process_alive(pid: i32) -> bool {
    // signal 0 checks existence only; EPERM still means it exists
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn process_alive(_pid: i32) -> bool {
    false
}

/// Whether a running browser still holds `profile`
#[must_use]
pub fn profile_in_use(profile: &Path) -> bool {
    lock_owner(profile).is_some_and(process_alive)
}

/// Remove profiles under `parent` that no live browser holds
///
/// Run once at startup, before any session of this run exists.
pub fn sweep_stale_profiles(parent: &Path) -> Result<usize> {
    let entries = match std::fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to list {}", parent.display()));
        }
    };

    let mut removed = 0;
    for path in entries.flatten().map(|entry| entry.path()) {
        let ours = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(PROFILE_DIR_PREFIX));
        if !ours || !path.is_dir() || profile_in_use(&path) {
            continue;
        }
        match std::fs::remove_dir_all(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not remove stale profile {}: {e}", path.display()),
        }
    }

    if removed > 0 {
        info!("Removed {removed} stale browser profiles from {}", parent.display());
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let profile = BrowserProfile::create(parent.path()).unwrap();
        let path = profile.path().to_path_buf();
        assert!(path.is_dir());
        drop(profile);
        assert!(!path.exists());
    }

    #[test]
    fn test_release_keeps_directory() {
        let parent = tempfile::tempdir().unwrap();
        let path = BrowserProfile::create(parent.path()).unwrap().release();
        assert!(path.is_dir());
    }

    #[test]
    fn test_sweep_only_touches_our_profiles() {
        let parent = tempfile::tempdir().unwrap();
        let orphan = BrowserProfile::create(parent.path()).unwrap().release();
        let unrelated = parent.path().join("someone_else");
        std::fs::create_dir(&unrelated).unwrap();

        assert_eq!(sweep_stale_profiles(parent.path()).unwrap(), 1);
        assert!(!orphan.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn test_sweep_of_missing_parent_is_a_no_op() {
        let parent = tempfile::tempdir().unwrap();
        assert_eq!(sweep_stale_profiles(&parent.path().join("absent")).unwrap(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_live_lock_is_kept() {
        let parent = tempfile::tempdir().unwrap();
        let held = BrowserProfile::create(parent.path()).unwrap().release();
        let owner = format!("somehost-{}", std::process::id());
        std::os::unix::fs::symlink(owner, held.join("SingletonLock")).unwrap();

        assert!(profile_in_use(&held));
        assert_eq!(sweep_stale_profiles(parent.path()).unwrap(), 0);
        assert!(held.exists());
    }
}
