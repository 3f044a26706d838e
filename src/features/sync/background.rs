//! Background sync registration.
//!
//! After an action is queued the coordinator asks a [`BackgroundSync`]
//! implementation to wake something that can flush the queue while the
//! app is not running. Registration is best effort: the queued action is
//! already durable, so failures here are only logged.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::TitheError;

/// Tag used when no other tag is configured.
pub const DEFAULT_SYNC_TAG: &str = "sync-pending-actions";

/// A platform facility that can schedule a deferred flush.
#[cfg_attr(test, mockall::automock)]
pub trait BackgroundSync: Send + Sync {
    /// Request a background flush identified by `tag`.
    ///
    /// Registering the same tag again before it has been handled must be
    /// harmless.
    ///
    /// # Errors
    ///
    /// Returns `BackgroundSyncUnavailable` if the request cannot be made.
    fn register(&self, tag: &str) -> Result<(), TitheError>;
}

/// Outstanding background flush request for a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundState {
    pub registered: bool,
    /// When the request was made, if the marker records it
    pub requested_at: Option<DateTime<Utc>>,
}

/// Registers background syncs as marker files in a directory.
///
/// A scheduler (cron, a systemd timer, a login hook) runs
/// `tithe-sync flush --if-registered`, which only does work while a marker
/// exists and acknowledges it once the queue is drained.
#[derive(Debug, Clone)]
pub struct MarkerFileSync {
    dir: PathBuf,
}

impl MarkerFileSync {
    /// Use `dir` to hold registration markers.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn marker_path(&self, tag: &str) -> Result<PathBuf, TitheError> {
        validate_tag(tag)?;
        Ok(self.dir.join(format!("{tag}.pending")))
    }

    /// Whether a flush has been requested for `tag` and not yet acknowledged.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is invalid.
    pub fn is_registered(&self, tag: &str) -> Result<bool, TitheError> {
        Ok(self.marker_path(tag)?.exists())
    }

    /// When the outstanding request for `tag` was made, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is invalid or the marker cannot be read.
    pub fn registered_at(&self, tag: &str) -> Result<Option<DateTime<Utc>>, TitheError> {
        let path = self.marker_path(tag)?;
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)?;
        Ok(DateTime::parse_from_rfc3339(contents.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)))
    }

    /// Registration flag and request time for `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is invalid or the marker cannot be read.
    pub fn state(&self, tag: &str) -> Result<BackgroundState, TitheError> {
        Ok(BackgroundState {
            registered: self.is_registered(tag)?,
            requested_at: self.registered_at(tag)?,
        })
    }

    /// Mark the request for `tag` as handled. Missing markers are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is invalid or the marker cannot be removed.
    pub fn acknowledge(&self, tag: &str) -> Result<bool, TitheError> {
        let path = self.marker_path(tag)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl BackgroundSync for MarkerFileSync {
    fn register(&self, tag: &str) -> Result<(), TitheError> {
        let unavailable = |e: std::io::Error| {
            TitheError::BackgroundSyncUnavailable(format!(
                "cannot write marker in {}: {e}",
                self.dir.display()
            ))
        };

        let path = self
            .marker_path(tag)
            .map_err(|e| TitheError::BackgroundSyncUnavailable(e.to_string()))?;
        std::fs::create_dir_all(&self.dir).map_err(unavailable)?;
        std::fs::write(&path, Utc::now().to_rfc3339()).map_err(unavailable)?;

        tracing::debug!(tag, path = %path.display(), "registered background sync");
        Ok(())
    }
}

/// Check that `tag` can name a marker file.
///
/// # Errors
///
/// Returns `BackgroundSyncUnavailable` for empty tags, tags starting with a
/// dot, or characters outside `[A-Za-z0-9._-]`.
pub fn validate_tag(tag: &str) -> Result<(), TitheError> {
    let valid = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && !tag.starts_with('.');

    if valid {
        Ok(())
    } else {
        Err(TitheError::BackgroundSyncUnavailable(format!(
            "invalid sync tag: {tag:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_register_creates_marker() {
        let temp_dir = TempDir::new().unwrap();
        let sync = MarkerFileSync::new(temp_dir.path().join("sync-requests"));

        assert!(!sync.is_registered(DEFAULT_SYNC_TAG).unwrap());
        sync.register(DEFAULT_SYNC_TAG).unwrap();

        assert!(sync.is_registered(DEFAULT_SYNC_TAG).unwrap());
        assert!(sync.registered_at(DEFAULT_SYNC_TAG).unwrap().is_some());
    }

    #[test]
    fn test_register_twice_is_harmless() {
        let temp_dir = TempDir::new().unwrap();
        let sync = MarkerFileSync::new(temp_dir.path());

        sync.register("nightly").unwrap();
        sync.register("nightly").unwrap();

        assert!(sync.acknowledge("nightly").unwrap());
        assert!(!sync.is_registered("nightly").unwrap());
    }

    #[test]
    fn test_state_reports_request_time() {
        let temp_dir = TempDir::new().unwrap();
        let sync = MarkerFileSync::new(temp_dir.path());

        let idle = sync.state(DEFAULT_SYNC_TAG).unwrap();
        assert!(!idle.registered);
        assert!(idle.requested_at.is_none());

        let before = Utc::now();
        sync.register(DEFAULT_SYNC_TAG).unwrap();
        let state = sync.state(DEFAULT_SYNC_TAG).unwrap();
        assert!(state.registered);
        assert!(state.requested_at.unwrap() >= before - chrono::Duration::seconds(1));
    }

    #[test]
    fn test_acknowledge_missing_marker() {
        let temp_dir = TempDir::new().unwrap();
        let sync = MarkerFileSync::new(temp_dir.path());

        assert!(!sync.acknowledge(DEFAULT_SYNC_TAG).unwrap());
        assert_eq!(sync.registered_at(DEFAULT_SYNC_TAG).unwrap(), None);
    }

    #[test]
    fn test_invalid_tags_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let sync = MarkerFileSync::new(temp_dir.path());

        for tag in ["", "../escape", ".hidden", "has space"] {
            assert!(matches!(
                sync.register(tag),
                Err(TitheError::BackgroundSyncUnavailable(_))
            ));
        }
    }

    #[test]
    fn test_unwritable_dir_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();

        let sync = MarkerFileSync::new(&blocker);
        assert!(matches!(
            sync.register(DEFAULT_SYNC_TAG),
            Err(TitheError::BackgroundSyncUnavailable(_))
        ));
    }
}
