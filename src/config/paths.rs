//! Path resolution for tithe-sync data files.
//!
//! All data lives under one root, `~/.tithe-sync/` unless overridden:
//! - `config.yaml` - Main configuration file
//! - `queue.db` - SQLite database holding pending actions
//! - `sync-requests/` - Background sync registration markers

use std::path::PathBuf;

use crate::error::TitheError;

/// Paths to tithe-sync configuration and data.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.tithe-sync/`
    pub root: PathBuf,
    /// Config file: `~/.tithe-sync/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.tithe-sync/queue.db`
    pub database: PathBuf,
    /// Marker directory: `~/.tithe-sync/sync-requests/`
    pub sync_requests: PathBuf,
}

impl Paths {
    /// Create paths based on the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, TitheError> {
        let home = std::env::var("HOME")
            .map_err(|_| TitheError::Config("Could not determine home directory".to_string()))?;

        Ok(Self::with_root(PathBuf::from(home).join(".tithe-sync")))
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("queue.db"),
            sync_requests: root.join("sync-requests"),
            root,
        }
    }

    /// Resolve paths from an optional override, falling back to the home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no override is given and the home directory is unknown.
    pub fn resolve(root: Option<PathBuf>) -> Result<Self, TitheError> {
        root.map_or_else(Self::new, |r| Ok(Self::with_root(r)))
    }

    /// Ensure all directories exist, creating them if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), TitheError> {
        for dir in [&self.root, &self.sync_requests] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    TitheError::Config(format!(
                        "Failed to create directory {}: {e}",
                        dir.display()
                    ))
                })?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_with_root() {
        let root = PathBuf::from("/tmp/test-tithe-sync");
        let paths = Paths::with_root(root.clone());

        assert_eq!(paths.root, root);
        assert_eq!(paths.config_file, root.join("config.yaml"));
        assert_eq!(paths.database, root.join("queue.db"));
        assert_eq!(paths.sync_requests, root.join("sync-requests"));
    }

    #[test]
    fn test_resolve_prefers_override() {
        let paths = Paths::resolve(Some(PathBuf::from("/srv/tithe"))).unwrap();
        assert_eq!(paths.database, PathBuf::from("/srv/tithe/queue.db"));
    }

    #[test]
    fn test_ensure_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::with_root(temp_dir.path().join("nested"));

        paths.ensure_dirs().unwrap();

        assert!(paths.root.exists());
        assert!(paths.sync_requests.exists());
    }
}
