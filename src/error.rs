//! Error types for tithe-sync.

use thiserror::Error;

/// Errors produced by the offline queue, the coordinator and the CLI.
#[derive(Debug, Error)]
pub enum TitheError {
    /// The persistent store is unreachable, a migration failed, a write
    /// aborted, or a stored row could not be decoded.
    #[error("storage error: {0}")]
    Storage(String),

    /// The platform cannot accept a background sync registration.
    ///
    /// The coordinator logs and swallows this; it only reaches callers that
    /// talk to a [`BackgroundSync`](crate::features::sync::BackgroundSync)
    /// implementation directly.
    #[error("background sync unavailable: {0}")]
    BackgroundSyncUnavailable(String),

    /// An action was malformed: unknown type, bad payload, or an id that
    /// was already assigned.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// Requested item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration could not be read, parsed or written.
    #[error("config error: {0}")]
    Config(String),

    /// A flush consumer failed to apply an action.
    #[error("apply failed: {0}")]
    Apply(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}
