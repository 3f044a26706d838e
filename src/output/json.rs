//! JSON output formatting for tithe-sync.

use serde::Serialize;
use serde_json::json;

use crate::error::TitheError;
use crate::features::sync::{BackgroundState, PendingAction, QueueStats};

/// Format pending actions as JSON.
///
/// # Errors
///
/// Returns `TitheError::Parse` if JSON serialization fails.
pub fn format_actions_json(actions: &[PendingAction]) -> Result<String, TitheError> {
    let output = json!({
        "count": actions.len(),
        "items": actions
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format queue statistics as JSON.
///
/// The background fields are `null` when background sync is disabled.
///
/// # Errors
///
/// Returns `TitheError::Parse` if JSON serialization fails.
pub fn format_stats_json(
    stats: &QueueStats,
    background: Option<BackgroundState>,
) -> Result<String, TitheError> {
    let output = json!({
        "pending": stats.pending,
        "oldestTimestamp": stats.oldest_timestamp,
        "newestTimestamp": stats.newest_timestamp,
        "lastAssignedId": stats.last_assigned_id,
        "backgroundSyncRegistered": background.map(|b| b.registered),
        "backgroundSyncRequestedAt": background
            .and_then(|b| b.requested_at)
            .map(|t| t.to_rfc3339()),
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Generic JSON formatter for any serializable type.
///
/// # Errors
///
/// Returns `TitheError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, TitheError> {
    Ok(serde_json::to_string_pretty(value)?)
}
