//! Output formatting for tithe-sync.
//!
//! Formatters for pending actions and queue status.

mod json;
mod pretty;

use crate::cli::args::OutputFormat;
use crate::error::TitheError;
use crate::features::sync::{BackgroundState, PendingAction, QueueStats};

pub use json::*;
pub use pretty::*;

/// Format pending actions based on output format.
///
/// # Errors
///
/// Returns `TitheError::Parse` if JSON serialization fails.
pub fn format_actions(
    actions: &[PendingAction],
    format: OutputFormat,
) -> Result<String, TitheError> {
    match format {
        OutputFormat::Pretty => Ok(format_actions_pretty(actions)),
        OutputFormat::Json => format_actions_json(actions),
    }
}

/// Format a freshly queued action based on output format.
///
/// # Errors
///
/// Returns `TitheError::Parse` if JSON serialization fails.
pub fn format_queued(action: &PendingAction, format: OutputFormat) -> Result<String, TitheError> {
    match format {
        OutputFormat::Pretty => Ok(format_queued_pretty(action)),
        OutputFormat::Json => to_json(action),
    }
}

/// Format queue statistics based on output format.
///
/// `background` is `None` when background sync is disabled.
///
/// # Errors
///
/// Returns `TitheError::Parse` if JSON serialization fails.
pub fn format_stats(
    stats: &QueueStats,
    background: Option<BackgroundState>,
    format: OutputFormat,
) -> Result<String, TitheError> {
    match format {
        OutputFormat::Pretty => Ok(format_stats_pretty(stats, background)),
        OutputFormat::Json => format_stats_json(stats, background),
    }
}
