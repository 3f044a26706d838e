//! Command implementations for tithe-sync.

mod flush;
mod queue;

pub use flush::flush;
pub use queue::queue;

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::args::OutputFormat;
use crate::config::{Config, Paths};
use crate::error::TitheError;
use crate::features::sync::{ActionQueue, MarkerFileSync, SyncCoordinator};
use crate::output::{format_actions, format_actions_pretty, format_stats, to_json};

/// Everything a command needs, opened once per invocation.
pub struct AppContext {
    pub paths: Paths,
    pub config: Config,
    pub coordinator: SyncCoordinator,
    /// Present when background sync is enabled
    pub markers: Option<MarkerFileSync>,
}

impl AppContext {
    /// Resolve paths, load config and open the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory, config or database cannot be
    /// prepared.
    pub fn open(home: Option<PathBuf>) -> Result<Self, TitheError> {
        let paths = Paths::resolve(home)?;
        paths.ensure_dirs()?;
        let config = Config::load_from_path(&paths.config_file)?;

        let queue = ActionQueue::open_at(&paths.database)?;
        let mut coordinator = SyncCoordinator::new(queue);
        let markers = config
            .sync
            .background_sync
            .then(|| MarkerFileSync::new(&paths.sync_requests));
        if let Some(markers) = &markers {
            coordinator =
                coordinator.with_background_sync(Arc::new(markers.clone()), &config.sync.tag);
        }

        tracing::debug!(root = %paths.root.display(), "opened tithe-sync context");
        Ok(Self {
            paths,
            config,
            coordinator,
            markers,
        })
    }
}

/// List pending actions.
///
/// # Errors
///
/// Returns an error if the queue cannot be read.
pub async fn pending(
    coordinator: &SyncCoordinator,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<String, TitheError> {
    let actions = match limit {
        Some(limit) => coordinator.get_pending_actions_limited(limit).await?,
        None => coordinator.get_pending_actions().await?,
    };
    format_actions(&actions, format)
}

/// Show a single pending action.
///
/// # Errors
///
/// Returns `NotFound` if no action with `id` is pending.
pub async fn show(
    coordinator: &SyncCoordinator,
    id: i64,
    format: OutputFormat,
) -> Result<String, TitheError> {
    let action = coordinator
        .get_action(id)
        .await?
        .ok_or_else(|| TitheError::NotFound(format!("no pending action with ID {id}")))?;

    match format {
        OutputFormat::Json => to_json(&action),
        OutputFormat::Pretty => Ok(format_actions_pretty(std::slice::from_ref(&action))),
    }
}

/// Show queue status.
///
/// # Errors
///
/// Returns an error if the queue or the registration marker cannot be read.
pub async fn status(
    coordinator: &SyncCoordinator,
    markers: Option<&MarkerFileSync>,
    format: OutputFormat,
) -> Result<String, TitheError> {
    let stats = coordinator.stats().await?;
    let background = markers
        .map(|m| m.state(coordinator.sync_tag()))
        .transpose()?;
    format_stats(&stats, background, format)
}

/// Remove one pending action.
///
/// # Errors
///
/// Returns an error if the queue cannot be written.
pub async fn remove(
    coordinator: &SyncCoordinator,
    id: i64,
    format: OutputFormat,
) -> Result<String, TitheError> {
    let was_pending = coordinator.get_action(id).await?.is_some();
    coordinator.remove_action(id).await?;

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "id": id,
            "removed": was_pending,
        })),
        OutputFormat::Pretty if was_pending => Ok(format!("Removed action {id}")),
        OutputFormat::Pretty => Ok(format!("Action {id} was not pending")),
    }
}

/// Remove every pending action.
///
/// # Errors
///
/// Returns `Config` without `--force`, or an error if the queue cannot be
/// written.
pub async fn clear(
    coordinator: &SyncCoordinator,
    force: bool,
    format: OutputFormat,
) -> Result<String, TitheError> {
    if !force {
        return Err(TitheError::Config(
            "Use --force to clear all pending actions".to_string(),
        ));
    }

    let cleared = coordinator.stats().await?.pending;
    coordinator.clear_pending_actions().await?;

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({ "cleared": cleared })),
        OutputFormat::Pretty => Ok(format!("Cleared {cleared} pending actions")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sync::{Action, DeleteMemberPayload};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_context_opens_under_home() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = AppContext::open(Some(temp_dir.path().to_path_buf())).unwrap();

        assert!(ctx.paths.database.exists());
        assert!(ctx.markers.is_some());
        assert_eq!(ctx.coordinator.sync_tag(), ctx.config.sync.tag);
    }

    #[tokio::test]
    async fn test_context_without_background_sync() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.yaml"),
            "sync:\n  background_sync: false\n",
        )
        .unwrap();

        let ctx = AppContext::open(Some(temp_dir.path().to_path_buf())).unwrap();
        ctx.coordinator
            .queue_action(Action::DeleteMember(DeleteMemberPayload { member_id: 1 }))
            .await
            .unwrap();

        assert!(ctx.markers.is_none());
        let listing = std::fs::read_dir(&ctx.paths.sync_requests).unwrap().count();
        assert_eq!(listing, 0);
    }

    #[tokio::test]
    async fn test_clear_requires_force() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = AppContext::open(Some(temp_dir.path().to_path_buf())).unwrap();

        let err = clear(&ctx.coordinator, false, OutputFormat::Pretty)
            .await
            .unwrap_err();
        assert!(matches!(err, TitheError::Config(_)));
    }

    #[tokio::test]
    async fn test_show_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = AppContext::open(Some(temp_dir.path().to_path_buf())).unwrap();
        let stored = ctx
            .coordinator
            .queue_action(Action::DeleteMember(DeleteMemberPayload { member_id: 4 }))
            .await
            .unwrap();
        let id = stored.id.unwrap();

        let shown = show(&ctx.coordinator, id, OutputFormat::Json).await.unwrap();
        assert!(shown.contains("DELETE_MEMBER"));

        let first = remove(&ctx.coordinator, id, OutputFormat::Pretty).await.unwrap();
        assert_eq!(first, format!("Removed action {id}"));
        let second = remove(&ctx.coordinator, id, OutputFormat::Pretty).await.unwrap();
        assert_eq!(second, format!("Action {id} was not pending"));

        let err = show(&ctx.coordinator, id, OutputFormat::Pretty).await.unwrap_err();
        assert!(matches!(err, TitheError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_status_reports_registration() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = AppContext::open(Some(temp_dir.path().to_path_buf())).unwrap();
        ctx.coordinator
            .queue_action(Action::DeleteMember(DeleteMemberPayload { member_id: 1 }))
            .await
            .unwrap();

        let output = status(&ctx.coordinator, ctx.markers.as_ref(), OutputFormat::Json)
            .await
            .unwrap();
        assert!(output.contains("\"pending\": 1"));
        assert!(output.contains("\"backgroundSyncRegistered\": true"));
    }
}
