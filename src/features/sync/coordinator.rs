//! Sync coordinator.
//!
//! The entry point the rest of the application uses to buffer mutations.
//! It stamps actions, appends them to the [`ActionQueue`] and, when a
//! [`BackgroundSync`] is configured, requests a deferred flush.
//!
//! The coordinator owns the single database connection for its lifetime.
//! Every storage call runs on the blocking thread pool and is awaited, so
//! calls made in sequence from one task are applied in that order.

use std::sync::{Arc, Mutex};

use super::action::{Action, PendingAction};
use super::background::{BackgroundSync, DEFAULT_SYNC_TAG};
use super::queue::{ActionQueue, QueueStats};
use crate::error::TitheError;

/// Facade over the durable queue and the optional background trigger.
pub struct SyncCoordinator {
    queue: Arc<Mutex<ActionQueue>>,
    background: Option<Arc<dyn BackgroundSync>>,
    tag: String,
}

impl SyncCoordinator {
    /// Wrap a queue with no background sync.
    #[must_use]
    pub fn new(queue: ActionQueue) -> Self {
        Self {
            queue: Arc::new(Mutex::new(queue)),
            background: None,
            tag: DEFAULT_SYNC_TAG.to_string(),
        }
    }

    /// Request `tag` from `background` after every queued action.
    #[must_use]
    pub fn with_background_sync(
        mut self,
        background: Arc<dyn BackgroundSync>,
        tag: impl Into<String>,
    ) -> Self {
        self.background = Some(background);
        self.tag = tag.into();
        self
    }

    /// Tag used for background sync registrations.
    #[must_use]
    pub fn sync_tag(&self) -> &str {
        &self.tag
    }

    /// Durably record an action for later replay.
    ///
    /// The action is stamped with the current time. Once it is stored a
    /// background sync is requested; a failed request is logged and does
    /// not affect the result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAction` if the action fails validation, or a storage
    /// error if it could not be stored. In either case nothing was recorded.
    pub async fn queue_action(&self, action: Action) -> Result<PendingAction, TitheError> {
        let mut pending = PendingAction::now(action);
        let stored = self
            .with_queue(move |queue| {
                queue.append(&mut pending)?;
                Ok(pending)
            })
            .await?;

        self.request_background_sync().await;
        Ok(stored)
    }

    /// All pending actions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn get_pending_actions(&self) -> Result<Vec<PendingAction>, TitheError> {
        self.with_queue(|queue| queue.list_ordered_by_timestamp())
            .await
    }

    /// The first `limit` pending actions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn get_pending_actions_limited(
        &self,
        limit: usize,
    ) -> Result<Vec<PendingAction>, TitheError> {
        self.with_queue(move |queue| queue.list_ordered_limited(limit))
            .await
    }

    /// One pending action by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn get_action(&self, id: i64) -> Result<Option<PendingAction>, TitheError> {
        self.with_queue(move |queue| queue.get(id)).await
    }

    /// Forget an action, typically after it was applied remotely.
    ///
    /// Removing an id that is not pending succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn remove_action(&self, id: i64) -> Result<(), TitheError> {
        let removed = self.with_queue(move |queue| queue.remove(id)).await?;
        if !removed {
            tracing::debug!(id, "remove_action: action was not pending");
        }
        Ok(())
    }

    /// Drop every pending action.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn clear_pending_actions(&self) -> Result<(), TitheError> {
        let removed = self.with_queue(ActionQueue::clear).await?;
        tracing::info!(removed, "cleared pending actions");
        Ok(())
    }

    /// Queue statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn stats(&self) -> Result<QueueStats, TitheError> {
        self.with_queue(ActionQueue::stats).await
    }

    async fn request_background_sync(&self) {
        let Some(background) = self.background.clone() else {
            return;
        };
        let tag = self.tag.clone();

        let outcome = tokio::task::spawn_blocking(move || background.register(&tag)).await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(tag = %self.tag, error = %e, "background sync registration failed");
            }
            Err(e) => {
                tracing::warn!(tag = %self.tag, error = %e, "background sync registration panicked");
            }
        }
    }

    /// Run `f` against the queue on the blocking pool.
    async fn with_queue<T, F>(&self, f: F) -> Result<T, TitheError>
    where
        F: FnOnce(&ActionQueue) -> Result<T, TitheError> + Send + 'static,
        T: Send + 'static,
    {
        let queue = Arc::clone(&self.queue);
        tokio::task::spawn_blocking(move || {
            let guard = queue
                .lock()
                .map_err(|_| TitheError::Storage("queue connection lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| TitheError::Storage(format!("storage task failed: {e}")))?
    }
}
