//! Offline action queue.
//!
//! Member and tithe mutations made while the backend is unreachable are
//! buffered here and replayed later.
//!
//! - [`ActionQueue`]: durable, ordered storage of [`PendingAction`]s
//! - [`SyncCoordinator`]: stamps and appends actions, requests a background sync
//! - [`BackgroundSync`]: optional platform hook for a deferred flush
//! - [`SyncCoordinator::flush_with`]: ordered apply-then-remove replay

pub mod action;
pub mod background;
pub mod coordinator;
pub mod flush;
pub mod queue;

pub use action::{
    Action, ActionType, AddMemberPayload, DeleteMemberPayload, PendingAction, UpdateMemberPayload,
    UpdateTithePayload,
};
pub use background::{
    validate_tag, BackgroundState, BackgroundSync, MarkerFileSync, DEFAULT_SYNC_TAG,
};
pub use coordinator::SyncCoordinator;
pub use flush::{format_flush_report, FlushFailure, FlushOptions, FlushReport, JsonlOutbox};
pub use queue::{ActionQueue, QueueStats};
