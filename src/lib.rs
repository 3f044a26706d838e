//! tithe-sync - offline action queue for the tithe and member dashboard
//!
//! Member and tithe mutations are buffered in a durable `SQLite` queue while
//! the backend is unreachable and replayed in order later. The
//! [`SyncCoordinator`] is the entry point; it is built once and passed by
//! reference to whatever needs queue access.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod output;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::TitheError;
pub use features::sync::{Action, ActionQueue, ActionType, PendingAction, SyncCoordinator};
