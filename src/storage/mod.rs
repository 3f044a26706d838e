//! Storage layer for tithe-sync.
//!
//! `SQLite` persistence for the pending action store, with versioned
//! schema migrations applied on open.

mod database;
mod migrations;

pub use database::Database;
