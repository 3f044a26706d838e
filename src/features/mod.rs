//! Feature implementations for tithe-sync.
//!
//! - Offline action queue and replay

pub mod sync;
