//! Command-line interface for tithe-sync.

pub mod args;
pub mod commands;
