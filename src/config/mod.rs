//! Configuration management for tithe-sync.
//!
//! This module handles locating the data root and loading `config.yaml`.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{ColorSetting, Config, GeneralConfig, SyncConfig};
