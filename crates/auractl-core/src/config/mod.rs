//! Configuration for auractl
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Settings are read once per process from `config.toml`, layered with
//! environment variables and command-line flags, and then passed by reference
//! to every component. Nothing mutates them after startup.
//!
//! # Features
//!
//! - Platform-specific config directory with an explicit override
//! - Environment variable expansion in the config file
//! - `AURA_BASE_URL` / `AURA_AUTH_URL` / `AURA_OUTPUT` overrides
//! - Key-level get/set for the `config` command

pub mod config;
pub mod error;

// Re-export main types for convenience
pub use config::{Config, ConfigOverrides, OutputMode, PollingConfig, VALID_KEYS};
pub use error::{ConfigError, Result};
