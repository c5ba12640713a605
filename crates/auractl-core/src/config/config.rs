//! Configuration management for auractl
//!
//! Handles configuration loading from the config file, environment variables,
//! and command-line arguments. The file is TOML; every field has a default so
//! a missing or empty file yields a usable configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::{ConfigError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.neo4j.io/v1";
pub const DEFAULT_AUTH_URL: &str = "https://api.neo4j.io/oauth/token";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 20;
pub const DEFAULT_POLL_MAX_RETRIES: u32 = 60;

/// Name of the config file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Keys accepted by [`Config::get_key`] and [`Config::set_key`]
pub const VALID_KEYS: &[&str] = &[
    "auth-url",
    "base-url",
    "default-tenant",
    "output",
    "poll-interval",
    "poll-max-retries",
];

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Management API root, e.g. `https://api.neo4j.io/v1`
    pub base_url: String,
    /// OAuth2 token endpoint for the client-credentials grant
    pub auth_url: String,
    /// Tenant used by commands when `--tenant-id` is omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_tenant: Option<String>,
    /// How responses are rendered
    pub output: OutputMode,
    /// Budget for `--await` polling
    pub polling: PollingConfig,
}

/// Poll interval and retry budget used when waiting on a resource
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct PollingConfig {
    /// Seconds to sleep between status fetches
    pub interval: u64,
    /// Number of pending observations before giving up
    pub max_retries: u32,
}

/// Supported output modes
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Default,
    Json,
    Table,
}

/// Values layered on top of the config file, from the environment or flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub auth_url: Option<String>,
    pub output: Option<OutputMode>,
    pub poll_interval: Option<u64>,
    pub poll_max_retries: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            default_tenant: None,
            output: OutputMode::Default,
            polling: PollingConfig::default(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL_SECS,
            max_retries: DEFAULT_POLL_MAX_RETRIES,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Default => write!(f, "default"),
            OutputMode::Json => write!(f, "json"),
            OutputMode::Table => write!(f, "table"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(OutputMode::Default),
            "json" => Ok(OutputMode::Json),
            "table" => Ok(OutputMode::Table),
            other => Err(ConfigError::InvalidValue {
                key: "output".to_string(),
                message: format!("'{}' is not one of default, json, table", other),
            }),
        }
    }
}

impl ConfigOverrides {
    pub const BASE_URL_ENV: &'static str = "AURA_BASE_URL";
    pub const AUTH_URL_ENV: &'static str = "AURA_AUTH_URL";
    pub const OUTPUT_ENV: &'static str = "AURA_OUTPUT";

    /// Read overrides from `AURA_BASE_URL`, `AURA_AUTH_URL` and `AURA_OUTPUT`.
    /// Empty variables are treated as unset.
    pub fn from_env() -> Result<Self> {
        let output = env_value(Self::OUTPUT_ENV)
            .map(|v| v.parse::<OutputMode>())
            .transpose()?;

        Ok(Self {
            base_url: env_value(Self::BASE_URL_ENV),
            auth_url: env_value(Self::AUTH_URL_ENV),
            output,
            poll_interval: None,
            poll_max_retries: None,
        })
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    #[must_use]
    pub fn merge(self, other: ConfigOverrides) -> Self {
        Self {
            base_url: other.base_url.or(self.base_url),
            auth_url: other.auth_url.or(self.auth_url),
            output: other.output.or(self.output),
            poll_interval: other.poll_interval.or(self.poll_interval),
            poll_max_retries: other.poll_max_retries.or(self.poll_max_retries),
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from `<dir>/config.toml`
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_path(&dir.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file is not an error and yields the defaults.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            debug!("No config file at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        // Expand environment variables in the config content
        let expanded_content = Self::expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `<dir>/config.toml`
    pub fn save_to_dir(&self, dir: &Path) -> Result<()> {
        self.save_to_path(&dir.join(CONFIG_FILE_NAME))
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        // Create parent directories if they don't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        let save_err = |e: std::io::Error| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        };
        fs::write(config_path, content).map_err(save_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(config_path, fs::Permissions::from_mode(0o600))
                .map_err(save_err)?;
        }

        Ok(())
    }

    /// Get the platform config directory
    ///
    /// On Linux: ~/.config/auractl
    /// On macOS: ~/Library/Application Support/io.neo4j.auractl
    /// On Windows: %APPDATA%\neo4j\auractl\config
    pub fn config_dir() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("io", "neo4j", "auractl").ok_or(ConfigError::ConfigDirError)?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Apply overrides and re-validate the result
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(base_url) = &overrides.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(auth_url) = &overrides.auth_url {
            self.auth_url = auth_url.clone();
        }
        if let Some(output) = overrides.output {
            self.output = output;
        }
        if let Some(interval) = overrides.poll_interval {
            self.polling.interval = interval;
        }
        if let Some(max_retries) = overrides.poll_max_retries {
            self.polling.max_retries = max_retries;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check URLs parse as http(s) and the retry budget is usable
    pub fn validate(&self) -> Result<()> {
        validate_url("base-url", &self.base_url)?;
        validate_url("auth-url", &self.auth_url)?;
        if self.polling.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll-max-retries".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Read a single key as shown by `config get`
    pub fn get_key(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "auth-url" => Some(self.auth_url.clone()),
            "base-url" => Some(self.base_url.clone()),
            "default-tenant" => self.default_tenant.clone(),
            "output" => Some(self.output.to_string()),
            "poll-interval" => Some(self.polling.interval.to_string()),
            "poll-max-retries" => Some(self.polling.max_retries.to_string()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a single key as done by `config set`.
    ///
    /// An empty value clears `default-tenant`.
    /// The configuration is left untouched when the new value is invalid.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        match key {
            "auth-url" => updated.auth_url = value.to_string(),
            "base-url" => updated.base_url = value.to_string(),
            "default-tenant" => {
                updated.default_tenant = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            "output" => updated.output = value.parse()?,
            "poll-interval" => updated.polling.interval = parse_number(key, value)?,
            "poll-max-retries" => updated.polling.max_retries = parse_number(key, value)?,
            _ => return Err(unknown_key(key)),
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports ${VAR} and ${VAR:-default} syntax. Unset variables without a
    /// default are left as-is.
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

fn validate_url(key: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{}' is not a valid URL: {}", value, e),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{}' must use http or https", value),
        });
    }
    Ok(())
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{}' is not a non-negative integer", value),
    })
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::UnknownKey {
        key: key.to_string(),
        valid: VALID_KEYS.join(", "),
    }
}
