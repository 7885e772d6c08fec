//! Configuration management for tfsclient.
//!
//! This module handles loading configuration from multiple sources:
//! - TOML configuration files following the XDG Base Directory specification
//! - Environment variables
//! - Values set explicitly in code
//!
//! Every value remembers its source through [`ParsedProperty`]. Sources are layered
//! with [`Config::merge`] and finally validated by [`Config::resolve`], which yields
//! the [`ClientSettings`] clients are built from.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tfsclient::Config;
//!
//! // Defaults, then the config file, then the environment
//! let config = Config::default()
//!     .merge(Config::load_from_file().unwrap())
//!     .merge(Config::load_from_env());
//!
//! let settings = config.resolve().unwrap();
//! println!("Batch size: {}", settings.batch_size);
//! ```

use anyhow::Context;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::api::{DEFAULT_COLLECTION, PatCredential};
use crate::error::ConfigError;
use crate::parsed_property::ParsedProperty;

/// API version of the stable endpoints.
pub const DEFAULT_API_VERSION: &str = "6.0";
/// API version of endpoints only served as preview.
pub const DEFAULT_API_VERSION_PREVIEW: &str = "6.0-preview.3";
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_SERVER_URL: &str = "TFSCLIENT_SERVER_URL";
const ENV_PROJECT: &str = "TFSCLIENT_PROJECT";
const ENV_PAT: &str = "TFSCLIENT_PAT";
const ENV_API_VERSION: &str = "TFSCLIENT_API_VERSION";
const ENV_API_VERSION_PREVIEW: &str = "TFSCLIENT_API_VERSION_PREVIEW";
const ENV_BATCH_SIZE: &str = "TFSCLIENT_BATCH_SIZE";
const ENV_MAX_CONCURRENT_BATCHES: &str = "TFSCLIENT_MAX_CONCURRENT_BATCHES";
const ENV_VERIFY_SSL: &str = "TFSCLIENT_VERIFY_SSL";
const ENV_TIMEOUT_SECS: &str = "TFSCLIENT_TIMEOUT_SECS";

/// Stands in for the PAT wherever an original value is recorded.
const REDACTED: &str = "[REDACTED]";

/// Temporary struct for deserializing TOML configuration
#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    pub server_url: Option<String>,
    pub project: Option<String>,
    pub pat: Option<String>,
    pub api_version: Option<String>,
    pub api_version_preview: Option<String>,
    pub batch_size: Option<usize>,
    pub max_concurrent_batches: Option<usize>,
    pub verify_ssl: Option<bool>,
    pub timeout_secs: Option<u64>,
}

/// Client configuration assembled from environment variables, config file, explicit
/// values and defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server URL, e.g. `https://tfs.example.com/tfs`.
    pub server_url: Option<ParsedProperty<String>>,
    /// `Collection/Project` path.
    pub project: Option<ParsedProperty<String>>,
    /// Personal access token.
    pub pat: Option<ParsedProperty<SecretString>>,
    /// API version of the stable endpoints.
    pub api_version: Option<ParsedProperty<String>>,
    /// API version of preview-only endpoints.
    pub api_version_preview: Option<ParsedProperty<String>>,
    /// Ids per batch request when fetching work items.
    pub batch_size: Option<ParsedProperty<usize>>,
    /// Batch requests allowed in flight at once.
    pub max_concurrent_batches: Option<ParsedProperty<usize>>,
    /// Whether TLS certificates are verified.
    pub verify_ssl: Option<ParsedProperty<bool>>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<ParsedProperty<u64>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: None,
            project: Some(ParsedProperty::Default(DEFAULT_COLLECTION.to_string())),
            pat: None,
            api_version: Some(ParsedProperty::Default(DEFAULT_API_VERSION.to_string())),
            api_version_preview: Some(ParsedProperty::Default(
                DEFAULT_API_VERSION_PREVIEW.to_string(),
            )),
            batch_size: Some(ParsedProperty::Default(DEFAULT_BATCH_SIZE)),
            max_concurrent_batches: Some(ParsedProperty::Default(DEFAULT_MAX_CONCURRENT_BATCHES)),
            verify_ssl: Some(ParsedProperty::Default(false)),
            timeout_secs: Some(ParsedProperty::Default(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

impl Config {
    /// An empty configuration: every value unset, so merging it changes nothing.
    pub fn empty() -> Self {
        Self {
            server_url: None,
            project: None,
            pat: None,
            api_version: None,
            api_version_preview: None,
            batch_size: None,
            max_concurrent_batches: None,
            verify_ssl: None,
            timeout_secs: None,
        }
    }

    /// Configuration with the connection values set explicitly.
    pub fn explicit(server_url: &str, project: &str, pat: &str) -> Self {
        Self {
            server_url: Some(ParsedProperty::Explicit(
                server_url.to_string(),
                server_url.to_string(),
            )),
            project: Some(ParsedProperty::Explicit(
                project.to_string(),
                project.to_string(),
            )),
            pat: Some(ParsedProperty::Explicit(
                SecretString::from(pat.to_string()),
                REDACTED.to_string(),
            )),
            ..Self::empty()
        }
    }

    /// Load configuration from the XDG config directory.
    ///
    /// A missing file yields an empty configuration.
    #[must_use = "this returns the loaded configuration which should be used"]
    pub fn load_from_file() -> anyhow::Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::empty());
        }

        Self::load_from_path(&config_path)
            .with_context(|| format!("Failed to load config file: {}", config_path.display()))
    }

    /// Load configuration from a specific TOML file.
    pub fn load_from_path(config_path: &Path) -> Result<Self, ConfigError> {
        let config_content =
            fs::read_to_string(config_path).map_err(|e| ConfigError::FileReadError {
                path: config_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let config_file: ConfigFile =
            toml::from_str(&config_content).map_err(|e| ConfigError::ParseError {
                path: config_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let path = config_path.to_path_buf();
        Ok(Self {
            server_url: config_file
                .server_url
                .map(|v| ParsedProperty::File(v.clone(), path.clone(), v)),
            project: config_file
                .project
                .map(|v| ParsedProperty::File(v.clone(), path.clone(), v)),
            pat: config_file.pat.map(|v| {
                ParsedProperty::File(SecretString::from(v), path.clone(), REDACTED.to_string())
            }),
            api_version: config_file
                .api_version
                .map(|v| ParsedProperty::File(v.clone(), path.clone(), v)),
            api_version_preview: config_file
                .api_version_preview
                .map(|v| ParsedProperty::File(v.clone(), path.clone(), v)),
            batch_size: config_file
                .batch_size
                .map(|v| ParsedProperty::File(v, path.clone(), v.to_string())),
            max_concurrent_batches: config_file
                .max_concurrent_batches
                .map(|v| ParsedProperty::File(v, path.clone(), v.to_string())),
            verify_ssl: config_file
                .verify_ssl
                .map(|v| ParsedProperty::File(v, path.clone(), v.to_string())),
            timeout_secs: config_file
                .timeout_secs
                .map(|v| ParsedProperty::File(v, path.clone(), v.to_string())),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Values that fail to parse are ignored.
    pub fn load_from_env() -> Self {
        Self {
            server_url: std::env::var(ENV_SERVER_URL)
                .ok()
                .map(|v| ParsedProperty::Env(v.clone(), v)),
            project: std::env::var(ENV_PROJECT)
                .ok()
                .map(|v| ParsedProperty::Env(v.clone(), v)),
            pat: std::env::var(ENV_PAT)
                .ok()
                .map(|v| ParsedProperty::Env(SecretString::from(v), REDACTED.to_string())),
            api_version: std::env::var(ENV_API_VERSION)
                .ok()
                .map(|v| ParsedProperty::Env(v.clone(), v)),
            api_version_preview: std::env::var(ENV_API_VERSION_PREVIEW)
                .ok()
                .map(|v| ParsedProperty::Env(v.clone(), v)),
            batch_size: std::env::var(ENV_BATCH_SIZE)
                .ok()
                .and_then(|s| s.parse().ok().map(|v| ParsedProperty::Env(v, s))),
            max_concurrent_batches: std::env::var(ENV_MAX_CONCURRENT_BATCHES)
                .ok()
                .and_then(|s| s.parse().ok().map(|v| ParsedProperty::Env(v, s))),
            verify_ssl: std::env::var(ENV_VERIFY_SSL).ok().and_then(|s| {
                s.parse::<bool>()
                    .ok()
                    .map(|v| ParsedProperty::Env(v, s.clone()))
            }),
            timeout_secs: std::env::var(ENV_TIMEOUT_SECS)
                .ok()
                .and_then(|s| s.parse().ok().map(|v| ParsedProperty::Env(v, s))),
        }
    }

    /// Defaults, overlaid by the config file, overlaid by the environment.
    pub fn load() -> crate::error::Result<Self> {
        Ok(Self::default()
            .merge(Self::load_from_file()?)
            .merge(Self::load_from_env()))
    }

    /// Get the XDG config file path for tfsclient
    fn get_config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    fn config_dir() -> anyhow::Result<PathBuf> {
        // Use XDG_CONFIG_HOME if set, otherwise ~/.config
        let config_dir = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config"),
        };

        Ok(config_dir.join("tfsclient"))
    }

    /// Merge this config with another, preferring values from other when they exist
    pub fn merge(self, other: Self) -> Self {
        Self {
            server_url: other.server_url.or(self.server_url),
            project: other.project.or(self.project),
            pat: other.pat.or(self.pat),
            api_version: other.api_version.or(self.api_version),
            api_version_preview: other.api_version_preview.or(self.api_version_preview),
            batch_size: other.batch_size.or(self.batch_size),
            max_concurrent_batches: other.max_concurrent_batches.or(self.max_concurrent_batches),
            verify_ssl: other.verify_ssl.or(self.verify_ssl),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
        }
    }

    /// Validates the configuration and produces client settings.
    ///
    /// Unset optional values fall back to their defaults.
    pub fn resolve(self) -> Result<ClientSettings, ConfigError> {
        let server_url = self
            .server_url
            .map(ParsedProperty::into_value)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "server_url".to_string(),
                env_var: ENV_SERVER_URL.to_string(),
            })?;

        let pat = self
            .pat
            .map(ParsedProperty::into_value)
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "pat".to_string(),
                env_var: ENV_PAT.to_string(),
            })?;

        let batch_size = self
            .batch_size
            .map_or(DEFAULT_BATCH_SIZE, ParsedProperty::into_value);
        if batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_size".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let max_concurrent_batches = self
            .max_concurrent_batches
            .map_or(DEFAULT_MAX_CONCURRENT_BATCHES, ParsedProperty::into_value);
        if max_concurrent_batches == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrent_batches".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(ClientSettings {
            server_url,
            project: self
                .project
                .map_or_else(|| DEFAULT_COLLECTION.to_string(), ParsedProperty::into_value),
            pat,
            api_version: self
                .api_version
                .map_or_else(|| DEFAULT_API_VERSION.to_string(), ParsedProperty::into_value),
            api_version_preview: self.api_version_preview.map_or_else(
                || DEFAULT_API_VERSION_PREVIEW.to_string(),
                ParsedProperty::into_value,
            ),
            batch_size,
            max_concurrent_batches,
            verify_ssl: self.verify_ssl.is_some_and(|v| *v),
            timeout: Duration::from_secs(
                self.timeout_secs
                    .map_or(DEFAULT_TIMEOUT_SECS, ParsedProperty::into_value),
            ),
        })
    }

    /// Create a sample config file for user reference
    #[must_use = "this operation can fail and the result should be checked"]
    pub fn create_sample_config() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        let config_path = config_dir.join("config.toml");

        // Don't overwrite existing config
        if config_path.exists() {
            return Ok(config_path);
        }

        fs::create_dir_all(&config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let sample_config = r#"# tfsclient Configuration File
# Location: ~/.config/tfsclient/config.toml (or $XDG_CONFIG_HOME/tfsclient/config.toml)

# Server URL (required)
# server_url = "https://tfs.example.com/tfs"

# Collection and project, as "Collection/Project" (optional, defaults to "DefaultCollection")
# project = "DefaultCollection/MyProject"

# Personal Access Token (required, but consider using environment variable TFSCLIENT_PAT instead)
# pat = "your-pat-token"

# REST API versions (optional)
api_version = "6.0"
api_version_preview = "6.0-preview.3"

# Work item ids per batch request (optional, defaults to 50)
batch_size = 50

# Batch requests in flight at once (optional, defaults to 1)
max_concurrent_batches = 1

# Verify TLS certificates (optional, defaults to false)
verify_ssl = false

# Request timeout in seconds (optional, defaults to 30)
timeout_secs = 30
"#;

        fs::write(&config_path, sample_config).with_context(|| {
            format!(
                "Failed to write sample config to: {}",
                config_path.display()
            )
        })?;

        info!(path = %config_path.display(), "sample config created");
        Ok(config_path)
    }
}

/// Validated settings a client is constructed from.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub server_url: String,
    /// `Collection/Project` path.
    pub project: String,
    pub pat: SecretString,
    pub api_version: String,
    pub api_version_preview: String,
    pub batch_size: usize,
    pub max_concurrent_batches: usize,
    pub verify_ssl: bool,
    pub timeout: Duration,
}

impl ClientSettings {
    /// Settings with the given connection values and defaults for the rest.
    pub fn new(server_url: impl Into<String>, project: impl Into<String>, pat: SecretString) -> Self {
        Self {
            server_url: server_url.into(),
            project: project.into(),
            pat,
            api_version: DEFAULT_API_VERSION.to_string(),
            api_version_preview: DEFAULT_API_VERSION_PREVIEW.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent_batches: DEFAULT_MAX_CONCURRENT_BATCHES,
            verify_ssl: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn credential(&self) -> PatCredential {
        PatCredential::new(self.pat.clone())
    }
}
