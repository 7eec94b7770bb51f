//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.trackboard.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".trackboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote tracker settings.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Report defaults and limits.
    #[serde(default)]
    pub report: ReportConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4567
}

/// Remote tracker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Scheme and host of the tracker API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.pivotaltracker.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Report defaults and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Look-back window when `days_ago` is missing or not positive.
    #[serde(default = "default_days_ago")]
    pub default_days_ago: i64,

    /// Maximum icebox stories per status report.
    #[serde(default = "default_icebox_limit")]
    pub icebox_limit: usize,

    /// Backlog iterations fetched per project.
    #[serde(default = "default_backlog_iterations")]
    pub backlog_iterations: u32,

    /// Backlog iterations skipped before the fetched ones.
    #[serde(default = "default_backlog_skip")]
    pub backlog_skip: u32,

    /// Finished iterations counted as "recently completed".
    #[serde(default = "default_done_iterations")]
    pub done_iterations: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_days_ago: default_days_ago(),
            icebox_limit: default_icebox_limit(),
            backlog_iterations: default_backlog_iterations(),
            backlog_skip: default_backlog_skip(),
            done_iterations: default_done_iterations(),
        }
    }
}

fn default_days_ago() -> i64 {
    7
}

fn default_icebox_limit() -> usize {
    20
}

fn default_backlog_iterations() -> u32 {
    3
}

fn default_backlog_skip() -> u32 {
    1
}

fn default_done_iterations() -> u32 {
    1
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref bind) = args.bind {
            self.server.bind = bind.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ref url) = args.tracker_url {
            self.tracker.base_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.tracker.timeout_seconds = timeout;
        }
    }

    /// Address string for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
