//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::amazon::Marketplace;
use crate::browser::SpeedMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Amazon marketplace
    #[serde(default)]
    pub marketplace: Marketplace,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Ingest backend base URL
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token for the ingest backend
    #[serde(default)]
    pub token: Option<String>,

    /// Star ratings to collect; empty means all five
    #[serde(default)]
    pub stars: Vec<u8>,

    /// Pages to walk per star rating
    #[serde(default = "default_pages_per_star")]
    pub pages_per_star: u32,

    /// Collection pacing
    #[serde(default)]
    pub speed: SpeedMode,

    /// Collect only reviews with media attachments
    #[serde(default)]
    pub media_only: bool,

    /// Keep partial results when a run is stopped mid-way
    #[serde(default)]
    pub keep_partial: bool,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Filter: verified purchases only
    #[serde(default)]
    pub verified_only: bool,

    /// Filter: minimum helpful votes
    #[serde(default)]
    pub min_votes: Option<u32>,

    /// Filter: keywords that must appear in the review text
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Filter: keywords that must NOT appear in the review text
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
}

fn default_pages_per_star() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marketplace: Marketplace::Us,
            proxy: None,
            endpoint: None,
            token: None,
            stars: Vec::new(),
            pages_per_star: default_pages_per_star(),
            speed: SpeedMode::Stable,
            media_only: false,
            keep_partial: false,
            format: OutputFormat::Table,
            verified_only: false,
            min_votes: None,
            keywords: Vec::new(),
            exclude_keywords: Vec::new(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("amz-reviews").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(marketplace) = std::env::var("AMZ_MARKETPLACE") {
            if let Ok(m) = marketplace.parse() {
                self.marketplace = m;
            }
        }

        if let Ok(proxy) = std::env::var("AMZ_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(endpoint) = std::env::var("AMZ_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }

        if let Ok(token) = std::env::var("AMZ_TOKEN") {
            self.token = Some(token);
        }

        self
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
