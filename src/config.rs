//! TOML configuration parsing.
//!
//! Every section is optional; a missing key takes the default used by the
//! documentation site itself.
//!
//! ```toml
//! [sources]
//! published_url = "https://hips.example.org/search.json"
//! page_url = "https://hips.example.org/"
//!
//! [search]
//! limit = 10
//! no_results_text = "No results found"
//!
//! [validator]
//! token_env = "VERTESIA_API_KEY"
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub validator: ValidatorConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    /// Published feed, absolute or relative to `page_url`.
    #[serde(default = "default_published_url")]
    pub published_url: String,
    /// Overrides the draft feed URL derived from `page_url`.
    #[serde(default)]
    pub draft_url: Option<String>,
    /// Absolute path retried against the page origin when the primary
    /// draft location fails.
    #[serde(default = "default_draft_fallback_path")]
    pub draft_fallback_path: String,
    /// Location of the page hosting the search box. A `file://` directory
    /// URL serves a built site from disk.
    #[serde(default = "default_page_url")]
    pub page_url: String,
    /// Base for fetching proposal files at a pull request head commit.
    #[serde(default = "default_raw_content_base")]
    pub raw_content_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            published_url: default_published_url(),
            draft_url: None,
            draft_fallback_path: default_draft_fallback_path(),
            page_url: default_page_url(),
            raw_content_base: default_raw_content_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_published_url() -> String {
    "./search.json".to_string()
}
fn default_draft_fallback_path() -> String {
    "/_data/draft_hips.json".to_string()
}
fn default_page_url() -> String {
    "http://127.0.0.1:4000/".to_string()
}
fn default_raw_content_base() -> String {
    "https://raw.githubusercontent.com/hiero-ledger/hiero-improvement-proposals".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_no_results_text")]
    pub no_results_text: String,
    /// Fall back to published-only substring matching when initialization
    /// fails.
    #[serde(default = "default_true")]
    pub fallback_to_basic: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            no_results_text: default_no_results_text(),
            fallback_to_basic: true,
        }
    }
}

fn default_limit() -> usize {
    crate::search::DEFAULT_LIMIT
}
fn default_no_results_text() -> String {
    "No results found".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValidatorConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_interaction")]
    pub interaction: String,
    #[serde(default = "default_hip_spec")]
    pub hip_spec: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            interaction: default_interaction(),
            hip_spec: default_hip_spec(),
            token_env: default_token_env(),
        }
    }
}

fn default_endpoint() -> String {
    "https://studio-server-production.api.vertesia.io/api/v1/execute/".to_string()
}
fn default_interaction() -> String {
    "Evaluate_HIP_Format".to_string()
}
fn default_hip_spec() -> String {
    ".".to_string()
}
fn default_token_env() -> String {
    "VERTESIA_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

impl Config {
    /// Configuration used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.search.limit < 1 {
        anyhow::bail!("search.limit must be >= 1");
    }

    Url::parse(&config.sources.page_url)
        .with_context(|| format!("sources.page_url is not a URL: {}", config.sources.page_url))?;

    if !config.sources.draft_fallback_path.starts_with('/') {
        anyhow::bail!(
            "sources.draft_fallback_path must be absolute, got '{}'",
            config.sources.draft_fallback_path
        );
    }

    Url::parse(&config.validator.endpoint).with_context(|| {
        format!(
            "validator.endpoint is not a URL: {}",
            config.validator.endpoint
        )
    })?;

    if config.validator.token_env.trim().is_empty() {
        anyhow::bail!("validator.token_env must not be empty");
    }

    Ok(())
}
