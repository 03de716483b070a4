//! TOML configuration for `scx`.
//!
//! Every section except `[db]` is optional; omitted fields take the
//! defaults below. [`load_config`] parses and validates in one step.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub translations: TranslationsConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// `K` for vector search.
    #[serde(default = "default_n_results")]
    pub n_results: usize,
    /// Minimum similarity for a verse to enter the grounding document.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Minimum best similarity for a query to count as grounded.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,
    #[serde(default = "default_expand_top_n")]
    pub expand_top_n: usize,
    #[serde(default = "default_context_window")]
    pub context_window: u32,
    /// Cap on the source list returned alongside the grounding text.
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            n_results: default_n_results(),
            similarity_threshold: default_similarity_threshold(),
            relevance_threshold: default_relevance_threshold(),
            expand_top_n: default_expand_top_n(),
            context_window: default_context_window(),
            max_sources: default_max_sources(),
        }
    }
}

fn default_n_results() -> usize {
    8
}
fn default_similarity_threshold() -> f64 {
    0.3
}
fn default_relevance_threshold() -> f64 {
    0.25
}
fn default_expand_top_n() -> usize {
    2
}
fn default_context_window() -> u32 {
    2
}
fn default_max_sources() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Translations stored in the index.
#[derive(Debug, Deserialize, Clone)]
pub struct TranslationsConfig {
    #[serde(default = "default_primary_translation")]
    pub primary: String,
    #[serde(default = "default_secondary_translation")]
    pub secondary: String,
}

impl Default for TranslationsConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_translation(),
            secondary: default_secondary_translation(),
        }
    }
}

fn default_primary_translation() -> String {
    "KJV".to_string()
}
fn default_secondary_translation() -> String {
    "개역한글".to_string()
}

/// Display-only translation fetched per request.
#[derive(Debug, Deserialize, Clone)]
pub struct OverlayConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_overlay_translation")]
    pub translation: String,
    /// Stored translation whose verses the overlay is shown over.
    #[serde(default = "default_primary_translation")]
    pub replaces: String,
    #[serde(default = "default_overlay_url")]
    pub url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Bound on each passage fetch.
    #[serde(default = "default_overlay_timeout_secs")]
    pub timeout_secs: u64,
    /// Bound on all fetches of one request together.
    #[serde(default = "default_overlay_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            translation: default_overlay_translation(),
            replaces: default_primary_translation(),
            url: default_overlay_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_overlay_timeout_secs(),
            request_timeout_secs: default_overlay_request_timeout_secs(),
        }
    }
}

fn default_overlay_translation() -> String {
    "ESV".to_string()
}
fn default_overlay_url() -> String {
    "https://api.esv.org/v3/passage/text/".to_string()
}
fn default_api_key_env() -> String {
    "ESV_API_KEY".to_string()
}
fn default_overlay_timeout_secs() -> u64 {
    10
}
fn default_overlay_request_timeout_secs() -> u64 {
    20
}

impl OverlayConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate retrieval
    let r = &config.retrieval;
    if r.n_results < 1 {
        anyhow::bail!("retrieval.n_results must be >= 1");
    }
    if r.max_sources < 1 {
        anyhow::bail!("retrieval.max_sources must be >= 1");
    }
    if !(0.0..=1.0).contains(&r.similarity_threshold) {
        anyhow::bail!("retrieval.similarity_threshold must be in [0.0, 1.0]");
    }
    if !(0.0..=1.0).contains(&r.relevance_threshold) {
        anyhow::bail!("retrieval.relevance_threshold must be in [0.0, 1.0]");
    }

    // Validate embedding
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "local" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }

    // Validate overlay
    match config.overlay.provider.as_str() {
        "disabled" | "esv" => {}
        other => anyhow::bail!(
            "Unknown overlay provider: '{}'. Must be disabled or esv.",
            other
        ),
    }
    if !(1..=10).contains(&config.overlay.timeout_secs) {
        anyhow::bail!("overlay.timeout_secs must be between 1 and 10");
    }
    if config.overlay.request_timeout_secs < config.overlay.timeout_secs {
        anyhow::bail!("overlay.request_timeout_secs must be >= overlay.timeout_secs");
    }

    Ok(config)
}
