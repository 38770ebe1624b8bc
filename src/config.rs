//! TOML configuration.
//!
//! Every section is optional; a missing section takes its defaults. A
//! minimal file selecting the hosted backends looks like:
//!
//! ```toml
//! [index]
//! path = "./data/positron.sqlite"
//!
//! [embedding]
//! provider = "openai"
//!
//! [generation]
//! provider = "openai"
//! model = "gpt-4o-mini"
//! ```
//!
//! [`load_config`] validates the result. Every validation failure is a
//! [`RagError::Configuration`] and is fatal at startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use positron_core::chunk::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_PASSES, DEFAULT_OVERLAP};
use positron_core::RagError;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "./config/positron.toml";

pub const PROVIDER_OLLAMA: &str = "ollama";
pub const PROVIDER_OPENAI: &str = "openai";

pub const OLLAMA_URL: &str = "http://localhost:11434";
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            collection: default_collection(),
        }
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./data/positron.sqlite")
}
fn default_collection() -> String {
    "documents".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}
fn default_max_passes() -> usize {
    DEFAULT_MAX_PASSES
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_use_context")]
    pub use_context: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            use_context: default_use_context(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_use_context() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            api_key: None,
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl EmbeddingConfig {
    /// Configured model, or the provider's default.
    pub fn model(&self) -> &str {
        match (&self.model, self.provider.as_str()) {
            (Some(model), _) => model,
            (None, PROVIDER_OPENAI) => "text-embedding-3-small",
            (None, _) => "nomic-embed-text",
        }
    }

    /// Configured dimensionality, or the provider default model's.
    pub fn dims(&self) -> usize {
        match (self.dims, self.provider.as_str()) {
            (Some(dims), _) => dims,
            (None, PROVIDER_OPENAI) => 1536,
            (None, _) => 768,
        }
    }

    pub fn base_url(&self) -> &str {
        base_url(&self.url, &self.provider)
    }
}

fn default_provider() -> String {
    PROVIDER_OLLAMA.to_string()
}
fn default_embedding_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            api_key: None,
            timeout_secs: default_generation_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl GenerationConfig {
    pub fn model(&self) -> &str {
        match (&self.model, self.provider.as_str()) {
            (Some(model), _) => model,
            (None, PROVIDER_OPENAI) => "gpt-4o-mini",
            (None, _) => "llama3.2",
        }
    }

    pub fn base_url(&self) -> &str {
        base_url(&self.url, &self.provider)
    }
}

fn default_generation_timeout() -> u64 {
    60
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}

fn base_url<'a>(url: &'a Option<String>, provider: &str) -> &'a str {
    match (url, provider) {
        (Some(url), _) => url.trim_end_matches('/'),
        (None, PROVIDER_OPENAI) => OPENAI_URL,
        (None, _) => OLLAMA_URL,
    }
}

/// `[logging]` section: a default level plus per-module overrides.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn invalid(msg: impl Into<String>) -> anyhow::Error {
    RagError::Configuration(msg.into()).into()
}

/// Read, parse, and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| invalid(format!("failed to parse {}: {}", path.display(), e)))?;

    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        return Err(invalid("chunking.chunk_size must be >= 1"));
    }
    if config.chunking.max_passes == 0 {
        return Err(invalid("chunking.max_passes must be >= 1"));
    }
    if config.retrieval.top_k == 0 {
        return Err(invalid("retrieval.top_k must be >= 1"));
    }
    if config.index.collection.trim().is_empty() {
        return Err(invalid("index.collection must not be empty"));
    }

    for (section, provider) in [
        ("embedding", &config.embedding.provider),
        ("generation", &config.generation.provider),
    ] {
        match provider.as_str() {
            PROVIDER_OLLAMA | PROVIDER_OPENAI => {}
            other => {
                return Err(invalid(format!(
                    "unknown {} provider: '{}'. Must be ollama or openai.",
                    section, other
                )))
            }
        }
    }

    if config.embedding.dims == Some(0) {
        return Err(invalid("embedding.dims must be >= 1"));
    }
    if !(0.0..=2.0).contains(&config.generation.temperature) {
        return Err(invalid("generation.temperature must be in [0.0, 2.0]"));
    }
    crate::logging::check_config(&config.logging).map_err(invalid)?;

    Ok(())
}
