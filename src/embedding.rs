//! Embedding backends.
//!
//! - **[`OllamaEmbeddings`]**: local Ollama server, `POST /api/embeddings`.
//!   Ollama takes one text per request, so a batch is a sequence of
//!   requests.
//! - **[`OpenAIEmbeddings`]**: hosted OpenAI API, `POST /embeddings` with
//!   the whole batch in one request.
//!
//! Use [`create_provider`] to pick one from configuration:
//!
//! ```rust,no_run
//! # use positron::config::EmbeddingConfig;
//! # use positron::embedding::create_provider;
//! # use positron_core::embedding::EmbeddingProvider;
//! let config = EmbeddingConfig::default(); // provider = "ollama"
//! let provider = create_provider(&config).unwrap();
//! assert_eq!(provider.model_name(), "nomic-embed-text");
//! assert_eq!(provider.dims(), 768);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use positron_core::embedding::EmbeddingProvider;
use positron_core::{RagError, Result};
use serde_json::json;
use tracing::debug;

use crate::config::{EmbeddingConfig, PROVIDER_OLLAMA, PROVIDER_OPENAI};
use crate::http::{self, BackendKind};

/// Build the configured embedding backend.
///
/// # Errors
///
/// [`RagError::Auth`] when the OpenAI backend has no API key, or
/// [`RagError::Configuration`] for an unknown provider.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        PROVIDER_OLLAMA => Ok(Arc::new(OllamaEmbeddings::new(config)?)),
        PROVIDER_OPENAI => Ok(Arc::new(OpenAIEmbeddings::new(config)?)),
        other => Err(RagError::Configuration(format!(
            "unknown embedding provider: '{}'",
            other
        ))),
    }
}

/// Resolve the OpenAI key from config, then `OPENAI_API_KEY`.
pub fn resolve_api_key(configured: Option<&str>) -> Result<String> {
    configured
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            RagError::Auth("OpenAI API key not configured (set api_key or OPENAI_API_KEY)".into())
        })
}

// ============ Ollama ============

pub struct OllamaEmbeddings {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dims: usize,
}

impl OllamaEmbeddings {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_secs)?,
            endpoint: format!("{}/api/embeddings", config.base_url()),
            model: config.model().to_string(),
            dims: config.dims(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({
            "model": self.model,
            "prompt": text,
        });
        let json = http::post_json(
            &self.client,
            "ollama",
            BackendKind::Local,
            &self.endpoint,
            None,
            &body,
        )
        .await?;
        http::parse_vector("ollama", json.get("embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            out.push(self.embed(text).await?);
            debug!(done = i + 1, total = texts.len(), "ollama embedding");
        }
        Ok(out)
    }
}

// ============ OpenAI ============

pub struct OpenAIEmbeddings {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dims: usize,
    api_key: String,
}

impl OpenAIEmbeddings {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_secs)?,
            endpoint: format!("{}/embeddings", config.base_url()),
            model: config.model().to_string(),
            dims: config.dims(),
            api_key: resolve_api_key(config.api_key.as_deref())?,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::MalformedUpstreamResponse("openai: empty embedding response".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": self.model,
            "input": texts,
        });
        let json = http::post_json(
            &self.client,
            "openai",
            BackendKind::Hosted,
            &self.endpoint,
            Some(&self.api_key),
            &body,
        )
        .await?;

        let embeddings = parse_openai_embeddings(&json)?;
        if embeddings.len() != texts.len() {
            return Err(RagError::MalformedUpstreamResponse(format!(
                "openai: {} embeddings for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }
}

/// Extract `data[].embedding`, ordered by each item's `index`.
///
/// The indices must be exactly `0..data.len()` in some order; anything
/// else would pair vectors with the wrong inputs.
fn parse_openai_embeddings(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json.get("data").and_then(|d| d.as_array()).ok_or_else(|| {
        RagError::MalformedUpstreamResponse("openai: missing data array".into())
    })?;

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; data.len()];
    for item in data {
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .ok_or_else(|| {
                RagError::MalformedUpstreamResponse("openai: embedding item without index".into())
            })?;
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| slots.get_mut(i))
            .ok_or_else(|| {
                RagError::MalformedUpstreamResponse(format!(
                    "openai: embedding index {} out of range for {} items",
                    index,
                    data.len()
                ))
            })?;
        if slot.is_some() {
            return Err(RagError::MalformedUpstreamResponse(format!(
                "openai: duplicate embedding index {}",
                index
            )));
        }
        *slot = Some(http::parse_vector("openai", item.get("embedding"))?);
    }

    // n items, n distinct in-range indices: every slot is filled.
    Ok(slots.into_iter().flatten().collect())
}
