//! Generation backends.
//!
//! - **[`OllamaGenerator`]**: local Ollama server, `POST /api/generate`
//!   with streaming off. Context is folded into the prompt text.
//! - **[`OpenAIGenerator`]**: hosted OpenAI API, `POST /chat/completions`.
//!   Context travels as a system message ahead of the user message.
//!
//! An empty context string is treated like no context.

use std::sync::Arc;

use async_trait::async_trait;
use positron_core::generation::GenerationProvider;
use positron_core::{RagError, Result};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{GenerationConfig, PROVIDER_OLLAMA, PROVIDER_OPENAI};
use crate::embedding::resolve_api_key;
use crate::http::{self, BackendKind};

/// Build the configured generation backend.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn GenerationProvider>> {
    match config.provider.as_str() {
        PROVIDER_OLLAMA => Ok(Arc::new(OllamaGenerator::new(config)?)),
        PROVIDER_OPENAI => Ok(Arc::new(OpenAIGenerator::new(config)?)),
        other => Err(RagError::Configuration(format!(
            "unknown generation provider: '{}'",
            other
        ))),
    }
}

fn non_empty(context: Option<&str>) -> Option<&str> {
    context.filter(|c| !c.is_empty())
}

/// The single prompt sent to a completion-style model.
pub fn grounded_prompt(prompt: &str, context: Option<&str>) -> String {
    match non_empty(context) {
        Some(ctx) => format!("Context:\n{}\n\nQuestion: {}\n\nAnswer:", ctx, prompt),
        None => prompt.to_string(),
    }
}

/// The message list sent to a chat-style model.
pub fn chat_messages(prompt: &str, context: Option<&str>) -> Vec<Value> {
    let mut messages = Vec::with_capacity(2);
    if let Some(ctx) = non_empty(context) {
        messages.push(json!({
            "role": "system",
            "content": format!("Use the following context to answer questions:\n{}", ctx),
        }));
    }
    messages.push(json!({"role": "user", "content": prompt}));
    messages
}

// ============ Ollama ============

pub struct OllamaGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_secs)?,
            endpoint: format!("{}/api/generate", config.base_url()),
            model: config.model().to_string(),
        })
    }
}

#[async_trait]
impl GenerationProvider for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, context: Option<&str>) -> Result<String> {
        let body = json!({
            "model": self.model,
            "prompt": grounded_prompt(prompt, context),
            "stream": false,
        });
        debug!(model = %self.model, grounded = non_empty(context).is_some(), "ollama generate");
        let json = http::post_json(
            &self.client,
            "ollama",
            BackendKind::Local,
            &self.endpoint,
            None,
            &body,
        )
        .await?;
        http::parse_text("ollama", json.get("response"), "response")
    }
}

// ============ OpenAI ============

pub struct OpenAIGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_secs)?,
            endpoint: format!("{}/chat/completions", config.base_url()),
            model: config.model().to_string(),
            api_key: resolve_api_key(config.api_key.as_deref())?,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAIGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, context: Option<&str>) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": chat_messages(prompt, context),
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        debug!(model = %self.model, grounded = non_empty(context).is_some(), "openai generate");
        let json = http::post_json(
            &self.client,
            "openai",
            BackendKind::Hosted,
            &self.endpoint,
            Some(&self.api_key),
            &body,
        )
        .await?;

        let content = json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"));
        http::parse_text("openai", content, "choices[0].message.content")
    }
}
