//! Generation provider trait.
//!
//! Concrete backends (Ollama local server, OpenAI hosted API) live in the
//! `positron` application crate. Each backend decides how to fold the
//! optional grounding context into its own request shape.

use async_trait::async_trait;

use crate::error::Result;

/// Maps a prompt, optionally grounded by a context block, to generated text.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"llama3.2"`).
    fn model_name(&self) -> &str;

    /// Generate a response to `prompt`.
    ///
    /// When `context` is `None` the backend must not invent one: the
    /// request is ungrounded.
    async fn generate(&self, prompt: &str, context: Option<&str>) -> Result<String>;
}
