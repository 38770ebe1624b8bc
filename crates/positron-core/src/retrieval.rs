//! Retrieval orchestration: search, assemble context, generate.
//!
//! # Algorithm
//!
//! 1. Without `use_context`, generate ungrounded and return no sources.
//! 2. Otherwise search the index for `top_k` chunks.
//! 3. No hits: fall back to ungrounded generation. This is a policy, not
//!    a failure.
//! 4. Hits: number them `[1]`, `[2]`, … in rank order and join them with a
//!    blank line into one context block. The same order drives the
//!    returned sources, whose content is cut to
//!    [`SOURCE_PREVIEW_CHARS`] characters plus `"..."`. The generator
//!    always sees the full chunk text.
//! 5. Generate with the full message and context; return the output
//!    verbatim.
//!
//! There are no retries here. A generation failure fails the request.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::generation::GenerationProvider;
use crate::index::VectorIndex;
use crate::models::{Answer, SearchResult, SourceSnippet};

/// Characters of chunk content kept in a returned source.
pub const SOURCE_PREVIEW_CHARS: usize = 200;

/// The grounding block handed to the generator, plus its display sources.
#[derive(Debug, Clone)]
pub struct RetrievalContext {
    pub text: String,
    pub sources: Vec<SourceSnippet>,
}

/// Build the numbered context block and display sources from ranked hits.
pub fn assemble_context(results: &[SearchResult]) -> RetrievalContext {
    let mut parts = Vec::with_capacity(results.len());
    let mut sources = Vec::with_capacity(results.len());

    for (i, result) in results.iter().enumerate() {
        parts.push(format!("[{}] {}", i + 1, result.content));
        sources.push(SourceSnippet {
            content: preview(&result.content),
            metadata: result.metadata.clone(),
            score: result.score,
        });
    }

    RetrievalContext {
        text: parts.join("\n\n"),
        sources,
    }
}

/// First [`SOURCE_PREVIEW_CHARS`] characters followed by `"..."`.
pub fn preview(content: &str) -> String {
    let mut out: String = content.chars().take(SOURCE_PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

pub struct RetrievalOrchestrator {
    index: Arc<VectorIndex>,
    generator: Arc<dyn GenerationProvider>,
}

impl RetrievalOrchestrator {
    pub fn new(index: Arc<VectorIndex>, generator: Arc<dyn GenerationProvider>) -> Self {
        Self { index, generator }
    }

    pub async fn answer(&self, message: &str, use_context: bool, top_k: usize) -> Result<Answer> {
        if !use_context {
            return self.ungrounded(message).await;
        }

        let results = self.index.search(message, top_k, None).await?;
        if results.is_empty() {
            warn!("no indexed context matched; answering without grounding");
            return self.ungrounded(message).await;
        }

        let context = assemble_context(&results);
        debug!(
            sources = context.sources.len(),
            context_chars = context.text.len(),
            "generating grounded answer"
        );
        let response = self.generator.generate(message, Some(&context.text)).await?;

        Ok(Answer {
            response,
            sources: context.sources,
        })
    }

    async fn ungrounded(&self, message: &str) -> Result<Answer> {
        let response = self.generator.generate(message, None).await?;
        Ok(Answer {
            response,
            sources: Vec::new(),
        })
    }
}
