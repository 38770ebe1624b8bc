use anyhow::Result;
use positron_core::models::{ChunkKind, SearchResult};
use serde_json::{Map, Value};

use crate::app;
use crate::config::Config;

pub async fn run_search(config: &Config, query: &str, top_k: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let service = app::open_service(config).await?;
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let results = service.retrieve(query, top_k).await?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for result in &results {
        print_result(result);
    }
    Ok(())
}

fn print_result(result: &SearchResult) {
    let source = result
        .metadata
        .get("source")
        .and_then(|s| s.as_str())
        .unwrap_or("(unknown)");

    println!("{}. [{:.4}] {}", result.rank, result.score, source);
    if let Some(page) = result.metadata.get("page") {
        println!("    page: {}", page);
    }
    if let Some(kind) = chunk_kind(&result.metadata) {
        println!("    type: {}", kind.as_str());
    }
    println!(
        "    excerpt: \"{}\"",
        excerpt(&result.content, 240).replace('\n', " ").trim()
    );
    println!("    id: {}", result.id);
    println!();
}

/// The chunk's `type`, when it names a known kind.
fn chunk_kind(metadata: &Map<String, Value>) -> Option<ChunkKind> {
    metadata
        .get("type")
        .and_then(|k| serde_json::from_value(k.clone()).ok())
}

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}
