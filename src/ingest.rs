//! Document ingestion: extract → chunk → index.
//!
//! Re-ingesting a document id replaces its chunks. If indexing fails after
//! the old chunks are gone, the document is removed entirely rather than
//! left half-written.

use std::path::Path;

use anyhow::Result;
use positron_core::models::Chunk;
use tracing::{debug, error, info, warn};

use crate::app;
use crate::config::Config;
use crate::extract::{self, DocumentText};

/// Extract and chunk a file without touching providers or the index.
pub fn prepare_chunks(
    config: &Config,
    path: &Path,
    source: Option<&str>,
    web: bool,
) -> Result<Vec<Chunk>> {
    let chunker = app::chunker(config);
    debug!(
        path = %path.display(),
        chunk_size = chunker.chunk_size(),
        overlap = chunker.overlap(),
        "chunking document"
    );
    let default_source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let source = source.unwrap_or(&default_source);

    let document = extract::load_document(path)?;
    if document.is_empty() {
        warn!(path = %path.display(), "no extractable text");
    }

    let chunks = match document {
        DocumentText::Pages(pages) => chunker.process_pages(&pages, source)?,
        DocumentText::Plain(text) if web => chunker.process_web(&text, source)?,
        DocumentText::Plain(text) => chunker.process_text(&text, source)?,
    };
    Ok(chunks)
}

/// `positron chunk`: print the chunks a file would produce.
pub fn run_chunk(config: &Config, path: &Path) -> Result<()> {
    let chunks = prepare_chunks(config, path, None, false)?;

    for (i, chunk) in chunks.iter().enumerate() {
        match chunk.metadata.page {
            Some(page) => println!("[chunk {}] {} chars, page {}", i, chunk.text.chars().count(), page),
            None => println!("[chunk {}] {} chars", i, chunk.text.chars().count()),
        }
        println!("{}", chunk.text);
        println!();
    }
    println!("chunks: {}", chunks.len());
    Ok(())
}

/// `positron ingest`: index a file under `document_id`.
pub async fn run_ingest(
    config: &Config,
    path: &Path,
    document_id: i64,
    source: Option<&str>,
    web: bool,
) -> Result<()> {
    let chunks = prepare_chunks(config, path, source, web)?;
    if chunks.is_empty() {
        warn!(path = %path.display(), "document produced no chunks");
    }

    let service = app::open_service(config).await?;

    let replaced = service.remove_document(document_id).await?;
    if replaced > 0 {
        info!(document_id, replaced, "replacing existing document chunks");
    }

    match service.ingest(&chunks, document_id).await {
        Ok(stored) => {
            println!("ingest {}", path.display());
            println!("  document id: {}", document_id);
            println!("  chunks indexed: {}", stored);
            println!("ok");
            Ok(())
        }
        Err(e) => {
            error!(
                document_id,
                error = %e,
                transient = e.is_transient(),
                "indexing failed; removing partial document"
            );
            if let Err(cleanup) = service.remove_document(document_id).await {
                error!(document_id, error = %cleanup, "compensating delete failed");
            }
            Err(e.into())
        }
    }
}

/// `positron remove`: drop every chunk of a document.
pub async fn run_remove(config: &Config, document_id: i64) -> Result<()> {
    let service = app::open_service(config).await?;
    let removed = service.remove_document(document_id).await?;
    println!("removed {} chunks for document {}", removed, document_id);
    Ok(())
}
