//! Startup wiring: build each component once from config and inject it.

use std::sync::Arc;

use anyhow::{Context, Result};
use positron_core::chunk::Chunker;
use positron_core::service::RagService;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::embedding::create_provider;
use crate::generation::create_generator;
use crate::sqlite_store::SqliteVectorStore;

pub fn chunker(config: &Config) -> Chunker {
    Chunker::new(config.chunking.chunk_size, config.chunking.overlap)
        .with_max_passes(config.chunking.max_passes)
}

/// Open (creating if needed) the configured collection.
pub async fn open_store(config: &Config) -> Result<SqliteVectorStore> {
    let pool = db::connect(config).await.with_context(|| {
        format!("failed to open index at {}", config.index.path.display())
    })?;
    Ok(SqliteVectorStore::open(pool, config.index.collection.clone()).await?)
}

/// Build providers and index and wire them into a [`RagService`].
///
/// Fails on a missing credential, an unknown provider, or an embedding
/// dimensionality that disagrees with the stored collection.
pub async fn open_service(config: &Config) -> Result<RagService> {
    let embedder = create_provider(&config.embedding)?;
    let generator = create_generator(&config.generation)?;
    let store = Arc::new(open_store(config).await?);

    info!(
        embedding = %config.embedding.provider,
        embedding_model = embedder.model_name(),
        generation = %config.generation.provider,
        generation_model = generator.model_name(),
        collection = %config.index.collection,
        "service ready"
    );

    Ok(RagService::new(store, embedder, generator).await?)
}
