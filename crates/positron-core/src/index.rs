//! Vector index: embeds chunks on write and queries on read.
//!
//! [`VectorIndex`] owns no storage itself. It pairs an
//! [`EmbeddingProvider`] with a [`VectorStore`] and enforces the contract
//! between them:
//!
//! - chunk ids are `"<document_id>_<ordinal>"` in insertion order;
//! - every vector has the provider's dimensionality, and the provider's
//!   dimensionality matches what the collection already holds;
//! - search scores are `1 - cosine distance`, ranked from 1.
//!
//! An `add` whose embedding step fails writes nothing. A failure inside
//! the store write is surfaced as-is; callers that need all-or-nothing
//! semantics across a document follow up with [`VectorIndex::delete`].

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::models::{Chunk, IndexStats, IndexedChunk, SearchResult};
use crate::store::{MetadataFilter, VectorStore};

pub struct VectorIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl VectorIndex {
    /// Pair a store with an embedder without touching storage.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    /// Pair a store with an embedder, rejecting a dimensionality mismatch
    /// with what the collection already holds.
    pub async fn open(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        if let Some(stored) = store.dimensions().await? {
            if stored != embedder.dims() {
                return Err(RagError::Configuration(format!(
                    "embedding model '{}' produces {} dims but collection '{}' holds {}-dim vectors",
                    embedder.model_name(),
                    embedder.dims(),
                    store.collection_name(),
                    stored
                )));
            }
        }
        Ok(Self::new(store, embedder))
    }

    pub fn collection_name(&self) -> &str {
        self.store.collection_name()
    }

    /// Embed and store `chunks` for `document_id`; returns how many were stored.
    pub async fn add(&self, chunks: &[Chunk], document_id: i64) -> Result<usize> {
        if chunks.is_empty() {
            debug!(document_id, "no chunks to index");
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(document_id, error = %e, "embedding failed; nothing written");
            e
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::MalformedUpstreamResponse(format!(
                "embedding backend returned {} vectors for {} texts",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut records = Vec::with_capacity(chunks.len());
        for (ordinal, (chunk, embedding)) in chunks.iter().zip(embeddings).enumerate() {
            self.check_dims(&embedding)?;
            let mut metadata = chunk.metadata.clone();
            metadata.document_id = Some(document_id);
            records.push(IndexedChunk {
                id: IndexedChunk::make_id(document_id, ordinal),
                document_id,
                ordinal,
                text: chunk.text.clone(),
                metadata: metadata.to_map(),
                embedding,
            });
        }

        self.store.insert(&records).await.map_err(|e| {
            error!(document_id, error = %e, "vector store write failed");
            e
        })?;

        info!(
            document_id,
            chunks = records.len(),
            collection = self.store.collection_name(),
            "indexed document"
        );
        Ok(records.len())
    }

    /// Up to `top_k` chunks most similar to `query`, best first.
    ///
    /// An empty collection yields an empty list without calling the
    /// embedding backend.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 || self.store.count().await? == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed(query).await?;
        self.check_dims(&query_vec)?;

        let neighbors = self.store.query(&query_vec, top_k, filter).await?;
        debug!(hits = neighbors.len(), top_k, "vector search");

        Ok(neighbors
            .into_iter()
            .enumerate()
            .map(|(i, n)| SearchResult {
                id: n.id,
                content: n.text,
                metadata: n.metadata,
                score: 1.0 - n.distance,
                rank: i + 1,
            })
            .collect())
    }

    /// Remove every chunk owned by `document_id`. Not an error if none exist.
    pub async fn delete(&self, document_id: i64) -> Result<usize> {
        let removed = self.store.delete_document(document_id).await?;
        info!(document_id, removed, "removed document from index");
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<IndexStats> {
        Ok(IndexStats {
            total_chunks: self.store.count().await?,
            collection_name: self.store.collection_name().to_string(),
        })
    }

    fn check_dims(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.embedder.dims() {
            return Err(RagError::Configuration(format!(
                "embedding model '{}' is configured for {} dims but returned {}",
                self.embedder.model_name(),
                self.embedder.dims(),
                vector.len()
            )));
        }
        Ok(())
    }
}
