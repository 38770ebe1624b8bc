//! The interface exposed to the surrounding service.
//!
//! [`RagService`] is built once at startup from explicitly constructed
//! parts (store, embedder, generator) and handed to whatever layer serves
//! requests. It holds no process-wide state; two services over two stores
//! are fully independent.

use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::generation::GenerationProvider;
use crate::index::VectorIndex;
use crate::models::{Answer, Chunk, IndexStats, SearchResult};
use crate::retrieval::RetrievalOrchestrator;
use crate::store::VectorStore;

pub struct RagService {
    index: Arc<VectorIndex>,
    orchestrator: RetrievalOrchestrator,
}

impl RagService {
    /// Wire the index and orchestrator. Fails with a configuration error
    /// when the embedder's dimensionality disagrees with the stored
    /// collection.
    pub async fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Result<Self> {
        let index = Arc::new(VectorIndex::open(store, embedder).await?);
        let orchestrator = RetrievalOrchestrator::new(index.clone(), generator);
        Ok(Self {
            index,
            orchestrator,
        })
    }

    /// Index `chunks` under `document_id`; returns the stored count.
    pub async fn ingest(&self, chunks: &[Chunk], document_id: i64) -> Result<usize> {
        self.index.add(chunks, document_id).await
    }

    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        self.index.search(query, top_k, None).await
    }

    pub async fn remove_document(&self, document_id: i64) -> Result<usize> {
        self.index.delete(document_id).await
    }

    pub async fn answer(&self, message: &str, use_context: bool, top_k: usize) -> Result<Answer> {
        self.orchestrator.answer(message, use_context, top_k).await
    }

    pub async fn index_stats(&self) -> Result<IndexStats> {
        self.index.stats().await
    }
}
