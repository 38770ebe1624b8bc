//! Storage abstraction for the vector index.
//!
//! The [`VectorStore`] trait is the persistence seam under
//! [`VectorIndex`](crate::index::VectorIndex): it holds embedded chunks for
//! one named collection and answers nearest-neighbour queries in cosine
//! space. Backends report any I/O failure as
//! [`RagError::IndexUnavailable`](crate::error::RagError::IndexUnavailable).
//!
//! Implementations must be `Send + Sync`; each operation must be atomic
//! at the granularity of one call.

pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::IndexedChunk;

/// A candidate returned from [`VectorStore::query`].
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
    /// Cosine distance, `1 - cosine_similarity`.
    pub distance: f32,
}

/// Exact-match restriction on top-level metadata keys.
///
/// A chunk matches when every key in the filter is present in its
/// metadata with an equal value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    conditions: BTreeMap<String, Value>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(key.into(), value.into());
        self
    }

    pub fn document(document_id: i64) -> Self {
        Self::new().eq("document_id", document_id)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        self.conditions
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    }
}

/// Abstract vector storage for a single collection.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`collection_name`](VectorStore::collection_name) | Namespace of this collection |
/// | [`dimensions`](VectorStore::dimensions) | Dimensionality fixed by the first insert |
/// | [`insert`](VectorStore::insert) | Persist embedded chunks |
/// | [`query`](VectorStore::query) | Nearest neighbours by cosine distance |
/// | [`delete_document`](VectorStore::delete_document) | Drop every chunk of a document |
/// | [`count`](VectorStore::count) | Number of stored chunks |
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn collection_name(&self) -> &str;

    /// Dimensionality of stored vectors, or `None` while the collection
    /// is empty and has never been written.
    async fn dimensions(&self) -> Result<Option<usize>>;

    /// Persist records. Ids must not already exist in the collection.
    async fn insert(&self, records: &[IndexedChunk]) -> Result<()>;

    /// Up to `limit` neighbours of `query_vec`, nearest first. The filter
    /// restricts candidates before ranking.
    async fn query(
        &self,
        query_vec: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Neighbor>>;

    /// Remove every chunk owned by `document_id`; returns how many went.
    async fn delete_document(&self, document_id: i64) -> Result<usize>;

    async fn count(&self) -> Result<usize>;
}
