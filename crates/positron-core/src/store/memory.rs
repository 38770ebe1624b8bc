//! In-memory [`VectorStore`] implementation for tests and embedding.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`; search is
//! brute-force cosine distance over every stored vector. The collection's
//! dimensionality is fixed by the first insert and kept after deletes.
//! Nothing survives the process.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::embedding::cosine_distance;
use crate::error::{RagError, Result};
use crate::models::IndexedChunk;

use super::{MetadataFilter, Neighbor, VectorStore};

/// In-memory store for a single collection.
pub struct InMemoryStore {
    name: String,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    dims: Option<usize>,
    records: Vec<IndexedChunk>,
}

impl InMemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new("documents")
    }
}

fn poisoned<T>(_: PoisonError<T>) -> RagError {
    RagError::IndexUnavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn collection_name(&self) -> &str {
        &self.name
    }

    async fn dimensions(&self) -> Result<Option<usize>> {
        Ok(self.inner.read().map_err(poisoned)?.dims)
    }

    async fn insert(&self, records: &[IndexedChunk]) -> Result<()> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        let mut inner = self.inner.write().map_err(poisoned)?;

        let expected = inner.dims.unwrap_or(first.embedding.len());
        for (i, rec) in records.iter().enumerate() {
            if rec.embedding.len() != expected {
                return Err(RagError::Configuration(format!(
                    "vector {} has {} dims, collection '{}' holds {}",
                    rec.id,
                    rec.embedding.len(),
                    self.name,
                    expected
                )));
            }
            let clash = inner.records.iter().any(|s| s.id == rec.id)
                || records[..i].iter().any(|r| r.id == rec.id);
            if clash {
                return Err(RagError::InvalidInput(format!(
                    "chunk id {} already exists in collection '{}'",
                    rec.id, self.name
                )));
            }
        }

        inner.dims = Some(expected);
        inner.records.extend(records.iter().cloned());
        Ok(())
    }

    async fn query(
        &self,
        query_vec: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Neighbor>> {
        let inner = self.inner.read().map_err(poisoned)?;
        let mut neighbors: Vec<Neighbor> = inner
            .records
            .iter()
            .filter(|r| filter.map_or(true, |f| f.matches(&r.metadata)))
            .map(|r| Neighbor {
                id: r.id.clone(),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
                distance: cosine_distance(query_vec, &r.embedding),
            })
            .collect();
        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        neighbors.truncate(limit);
        Ok(neighbors)
    }

    async fn delete_document(&self, document_id: i64) -> Result<usize> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let before = inner.records.len();
        inner.records.retain(|r| r.document_id != document_id);
        Ok(before - inner.records.len())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().map_err(poisoned)?.records.len())
    }
}
