//! SQLite vector store and the core service running on top of it.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use positron::db::connect_path;
use positron::sqlite_store::SqliteVectorStore;
use positron_core::embedding::EmbeddingProvider;
use positron_core::generation::GenerationProvider;
use positron_core::models::{Chunk, ChunkKind, ChunkMetadata, IndexedChunk};
use positron_core::service::RagService;
use positron_core::store::{MetadataFilter, VectorStore};
use positron_core::{RagError, Result};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

fn record(document_id: i64, ordinal: usize, embedding: Vec<f32>, kind: &str) -> IndexedChunk {
    let metadata = match json!({"source": "t.txt", "type": kind, "document_id": document_id}) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    IndexedChunk {
        id: IndexedChunk::make_id(document_id, ordinal),
        document_id,
        ordinal,
        text: format!("chunk {} of {}", ordinal, document_id),
        metadata,
        embedding,
    }
}

async fn open(dir: &TempDir, collection: &str) -> SqliteVectorStore {
    let pool = connect_path(&dir.path().join("index.sqlite")).await.unwrap();
    SqliteVectorStore::open(pool, collection).await.unwrap()
}

#[tokio::test]
async fn test_fresh_collection_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, "docs").await;

    assert_eq!(store.collection_name(), "docs");
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(store.dimensions().await.unwrap(), None);
    assert!(store.query(&[1.0, 0.0], 5, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_nested_index_path_is_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a").join("b").join("index.sqlite");
    let pool = connect_path(&path).await.unwrap();
    SqliteVectorStore::open(pool, "docs").await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_query_orders_by_distance_and_truncates() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, "docs").await;

    store
        .insert(&[
            record(1, 0, vec![1.0, 0.0, 0.0], "text"),
            record(1, 1, vec![0.0, 1.0, 0.0], "text"),
            record(2, 0, vec![0.9, 0.1, 0.0], "pdf"),
        ])
        .await
        .unwrap();
    assert_eq!(store.count().await.unwrap(), 3);
    assert_eq!(store.dimensions().await.unwrap(), Some(3));

    let hits = store.query(&[1.0, 0.0, 0.0], 2, None).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["1_0", "2_0"]);
    assert!(hits[0].distance.abs() < 1e-6);
    assert!(hits[0].distance <= hits[1].distance);
    assert_eq!(hits[0].text, "chunk 0 of 1");
    assert_eq!(hits[0].metadata["document_id"], 1);
}

#[tokio::test]
async fn test_query_filter_applies_before_ranking() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, "docs").await;
    store
        .insert(&[
            record(1, 0, vec![1.0, 0.0], "text"),
            record(2, 0, vec![0.0, 1.0], "pdf"),
        ])
        .await
        .unwrap();

    let filter = MetadataFilter::new().eq("type", "pdf");
    let hits = store.query(&[1.0, 0.0], 5, Some(&filter)).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "2_0");
}

#[tokio::test]
async fn test_delete_document_counts_rows() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, "docs").await;
    store
        .insert(&[
            record(5, 0, vec![1.0, 0.0], "text"),
            record(5, 1, vec![0.5, 0.5], "text"),
            record(6, 0, vec![0.0, 1.0], "text"),
        ])
        .await
        .unwrap();

    assert_eq!(store.delete_document(5).await.unwrap(), 2);
    assert_eq!(store.delete_document(5).await.unwrap(), 0);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_id_rejected_and_batch_rolled_back() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, "docs").await;
    store.insert(&[record(1, 0, vec![1.0, 0.0], "text")]).await.unwrap();

    let err = store
        .insert(&[
            record(1, 1, vec![0.0, 1.0], "text"),
            record(1, 0, vec![1.0, 0.0], "text"),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::InvalidInput(_)), "{:?}", err);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_dimension_mismatch_is_configuration_error() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, "docs").await;
    store.insert(&[record(1, 0, vec![1.0, 0.0], "text")]).await.unwrap();

    let err = store
        .insert(&[record(2, 0, vec![1.0, 0.0, 0.0], "text")])
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Configuration(_)), "{:?}", err);

    let err = store.query(&[1.0, 0.0, 0.0], 1, None).await.unwrap_err();
    assert!(matches!(err, RagError::Configuration(_)), "{:?}", err);
}

#[tokio::test]
async fn test_rows_and_dims_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = open(&dir, "docs").await;
        store.insert(&[record(3, 0, vec![0.0, 0.0, 1.0], "text")]).await.unwrap();
        store.pool().close().await;
    }

    let store = open(&dir, "docs").await;
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.dimensions().await.unwrap(), Some(3));
    let hits = store.query(&[0.0, 0.0, 1.0], 1, None).await.unwrap();
    assert_eq!(hits[0].id, "3_0");
}

#[tokio::test]
async fn test_collections_are_isolated() {
    let dir = TempDir::new().unwrap();
    let a = open(&dir, "alpha").await;
    let b = open(&dir, "beta").await;

    a.insert(&[record(1, 0, vec![1.0, 0.0], "text")]).await.unwrap();
    // Same id, different collection and dimensionality.
    b.insert(&[record(1, 0, vec![1.0, 0.0, 0.0, 0.0], "text")]).await.unwrap();

    assert_eq!(a.count().await.unwrap(), 1);
    assert_eq!(b.count().await.unwrap(), 1);
    assert_eq!(a.dimensions().await.unwrap(), Some(2));
    assert_eq!(b.dimensions().await.unwrap(), Some(4));

    assert_eq!(a.delete_document(1).await.unwrap(), 1);
    assert_eq!(b.count().await.unwrap(), 1);
}

// ============ Service over SQLite ============

struct WordEmbedder {
    dims: usize,
}

#[async_trait]
impl EmbeddingProvider for WordEmbedder {
    fn model_name(&self) -> &str {
        "words"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(common::embed_text(text, self.dims))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| common::embed_text(t, self.dims)).collect())
    }
}

struct EchoGenerator;

#[async_trait]
impl GenerationProvider for EchoGenerator {
    fn model_name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str, context: Option<&str>) -> Result<String> {
        Ok(format!("{} | {}", prompt, context.unwrap_or("-")))
    }
}

fn chunk(text: &str) -> Chunk {
    Chunk {
        text: text.to_string(),
        metadata: ChunkMetadata::new("notes.txt", ChunkKind::Text),
    }
}

async fn service(dir: &TempDir, dims: usize) -> Result<RagService> {
    let store = Arc::new(open(dir, "library").await);
    RagService::new(store, Arc::new(WordEmbedder { dims }), Arc::new(EchoGenerator)).await
}

#[tokio::test]
async fn test_service_round_trip_on_sqlite() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir, 64).await.unwrap();

    let added = svc
        .ingest(
            &[
                chunk("tokio drives async tasks on a runtime"),
                chunk("sqlite keeps rows in a single file"),
            ],
            4,
        )
        .await
        .unwrap();
    assert_eq!(added, 2);

    let hits = svc.retrieve("sqlite keeps rows in a single file", 2).await.unwrap();
    assert_eq!(hits[0].id, "4_1");
    assert_eq!(hits[0].rank, 1);
    assert!(hits[0].score > 0.99);
    assert_eq!(hits[0].metadata["document_id"], 4);
    assert_eq!(hits[0].metadata["source"], "notes.txt");

    let answer = svc.answer("where are rows kept?", true, 1).await.unwrap();
    assert_eq!(answer.sources.len(), 1);
    assert!(answer.response.starts_with("where are rows kept? | [1] "));

    assert_eq!(svc.remove_document(4).await.unwrap(), 2);
    let stats = svc.index_stats().await.unwrap();
    assert_eq!(stats.total_chunks, 0);
    assert_eq!(stats.collection_name, "library");
}

#[tokio::test]
async fn test_service_refuses_other_dimensionality() {
    let dir = TempDir::new().unwrap();
    {
        let svc = service(&dir, 64).await.unwrap();
        svc.ingest(&[chunk("some indexed words")], 1).await.unwrap();
    }

    let err = service(&dir, 32).await.err().unwrap();
    assert!(matches!(err, RagError::Configuration(_)), "{:?}", err);
}
