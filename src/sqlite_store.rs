//! SQLite-backed [`VectorStore`] implementation.
//!
//! One database file can hold several collections; each store instance
//! serves one of them. Embeddings are stored as little-endian `f32` BLOBs
//! and ranked with exact cosine distance in process. Any `sqlx` failure
//! surfaces as [`RagError::IndexUnavailable`].

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use positron_core::embedding::{blob_to_vec, cosine_distance, vec_to_blob};
use positron_core::models::IndexedChunk;
use positron_core::store::{MetadataFilter, Neighbor, VectorStore};
use positron_core::{RagError, Result};

use crate::migrate;

pub struct SqliteVectorStore {
    pool: SqlitePool,
    collection: String,
}

fn unavailable(e: sqlx::Error) -> RagError {
    RagError::IndexUnavailable(e.to_string())
}

impl SqliteVectorStore {
    /// Open `collection` in `pool`, creating schema and collection on first use.
    pub async fn open(pool: SqlitePool, collection: impl Into<String>) -> Result<Self> {
        let collection = collection.into();
        migrate::ensure_schema(&pool).await.map_err(unavailable)?;

        sqlx::query("INSERT OR IGNORE INTO collections (name, dims, created_at) VALUES (?, NULL, ?)")
            .bind(&collection)
            .bind(chrono::Utc::now().timestamp())
            .execute(&pool)
            .await
            .map_err(unavailable)?;

        Ok(Self { pool, collection })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn mismatch(&self, got: usize, expected: usize) -> RagError {
        RagError::Configuration(format!(
            "vector has {} dims, collection '{}' holds {}-dim vectors",
            got, self.collection, expected
        ))
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    async fn dimensions(&self) -> Result<Option<usize>> {
        let dims = sqlx::query_scalar::<_, Option<i64>>("SELECT dims FROM collections WHERE name = ?")
            .bind(&self.collection)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .flatten();
        Ok(dims.map(|d| d as usize))
    }

    async fn insert(&self, records: &[IndexedChunk]) -> Result<()> {
        let Some(first) = records.first() else {
            return Ok(());
        };

        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let stored = sqlx::query_scalar::<_, Option<i64>>("SELECT dims FROM collections WHERE name = ?")
            .bind(&self.collection)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unavailable)?
            .flatten();
        let dims = match stored {
            Some(d) => d as usize,
            None => {
                let d = first.embedding.len();
                sqlx::query("UPDATE collections SET dims = ? WHERE name = ?")
                    .bind(d as i64)
                    .bind(&self.collection)
                    .execute(&mut *tx)
                    .await
                    .map_err(unavailable)?;
                d
            }
        };

        for rec in records {
            if rec.embedding.len() != dims {
                return Err(self.mismatch(rec.embedding.len(), dims));
            }
            let metadata_json = serde_json::to_string(&rec.metadata)
                .map_err(|e| RagError::Internal(format!("metadata encoding: {}", e)))?;

            sqlx::query(
                r#"
                INSERT INTO chunks (collection, id, document_id, ordinal, text, metadata_json, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&self.collection)
            .bind(&rec.id)
            .bind(rec.document_id)
            .bind(rec.ordinal as i64)
            .bind(&rec.text)
            .bind(&metadata_json)
            .bind(vec_to_blob(&rec.embedding))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                    RagError::InvalidInput(format!(
                        "chunk id {} already exists in collection '{}'",
                        rec.id, self.collection
                    ))
                } else {
                    unavailable(e)
                }
            })?;
        }

        tx.commit().await.map_err(unavailable)?;
        debug!(rows = records.len(), collection = %self.collection, "inserted chunk rows");
        Ok(())
    }

    async fn query(
        &self,
        query_vec: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Neighbor>> {
        match self.dimensions().await? {
            None => return Ok(Vec::new()),
            Some(dims) if dims != query_vec.len() => {
                return Err(self.mismatch(query_vec.len(), dims))
            }
            Some(_) => {}
        }

        let rows = sqlx::query(
            "SELECT id, text, metadata_json, embedding FROM chunks WHERE collection = ?",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        let mut neighbors = Vec::with_capacity(rows.len());
        for row in &rows {
            let metadata_json: String = row.try_get("metadata_json").map_err(unavailable)?;
            let metadata = match serde_json::from_str::<Value>(&metadata_json) {
                Ok(Value::Object(map)) => map,
                Ok(_) => Map::new(),
                Err(e) => {
                    return Err(RagError::IndexUnavailable(format!(
                        "corrupt metadata in collection '{}': {}",
                        self.collection, e
                    )))
                }
            };
            if let Some(f) = filter {
                if !f.matches(&metadata) {
                    continue;
                }
            }

            let blob: Vec<u8> = row.try_get("embedding").map_err(unavailable)?;
            neighbors.push(Neighbor {
                id: row.try_get("id").map_err(unavailable)?,
                text: row.try_get("text").map_err(unavailable)?,
                metadata,
                distance: cosine_distance(query_vec, &blob_to_vec(&blob)),
            });
        }

        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        neighbors.truncate(limit);
        Ok(neighbors)
    }

    async fn delete_document(&self, document_id: i64) -> Result<usize> {
        let result = sqlx::query("DELETE FROM chunks WHERE collection = ? AND document_id = ?")
            .bind(&self.collection)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(result.rows_affected() as usize)
    }

    async fn count(&self) -> Result<usize> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE collection = ?")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(n as usize)
    }
}
