//! Core data models that flow through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of source a chunk was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Pdf,
    Web,
    Text,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Pdf => "pdf",
            ChunkKind::Web => "web",
            ChunkKind::Text => "text",
        }
    }
}

/// Per-chunk metadata.
///
/// `document_id` is absent when the chunker produces the chunk and is
/// attached by [`VectorIndex::add`](crate::index::VectorIndex::add).
/// Serialized with the key `type` for the kind, matching the metadata
/// shape returned in search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<i64>,
}

impl ChunkMetadata {
    pub fn new(source: impl Into<String>, kind: ChunkKind) -> Self {
        Self {
            source: source.into(),
            kind,
            page: None,
            document_id: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Flatten into a JSON object for storage and filtering.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// A bounded span of normalized text plus its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A chunk as persisted inside the vector index.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    /// `"<document_id>_<ordinal>"`.
    pub id: String,
    pub document_id: i64,
    pub ordinal: usize,
    pub text: String,
    /// Chunk metadata with `document_id` attached.
    pub metadata: Map<String, Value>,
    pub embedding: Vec<f32>,
}

impl IndexedChunk {
    pub fn make_id(document_id: i64, ordinal: usize) -> String {
        format!("{}_{}", document_id, ordinal)
    }
}

/// One ranked hit from [`VectorIndex::search`](crate::index::VectorIndex::search).
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    /// `1 - cosine distance`, roughly in `[-1, 1]`.
    pub score: f32,
    /// 1-based position in the result list.
    pub rank: usize,
}

/// Display summary of a chunk that grounded an answer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSnippet {
    pub content: String,
    pub metadata: Map<String, Value>,
    pub score: f32,
}

/// Output of [`RetrievalOrchestrator::answer`](crate::retrieval::RetrievalOrchestrator::answer).
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub response: String,
    pub sources: Vec<SourceSnippet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub collection_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_map_shape() {
        let mut meta = ChunkMetadata::new("report.pdf", ChunkKind::Pdf).with_page(3);
        meta.document_id = Some(7);
        let map = meta.to_map();
        assert_eq!(map["source"], "report.pdf");
        assert_eq!(map["type"], "pdf");
        assert_eq!(map["page"], 3);
        assert_eq!(map["document_id"], 7);
    }

    #[test]
    fn test_metadata_omits_absent_fields() {
        let map = ChunkMetadata::new("notes.txt", ChunkKind::Text).to_map();
        assert!(!map.contains_key("page"));
        assert!(!map.contains_key("document_id"));
    }

    #[test]
    fn test_chunk_id_format() {
        assert_eq!(IndexedChunk::make_id(7, 0), "7_0");
        assert_eq!(IndexedChunk::make_id(12, 34), "12_34");
    }
}
