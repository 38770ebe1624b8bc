//! # Positron Core
//!
//! Runtime-agnostic retrieval-augmented generation logic: data models,
//! chunking, provider traits, the vector index, and retrieval
//! orchestration.
//!
//! This crate contains no HTTP client, SQL, or filesystem I/O. Concrete
//! embedding/generation backends and the persistent vector store live in
//! the `positron` application crate and are injected through the traits
//! defined here.
//!
//! ## Data Flow
//!
//! ```text
//! text ──▶ Chunker ──▶ [Chunk] ──▶ VectorIndex::add ──▶ VectorStore
//!                                        │ (EmbeddingProvider)
//! query ──▶ RetrievalOrchestrator ──▶ VectorIndex::search
//!                 │
//!                 └──▶ context assembly ──▶ GenerationProvider ──▶ Answer
//! ```

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod models;
pub mod retrieval;
pub mod service;
pub mod store;

pub use error::{RagError, Result};
