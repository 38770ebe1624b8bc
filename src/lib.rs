//! # Positron
//!
//! A local-first retrieval-augmented generation pipeline: chunk documents,
//! embed and index the chunks in SQLite, and answer questions grounded in
//! the most similar chunks.
//!
//! The algorithms live in [`positron_core`]. This crate supplies the
//! concrete pieces injected into it: Ollama and OpenAI provider backends,
//! the SQLite vector store, configuration, logging, and the CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌───────────────┐
//! │ PDF/Text │──▶│   Chunker   │──▶│  VectorIndex  │──▶ SQLite
//! │ extract  │   │             │   │  (embedder)   │
//! └──────────┘   └─────────────┘   └───────┬───────┘
//!                                          │
//!                  ┌───────────────────────┘
//!                  ▼
//!          ┌──────────────┐       ┌────────────┐
//!          │ Orchestrator │──────▶│ Generator  │──▶ answer + sources
//!          └──────────────┘       └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! positron init
//! positron ingest ./manual.pdf --document-id 1
//! positron search "reset the device"
//! positron ask "How do I reset the device?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite [`VectorStore`](positron_core::store::VectorStore) |
//! | [`http`] | Shared provider HTTP plumbing and error classification |
//! | [`embedding`] | Ollama / OpenAI embedding backends |
//! | [`generation`] | Ollama / OpenAI generation backends |
//! | [`extract`] | PDF page and text extraction |
//! | [`app`] | Component wiring |
//! | [`ingest`], [`search`], [`ask`], [`stats`] | CLI commands |

pub mod app;
pub mod ask;
pub mod config;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod generation;
pub mod http;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod search;
pub mod sqlite_store;
pub mod stats;
