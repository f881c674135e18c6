//! # Docze
//!
//! A document-aware chat assistant. Users upload documents (PDF, DOCX, TXT);
//! Docze extracts and embeds their text, stores it next to chat transcripts
//! in SQLite, and answers questions with a prompt assembled from recent
//! conversation, the best-matching document chunks, and file metadata.
//!
//! The retrieval engine itself lives in [`docze_core`]. This crate supplies
//! the concrete collaborators and the CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │  docze add  │──▶│ Extract+Chunk │──▶│  SQLite  │
//! │ pdf/docx/txt│   │    +Embed     │   │ turns,   │
//! └─────────────┘   └──────────────┘   │ chunks   │
//!                                      └────┬─────┘
//!                                           ▼
//!   question ──▶ docze_core::retrieve ──▶ prompt ──▶ completion model
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite implementation of the engine's `Store` |
//! | [`http`] | JSON POST with retry and backoff |
//! | [`embedding`] | OpenAI / Ollama embedding providers |
//! | [`completion`] | OpenAI / Ollama completion providers |
//! | [`geolocation`] | ip-api.com location lookup |
//! | [`extract`] | PDF / DOCX / TXT text extraction |
//! | [`documents`] | Ingestion, removal, file listing |
//! | [`ask`] | `ask` and `context` commands |
//! | [`history`] | Conversation listing |

pub mod ask;
pub mod completion;
pub mod config;
pub mod db;
pub mod documents;
pub mod embedding;
pub mod extract;
pub mod geolocation;
pub mod history;
pub mod http;
pub mod migrate;
pub mod sqlite_store;
