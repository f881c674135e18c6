//! Storage abstraction for Docze.
//!
//! The [`Store`] trait defines every storage operation the engine and the
//! ask flow need, enabling pluggable backends (SQLite in the app crate,
//! [`memory::InMemoryStore`] for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ChatTurn, DocumentChunk, FileMetadata, NewChatTurn};

/// Abstract storage backend.
///
/// All reads are scoped to a single user. Chat ordering is defined by the
/// store-assigned sequence number, never by physical row order.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`recent_chat_turns`](Store::recent_chat_turns) | Latest turns of a conversation, newest first |
/// | [`conversation`](Store::conversation) | Whole conversation, oldest first |
/// | [`conversation_ids`](Store::conversation_ids) | Conversations a user has, in order of first message |
/// | [`append_chat_turn`](Store::append_chat_turn) | Append one turn, returning its sequence number |
/// | [`document_chunks`](Store::document_chunks) | Every chunk a user owns |
/// | [`document_metadata`](Store::document_metadata) | Every file a user owns |
/// | [`stored_embeddings`](Store::stored_embeddings) | Existing chunk vectors of a file, by text hash |
/// | [`replace_document`](Store::replace_document) | Insert or replace a file and its chunks |
/// | [`delete_document`](Store::delete_document) | Delete a file and its chunks |
#[async_trait]
pub trait Store: Send + Sync {
    /// Up to `limit` turns of one conversation, highest sequence first.
    async fn recent_chat_turns(
        &self,
        user_id: i64,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatTurn>>;

    /// All turns of one conversation, lowest sequence first.
    async fn conversation(&self, user_id: i64, conversation_id: &str) -> Result<Vec<ChatTurn>>;

    /// Distinct conversation ids for a user, ordered by their first turn.
    async fn conversation_ids(&self, user_id: i64) -> Result<Vec<String>>;

    /// Append a turn. Returns the assigned sequence number.
    async fn append_chat_turn(&self, turn: &NewChatTurn) -> Result<i64>;

    /// All document chunks for a user, in insertion order.
    async fn document_chunks(&self, user_id: i64) -> Result<Vec<DocumentChunk>>;

    /// All file metadata for a user, in upload order.
    async fn document_metadata(&self, user_id: i64) -> Result<Vec<FileMetadata>>;

    /// Embeddings already stored for one file's chunks, keyed by
    /// [`text_hash`](crate::embedding::text_hash) of the chunk text. Only
    /// vectors produced by `model` are returned.
    async fn stored_embeddings(
        &self,
        user_id: i64,
        file_name: &str,
        model: &str,
    ) -> Result<HashMap<String, Vec<f32>>>;

    /// Store a file and its chunks, replacing any previous file with the same
    /// name for that user. Returns `true` if a previous file was replaced.
    async fn replace_document(&self, meta: &FileMetadata, chunks: &[DocumentChunk])
        -> Result<bool>;

    /// Delete a file and all of its chunks. Returns `true` if it existed.
    async fn delete_document(&self, user_id: i64, file_name: &str) -> Result<bool>;
}
