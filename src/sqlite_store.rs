//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation onto the `chat_turns`, `files`, and
//! `document_chunks` tables created by [`crate::migrate`]. Every read has an
//! explicit `ORDER BY`; physical row order is never relied on.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use docze_core::embedding::{blob_to_vec, text_hash, vec_to_blob};
use docze_core::models::{ChatTurn, DocumentChunk, FileMetadata, NewChatTurn};
use docze_core::store::Store;

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn chat_turn_from_row(row: &SqliteRow) -> Result<ChatTurn> {
    let role: String = row.get("role");
    let blob: Vec<u8> = row.get("embedding");
    Ok(ChatTurn {
        seq: row.get("seq"),
        user_id: row.get("user_id"),
        conversation_id: row.get("conversation_id"),
        role: role.parse()?,
        message: row.get("message"),
        embedding: blob_to_vec(&blob),
    })
}

fn file_from_row(row: &SqliteRow) -> FileMetadata {
    FileMetadata {
        user_id: row.get("user_id"),
        file_name: row.get("file_name"),
        file_type: row.get("file_type"),
        file_size: row.get("file_size"),
        link: row.get("link"),
        uploaded_at: row.get("uploaded_at"),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn recent_chat_turns(
        &self,
        user_id: i64,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatTurn>> {
        let rows = sqlx::query(
            r#"
            SELECT seq, user_id, conversation_id, role, message, embedding
            FROM chat_turns
            WHERE user_id = ? AND conversation_id = ?
            ORDER BY seq DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(chat_turn_from_row).collect()
    }

    async fn conversation(&self, user_id: i64, conversation_id: &str) -> Result<Vec<ChatTurn>> {
        let rows = sqlx::query(
            r#"
            SELECT seq, user_id, conversation_id, role, message, embedding
            FROM chat_turns
            WHERE user_id = ? AND conversation_id = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(user_id)
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(chat_turn_from_row).collect()
    }

    async fn conversation_ids(&self, user_id: i64) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT conversation_id
            FROM chat_turns
            WHERE user_id = ?
            GROUP BY conversation_id
            ORDER BY MIN(seq) ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn append_chat_turn(&self, turn: &NewChatTurn) -> Result<i64> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO chat_turns (user_id, conversation_id, role, message, embedding,
                                    created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(turn.user_id)
        .bind(&turn.conversation_id)
        .bind(turn.role.as_str())
        .bind(&turn.message)
        .bind(vec_to_blob(&turn.embedding))
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert chat turn")?;

        Ok(result.last_insert_rowid())
    }

    async fn document_chunks(&self, user_id: i64) -> Result<Vec<DocumentChunk>> {
        let rows = sqlx::query(
            r#"
            SELECT c.user_id, c.file_name, c.chunk_index, c.text, c.embedding,
                   c.embedding_model
            FROM document_chunks c
            JOIN files f ON f.user_id = c.user_id AND f.file_name = c.file_name
            WHERE c.user_id = ?
            ORDER BY f.uploaded_at ASC, c.file_name ASC, c.chunk_index ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                DocumentChunk {
                    user_id: row.get("user_id"),
                    file_name: row.get("file_name"),
                    chunk_index: row.get("chunk_index"),
                    text: row.get("text"),
                    embedding: blob_to_vec(&blob),
                    embedding_model: row.get("embedding_model"),
                }
            })
            .collect())
    }

    async fn document_metadata(&self, user_id: i64) -> Result<Vec<FileMetadata>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, file_name, file_type, file_size, link, uploaded_at
            FROM files
            WHERE user_id = ?
            ORDER BY uploaded_at ASC, file_name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(file_from_row).collect())
    }

    async fn stored_embeddings(
        &self,
        user_id: i64,
        file_name: &str,
        model: &str,
    ) -> Result<HashMap<String, Vec<f32>>> {
        let rows = sqlx::query(
            r#"
            SELECT text_hash, embedding
            FROM document_chunks
            WHERE user_id = ? AND file_name = ? AND embedding_model = ?
            ORDER BY chunk_index ASC
            "#,
        )
        .bind(user_id)
        .bind(file_name)
        .bind(model)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let hash: String = row.get("text_hash");
                let blob: Vec<u8> = row.get("embedding");
                (hash, blob_to_vec(&blob))
            })
            .collect())
    }

    async fn replace_document(
        &self,
        meta: &FileMetadata,
        chunks: &[DocumentChunk],
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM document_chunks WHERE user_id = ? AND file_name = ?")
            .bind(meta.user_id)
            .bind(&meta.file_name)
            .execute(&mut *tx)
            .await?;

        let replaced = sqlx::query("DELETE FROM files WHERE user_id = ? AND file_name = ?")
            .bind(meta.user_id)
            .bind(&meta.file_name)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        sqlx::query(
            r#"
            INSERT INTO files (user_id, file_name, file_type, file_size, link, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(meta.user_id)
        .bind(&meta.file_name)
        .bind(&meta.file_type)
        .bind(meta.file_size)
        .bind(&meta.link)
        .bind(meta.uploaded_at)
        .execute(&mut *tx)
        .await?;

        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO document_chunks (user_id, file_name, chunk_index, text,
                                             embedding, embedding_model, text_hash)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(meta.user_id)
            .bind(&meta.file_name)
            .bind(chunk.chunk_index)
            .bind(&chunk.text)
            .bind(vec_to_blob(&chunk.embedding))
            .bind(&chunk.embedding_model)
            .bind(text_hash(&chunk.text))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(replaced)
    }

    async fn delete_document(&self, user_id: i64, file_name: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM document_chunks WHERE user_id = ? AND file_name = ?")
            .bind(user_id)
            .bind(file_name)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM files WHERE user_id = ? AND file_name = ?")
            .bind(user_id)
            .bind(file_name)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        tx.commit().await?;
        Ok(deleted)
    }
}
