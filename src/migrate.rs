use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create every table and index if missing. Safe to run repeatedly.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    // Chat turns; `seq` is the only ordering ever used for history
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chat_turns (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            conversation_id TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
            message TEXT NOT NULL,
            embedding BLOB NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Uploaded files
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            user_id INTEGER NOT NULL,
            file_name TEXT NOT NULL,
            file_type TEXT NOT NULL,
            file_size INTEGER NOT NULL,
            link TEXT NOT NULL,
            uploaded_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, file_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Document chunks with their embeddings
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS document_chunks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            file_name TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            embedding_model TEXT NOT NULL,
            text_hash TEXT NOT NULL,
            UNIQUE (user_id, file_name, chunk_index),
            FOREIGN KEY (user_id, file_name) REFERENCES files (user_id, file_name)
                ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_chat_turns_conversation ON chat_turns(user_id, conversation_id, seq)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_document_chunks_user ON document_chunks(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}
