//! Document ingestion, removal, and listing.
//!
//! Ingestion flow for one file:
//!
//! ```text
//! read → extract → normalize → [reformat] → chunk → embed → replace in store
//! ```
//!
//! Uploading a file whose name the user already has replaces the old file
//! and all of its chunks. Chunks whose text hash and embedding model match a
//! chunk of the old file keep its vector instead of being embedded again.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use docze_core::chunk::{chunk_text, normalize_whitespace};
use docze_core::completion::Completer;
use docze_core::embedding::{text_hash, Embedder};
use docze_core::models::{DocumentChunk, FileMetadata};
use docze_core::store::Store;

use crate::completion::create_completer;
use crate::config::{Config, DocumentsConfig};
use crate::db;
use crate::embedding::create_embedder;
use crate::extract::{extract_text, FileKind};
use crate::sqlite_store::SqliteStore;

/// Outcome of ingesting one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    pub file_name: String,
    pub chunks: usize,
    /// Chunks whose embedding was carried over from the replaced file.
    pub reused: usize,
    /// A file with the same name existed and was replaced.
    pub replaced: bool,
    pub link: String,
}

/// Preview link for PDFs, download link for everything else.
pub fn document_link(link_base: &str, user_id: i64, file_name: &str, kind: FileKind) -> String {
    let action = match kind {
        FileKind::Pdf => "preview",
        FileKind::Docx | FileKind::Txt => "download",
    };
    format!(
        "{}/{}/{}/{}",
        link_base.trim_end_matches('/'),
        action,
        user_id,
        file_name
    )
}

/// Prompt asking the model to tidy extracted resume text.
pub fn reformat_prompt(text: &str) -> String {
    format!(
        "Text format of a single resume document:\n{}\n\n\
         ## Format this resume without bullet points or **.\n\
         ## Do not add any extra text, ** or highlighting in the response.",
        text
    )
}

/// Ingest `path` for `user_id`.
///
/// `reformatter` is consulted only when `settings.reformat` is set; if it
/// fails, the normalized text is used as-is.
pub async fn ingest_document(
    store: &dyn Store,
    embedder: &dyn Embedder,
    reformatter: Option<&dyn Completer>,
    settings: &DocumentsConfig,
    user_id: i64,
    path: &Path,
) -> Result<Ingested> {
    let kind = FileKind::from_path(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))?
        .to_string();

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let raw = extract_text(&bytes, kind).with_context(|| format!("Failed to extract {}", file_name))?;

    let mut text = normalize_whitespace(&raw);
    if text.is_empty() {
        bail!("No text could be extracted from {}", file_name);
    }

    if settings.reformat {
        if let Some(model) = reformatter {
            match model.complete(&reformat_prompt(&text)).await {
                Ok(reply) if !reply.trim().is_empty() => text = normalize_whitespace(&reply),
                Ok(_) => warn!(file = %file_name, "reformat returned nothing; keeping extracted text"),
                Err(e) => {
                    warn!(file = %file_name, error = %e, "reformat failed; keeping extracted text")
                }
            }
        }
    }

    let pieces = chunk_text(&text, settings.max_tokens);
    let model = embedder.model_name().to_string();
    let stored = store
        .stored_embeddings(user_id, &file_name, &model)
        .await
        .with_context(|| format!("Failed to load stored embeddings for {}", file_name))?;

    let hashes: Vec<String> = pieces.iter().map(|p| text_hash(p)).collect();
    let pending: Vec<String> = pieces
        .iter()
        .zip(&hashes)
        .filter(|(_, hash)| !stored.contains_key(*hash))
        .map(|(piece, _)| piece.clone())
        .collect();

    let fresh = if pending.is_empty() {
        Vec::new()
    } else {
        embedder
            .embed_batch(&pending)
            .await
            .with_context(|| format!("Failed to embed {}", file_name))?
    };
    if fresh.len() != pending.len() {
        bail!(
            "Embedding provider returned {} vectors for {} chunks",
            fresh.len(),
            pending.len()
        );
    }

    let reused = pieces.len() - pending.len();
    let mut fresh = fresh.into_iter();
    let mut chunks = Vec::with_capacity(pieces.len());
    for (i, (text, hash)) in pieces.into_iter().zip(&hashes).enumerate() {
        let embedding = match stored.get(hash) {
            Some(vector) => vector.clone(),
            None => fresh
                .next()
                .ok_or_else(|| anyhow::anyhow!("Missing embedding for chunk {}", i))?,
        };
        chunks.push(DocumentChunk {
            user_id,
            file_name: file_name.clone(),
            chunk_index: i as i64,
            text,
            embedding,
            embedding_model: model.clone(),
        });
    }

    let link = document_link(&settings.link_base, user_id, &file_name, kind);
    let meta = FileMetadata {
        user_id,
        file_name: file_name.clone(),
        file_type: kind.as_str().to_string(),
        file_size: bytes.len() as i64,
        link: link.clone(),
        uploaded_at: chrono::Utc::now().timestamp(),
    };

    let replaced = store.replace_document(&meta, &chunks).await?;
    info!(
        user_id,
        file = %file_name,
        chunks = chunks.len(),
        reused,
        replaced,
        "ingested document"
    );

    Ok(Ingested {
        file_name,
        chunks: chunks.len(),
        reused,
        replaced,
        link,
    })
}

pub async fn run_add(config: &Config, user_id: i64, paths: &[std::path::PathBuf]) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let embedder = create_embedder(&config.embedding)?;
    let completer = if config.documents.reformat {
        Some(create_completer(&config.completion)?)
    } else {
        None
    };

    let mut added = 0usize;
    let mut updated = 0usize;
    for path in paths {
        let result = ingest_document(
            &store,
            embedder.as_ref(),
            completer.as_deref(),
            &config.documents,
            user_id,
            path,
        )
        .await?;

        if result.replaced {
            updated += 1;
            println!(
                "updated {} ({} chunks, {} unchanged)",
                result.file_name, result.chunks, result.reused
            );
        } else {
            added += 1;
            println!("added {} ({} chunks)", result.file_name, result.chunks);
        }
        println!("  link: {}", result.link);
    }
    store.pool().close().await;

    println!("files added: {}", added);
    println!("files updated: {}", updated);
    println!("ok");
    Ok(())
}

pub async fn run_remove(config: &Config, user_id: i64, file_name: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let removed = store.delete_document(user_id, file_name).await?;
    store.pool().close().await;

    if !removed {
        bail!("No file named '{}' for user {}", file_name, user_id);
    }
    info!(user_id, file = %file_name, "removed document");
    println!("removed {}", file_name);
    Ok(())
}

pub async fn run_files(config: &Config, user_id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let files = store.document_metadata(user_id).await?;
    store.pool().close().await;

    if files.is_empty() {
        println!("No files.");
        return Ok(());
    }

    println!(
        "{:<32} {:<5} {:>10}  {:<20}  LINK",
        "FILE", "TYPE", "SIZE", "UPLOADED"
    );
    for f in &files {
        println!(
            "{:<32} {:<5} {:>10}  {:<20}  {}",
            f.file_name,
            f.file_type,
            f.file_size,
            format_ts(f.uploaded_at),
            f.link
        );
    }
    Ok(())
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}
