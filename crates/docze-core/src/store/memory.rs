//! In-memory [`Store`] implementation for tests and embedding in other tools.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Sequence numbers come from a
//! single counter, so they increase across all users and conversations just
//! like an autoincrement column.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::text_hash;
use crate::models::{ChatTurn, DocumentChunk, FileMetadata, NewChatTurn};

use super::Store;

#[derive(Default)]
struct Inner {
    next_seq: i64,
    turns: Vec<ChatTurn>,
    files: Vec<FileMetadata>,
    chunks: Vec<DocumentChunk>,
}

/// In-memory store.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn recent_chat_turns(
        &self,
        user_id: i64,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatTurn>> {
        let inner = self.read()?;
        let mut turns: Vec<ChatTurn> = inner
            .turns
            .iter()
            .filter(|t| t.user_id == user_id && t.conversation_id == conversation_id)
            .cloned()
            .collect();
        turns.sort_by(|a, b| b.seq.cmp(&a.seq));
        turns.truncate(limit.max(0) as usize);
        Ok(turns)
    }

    async fn conversation(&self, user_id: i64, conversation_id: &str) -> Result<Vec<ChatTurn>> {
        let inner = self.read()?;
        let mut turns: Vec<ChatTurn> = inner
            .turns
            .iter()
            .filter(|t| t.user_id == user_id && t.conversation_id == conversation_id)
            .cloned()
            .collect();
        turns.sort_by_key(|t| t.seq);
        Ok(turns)
    }

    async fn conversation_ids(&self, user_id: i64) -> Result<Vec<String>> {
        let inner = self.read()?;
        let mut ids: Vec<String> = Vec::new();
        let mut turns: Vec<&ChatTurn> = inner.turns.iter().filter(|t| t.user_id == user_id).collect();
        turns.sort_by_key(|t| t.seq);
        for t in turns {
            if !ids.contains(&t.conversation_id) {
                ids.push(t.conversation_id.clone());
            }
        }
        Ok(ids)
    }

    async fn append_chat_turn(&self, turn: &NewChatTurn) -> Result<i64> {
        let mut inner = self.write()?;
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner.turns.push(ChatTurn {
            seq,
            user_id: turn.user_id,
            conversation_id: turn.conversation_id.clone(),
            role: turn.role,
            message: turn.message.clone(),
            embedding: turn.embedding.clone(),
        });
        Ok(seq)
    }

    async fn document_chunks(&self, user_id: i64) -> Result<Vec<DocumentChunk>> {
        let inner = self.read()?;
        Ok(inner
            .chunks
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn document_metadata(&self, user_id: i64) -> Result<Vec<FileMetadata>> {
        let inner = self.read()?;
        Ok(inner
            .files
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn stored_embeddings(
        &self,
        user_id: i64,
        file_name: &str,
        model: &str,
    ) -> Result<HashMap<String, Vec<f32>>> {
        let inner = self.read()?;
        Ok(inner
            .chunks
            .iter()
            .filter(|c| {
                c.user_id == user_id && c.file_name == file_name && c.embedding_model == model
            })
            .map(|c| (text_hash(&c.text), c.embedding.clone()))
            .collect())
    }

    async fn replace_document(
        &self,
        meta: &FileMetadata,
        chunks: &[DocumentChunk],
    ) -> Result<bool> {
        let mut inner = self.write()?;
        let before = inner.files.len();
        inner
            .files
            .retain(|f| !(f.user_id == meta.user_id && f.file_name == meta.file_name));
        let replaced = inner.files.len() != before;
        inner
            .chunks
            .retain(|c| !(c.user_id == meta.user_id && c.file_name == meta.file_name));
        inner.files.push(meta.clone());
        inner.chunks.extend(chunks.iter().cloned());
        Ok(replaced)
    }

    async fn delete_document(&self, user_id: i64, file_name: &str) -> Result<bool> {
        let mut inner = self.write()?;
        let before = inner.files.len();
        inner
            .files
            .retain(|f| !(f.user_id == user_id && f.file_name == file_name));
        inner
            .chunks
            .retain(|c| !(c.user_id == user_id && c.file_name == file_name));
        Ok(inner.files.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn turn(user_id: i64, chat: &str, role: Role, message: &str) -> NewChatTurn {
        NewChatTurn {
            user_id,
            conversation_id: chat.to_string(),
            role,
            message: message.to_string(),
            embedding: vec![1.0],
        }
    }

    fn file(user_id: i64, name: &str) -> FileMetadata {
        FileMetadata {
            user_id,
            file_name: name.to_string(),
            file_type: "txt".to_string(),
            file_size: 10,
            link: format!("http://localhost/download/{}/{}", user_id, name),
            uploaded_at: 0,
        }
    }

    fn chunk(user_id: i64, name: &str, text: &str) -> DocumentChunk {
        DocumentChunk {
            user_id,
            file_name: name.to_string(),
            chunk_index: 0,
            text: text.to_string(),
            embedding: vec![1.0, 0.0],
            embedding_model: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn recent_turns_are_newest_first_and_bounded() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store
                .append_chat_turn(&turn(1, "c1", Role::User, &format!("m{}", i)))
                .await
                .unwrap();
        }
        store
            .append_chat_turn(&turn(1, "c2", Role::User, "other chat"))
            .await
            .unwrap();

        let recent = store.recent_chat_turns(1, "c1", 3).await.unwrap();
        let texts: Vec<&str> = recent.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(texts, vec!["m4", "m3", "m2"]);
    }

    #[tokio::test]
    async fn conversation_ids_follow_first_turn() {
        let store = InMemoryStore::new();
        store.append_chat_turn(&turn(1, "b", Role::User, "x")).await.unwrap();
        store.append_chat_turn(&turn(1, "a", Role::User, "y")).await.unwrap();
        store.append_chat_turn(&turn(1, "b", Role::Assistant, "z")).await.unwrap();
        store.append_chat_turn(&turn(2, "c", Role::User, "w")).await.unwrap();

        assert_eq!(store.conversation_ids(1).await.unwrap(), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn replace_and_delete_cascade_to_chunks() {
        let store = InMemoryStore::new();
        let replaced = store
            .replace_document(&file(1, "cv.txt"), &[chunk(1, "cv.txt", "old")])
            .await
            .unwrap();
        assert!(!replaced);

        let replaced = store
            .replace_document(&file(1, "cv.txt"), &[chunk(1, "cv.txt", "new")])
            .await
            .unwrap();
        assert!(replaced);

        let chunks = store.document_chunks(1).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "new");

        assert!(store.delete_document(1, "cv.txt").await.unwrap());
        assert!(store.document_chunks(1).await.unwrap().is_empty());
        assert!(store.document_metadata(1).await.unwrap().is_empty());
        assert!(!store.delete_document(1, "cv.txt").await.unwrap());
    }

    #[tokio::test]
    async fn stored_embeddings_match_file_and_model() {
        let store = InMemoryStore::new();
        store
            .replace_document(&file(1, "cv.txt"), &[chunk(1, "cv.txt", "rust")])
            .await
            .unwrap();
        store
            .replace_document(&file(1, "other.txt"), &[chunk(1, "other.txt", "go")])
            .await
            .unwrap();

        let stored = store.stored_embeddings(1, "cv.txt", "test").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[&text_hash("rust")], vec![1.0, 0.0]);

        assert!(store.stored_embeddings(1, "cv.txt", "other-model").await.unwrap().is_empty());
        assert!(store.stored_embeddings(2, "cv.txt", "test").await.unwrap().is_empty());
    }
}
