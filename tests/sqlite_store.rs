//! Contract tests for the SQLite store against a temporary database.

use tempfile::TempDir;

use docze::db::connect_path;
use docze::migrate::migrate_pool;
use docze::sqlite_store::SqliteStore;
use docze_core::embedding::text_hash;
use docze_core::models::{DocumentChunk, FileMetadata, NewChatTurn, Role};
use docze_core::store::Store;

async fn open_store() -> (TempDir, SqliteStore) {
    let tmp = TempDir::new().unwrap();
    let pool = connect_path(&tmp.path().join("data/test.sqlite"))
        .await
        .unwrap();
    migrate_pool(&pool).await.unwrap();
    // Second run must be a no-op.
    migrate_pool(&pool).await.unwrap();
    (tmp, SqliteStore::new(pool))
}

fn turn(user_id: i64, chat: &str, role: Role, message: &str) -> NewChatTurn {
    NewChatTurn {
        user_id,
        conversation_id: chat.to_string(),
        role,
        message: message.to_string(),
        embedding: vec![0.25, -0.5, 1.0],
    }
}

fn file(user_id: i64, name: &str, uploaded_at: i64) -> FileMetadata {
    FileMetadata {
        user_id,
        file_name: name.to_string(),
        file_type: "pdf".to_string(),
        file_size: 2048,
        link: format!("http://localhost:5000/preview/{}/{}", user_id, name),
        uploaded_at,
    }
}

fn chunk(user_id: i64, name: &str, index: i64, text: &str) -> DocumentChunk {
    DocumentChunk {
        user_id,
        file_name: name.to_string(),
        chunk_index: index,
        text: text.to_string(),
        embedding: vec![index as f32, 1.0],
        embedding_model: "test-model".to_string(),
    }
}

#[tokio::test]
async fn test_recent_turns_newest_first_with_limit() {
    let (_tmp, store) = open_store().await;

    let mut seqs = Vec::new();
    for i in 0..4 {
        let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
        seqs.push(
            store
                .append_chat_turn(&turn(1, "c1", role, &format!("m{}", i)))
                .await
                .unwrap(),
        );
    }
    store
        .append_chat_turn(&turn(1, "c2", Role::User, "elsewhere"))
        .await
        .unwrap();
    store
        .append_chat_turn(&turn(2, "c1", Role::User, "other user"))
        .await
        .unwrap();

    assert!(seqs.windows(2).all(|w| w[0] < w[1]));

    let recent = store.recent_chat_turns(1, "c1", 3).await.unwrap();
    let msgs: Vec<&str> = recent.iter().map(|t| t.message.as_str()).collect();
    assert_eq!(msgs, vec!["m3", "m2", "m1"]);
    assert_eq!(recent[0].role, Role::Assistant);
    assert_eq!(recent[0].embedding, vec![0.25, -0.5, 1.0]);

    let all = store.conversation(1, "c1").await.unwrap();
    let msgs: Vec<&str> = all.iter().map(|t| t.message.as_str()).collect();
    assert_eq!(msgs, vec!["m0", "m1", "m2", "m3"]);
}

#[tokio::test]
async fn test_conversation_ids_by_first_turn() {
    let (_tmp, store) = open_store().await;
    store.append_chat_turn(&turn(1, "later", Role::User, "a")).await.unwrap();
    store.append_chat_turn(&turn(1, "first", Role::User, "b")).await.unwrap();
    store.append_chat_turn(&turn(1, "later", Role::User, "c")).await.unwrap();

    assert_eq!(
        store.conversation_ids(1).await.unwrap(),
        vec!["later".to_string(), "first".to_string()]
    );
    assert!(store.conversation_ids(9).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_replace_document_cascades() {
    let (_tmp, store) = open_store().await;

    let replaced = store
        .replace_document(
            &file(1, "cv.pdf", 100),
            &[chunk(1, "cv.pdf", 0, "old a"), chunk(1, "cv.pdf", 1, "old b")],
        )
        .await
        .unwrap();
    assert!(!replaced);
    store
        .replace_document(&file(1, "notes.pdf", 200), &[chunk(1, "notes.pdf", 0, "notes")])
        .await
        .unwrap();

    let replaced = store
        .replace_document(&file(1, "cv.pdf", 300), &[chunk(1, "cv.pdf", 0, "new")])
        .await
        .unwrap();
    assert!(replaced);

    let texts: Vec<String> = store
        .document_chunks(1)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.text)
        .collect();
    assert_eq!(texts, vec!["notes".to_string(), "new".to_string()]);

    let files = store.document_metadata(1).await.unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["notes.pdf", "cv.pdf"]);
    assert_eq!(files[1].link, "http://localhost:5000/preview/1/cv.pdf");
}

#[tokio::test]
async fn test_delete_document_scoped_to_user() {
    let (_tmp, store) = open_store().await;
    store
        .replace_document(&file(1, "cv.pdf", 1), &[chunk(1, "cv.pdf", 0, "mine")])
        .await
        .unwrap();
    store
        .replace_document(&file(2, "cv.pdf", 1), &[chunk(2, "cv.pdf", 0, "theirs")])
        .await
        .unwrap();

    assert!(store.delete_document(1, "cv.pdf").await.unwrap());
    assert!(!store.delete_document(1, "cv.pdf").await.unwrap());

    assert!(store.document_chunks(1).await.unwrap().is_empty());
    assert!(store.document_metadata(1).await.unwrap().is_empty());

    let theirs = store.document_chunks(2).await.unwrap();
    assert_eq!(theirs.len(), 1);
    assert_eq!(theirs[0].embedding, vec![0.0, 1.0]);
}

#[tokio::test]
async fn test_role_check_constraint() {
    let (_tmp, store) = open_store().await;
    let result = sqlx::query(
        "INSERT INTO chat_turns (user_id, conversation_id, role, message, embedding, created_at)
         VALUES (1, 'c', 'system', 'x', x'', 0)",
    )
    .execute(store.pool())
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_stored_embeddings_keyed_by_text_hash() {
    let (_tmp, store) = open_store().await;
    store
        .replace_document(
            &file(1, "cv.pdf", 1),
            &[chunk(1, "cv.pdf", 0, "intro"), chunk(1, "cv.pdf", 1, "skills")],
        )
        .await
        .unwrap();

    let stored = store.stored_embeddings(1, "cv.pdf", "test-model").await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[&text_hash("skills")], vec![1.0, 1.0]);

    assert!(store
        .stored_embeddings(1, "cv.pdf", "another-model")
        .await
        .unwrap()
        .is_empty());
    assert!(store.stored_embeddings(1, "notes.pdf", "test-model").await.unwrap().is_empty());
}
