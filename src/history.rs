//! `docze history`: print stored conversations.

use anyhow::Result;

use docze_core::models::ChatTurn;
use docze_core::store::Store;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// One conversation, oldest turn first.
pub async fn conversation(store: &dyn Store, user_id: i64, chat_id: &str) -> Result<Vec<ChatTurn>> {
    store.conversation(user_id, chat_id).await
}

/// Every conversation of a user, in order of first message.
pub async fn all_conversations(
    store: &dyn Store,
    user_id: i64,
) -> Result<Vec<(String, Vec<ChatTurn>)>> {
    let mut out = Vec::new();
    for id in store.conversation_ids(user_id).await? {
        let turns = store.conversation(user_id, &id).await?;
        out.push((id, turns));
    }
    Ok(out)
}

pub async fn run_history(
    config: &Config,
    user_id: i64,
    chat_id: Option<&str>,
    json: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let grouped = match chat_id {
        Some(id) => vec![(id.to_string(), conversation(&store, user_id, id).await?)],
        None => all_conversations(&store, user_id).await?,
    };
    store.pool().close().await;

    if json {
        let value: Vec<serde_json::Value> = grouped
            .iter()
            .map(|(id, turns)| serde_json::json!({"chat_id": id, "turns": turns}))
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if grouped.iter().all(|(_, turns)| turns.is_empty()) {
        println!("No history.");
        return Ok(());
    }

    for (id, turns) in &grouped {
        println!("chat {}", id);
        for turn in turns {
            println!("  [{}] {}: {}", turn.seq, turn.role, turn.message);
        }
    }
    Ok(())
}
