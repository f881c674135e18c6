//! `docze ask` and `docze context`.
//!
//! Both wire the engine to the SQLite store and the configured providers.
//! `ask` answers and persists the exchange; `context` only shows what the
//! engine would send, without calling the final model or writing anything.

use anyhow::Result;
use uuid::Uuid;

use docze_core::assemble::ContextAssembler;
use docze_core::chat;
use docze_core::completion::Completer;
use docze_core::embedding::Embedder;
use docze_core::geo::Geolocator;
use docze_core::retrieve::Retriever;

use crate::completion::create_completer;
use crate::config::Config;
use crate::db;
use crate::embedding::create_embedder;
use crate::geolocation::create_locator;
use crate::sqlite_store::SqliteStore;

/// Collaborators built from configuration, owned for the duration of a command.
pub struct Engine {
    pub store: SqliteStore,
    pub embedder: Box<dyn Embedder>,
    pub completer: Box<dyn Completer>,
    pub locator: Box<dyn Geolocator>,
    assembler: ContextAssembler,
    config: Config,
}

impl Engine {
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        Ok(Self {
            store: SqliteStore::new(pool),
            embedder: create_embedder(&config.embedding)?,
            completer: create_completer(&config.completion)?,
            locator: create_locator(&config.geolocation)?,
            assembler: ContextAssembler::new(config.prompt.assistant_name.clone()),
            config: config.clone(),
        })
    }

    pub fn retriever(&self) -> Retriever<'_> {
        Retriever::new(
            &self.store,
            self.embedder.as_ref(),
            self.completer.as_ref(),
            self.locator.as_ref(),
        )
        .with_assembler(self.assembler.clone())
        .with_params(self.config.retrieval.params())
    }
}

pub async fn run_ask(
    config: &Config,
    user_id: i64,
    chat_id: Option<String>,
    question: &str,
    json: bool,
) -> Result<()> {
    let engine = Engine::from_config(config).await?;
    let conversation_id = chat_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let answer = chat::ask(&engine.retriever(), user_id, &conversation_id, question).await;
    engine.store.pool().close().await;
    let answer = answer?;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    println!("{}", answer.answer);
    println!();
    println!("chat: {}", answer.conversation_id);
    if answer.effective_query != question {
        println!("resolved question: {}", answer.effective_query);
    }
    Ok(())
}

pub async fn run_context(
    config: &Config,
    user_id: i64,
    chat_id: &str,
    question: &str,
    k: Option<usize>,
    json: bool,
) -> Result<()> {
    let engine = Engine::from_config(config).await?;
    let k = k.unwrap_or(config.retrieval.top_k);

    let result = engine
        .retriever()
        .retrieve_k(user_id, chat_id, question, k)
        .await;
    engine.store.pool().close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("effective query: {}", result.effective_query);
    println!("documents consulted: {}", result.include_documents);
    println!("top matches: {}", result.top_matches.len());
    for (i, m) in result.top_matches.iter().enumerate() {
        println!("  {}. {}", i + 1, preview(m, 120));
    }
    println!();
    println!("{}", result.prompt);
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let cut: String = single_line.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_chars() {
        assert_eq!(preview("short\ntext", 20), "short text");
        assert_eq!(preview("ééééé", 3), "ééé…");
    }
}
