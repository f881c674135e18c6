//! Ask flow: retrieve context, get an answer, persist both turns.
//!
//! Unlike [`Retriever::retrieve`], this can fail. Both turns are embedded
//! before either is written, so a failed completion or a failed embedding
//! leaves the conversation untouched. A turn is never stored without the
//! embedding of its own text.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::models::{NewChatTurn, Role};
use crate::retrieve::Retriever;

/// Outcome of [`ask`].
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub conversation_id: String,
    pub answer: String,
    pub effective_query: String,
    pub top_matches: Vec<String>,
    pub include_documents: bool,
}

/// Compose the prompt sent for the final answer.
pub fn final_prompt(context: &str, top_matches: &[String], effective_query: &str) -> String {
    format!(
        "{}\nRelevant Docs: {}\n\nUser Query: {}",
        context,
        top_matches.join("\n"),
        effective_query
    )
}

/// Answer `question` in `conversation_id` and append the user turn (the
/// original question, not the rewrite) followed by the assistant turn.
pub async fn ask(
    retriever: &Retriever<'_>,
    user_id: i64,
    conversation_id: &str,
    question: &str,
) -> Result<Answer> {
    let retrieval = retriever.retrieve(user_id, conversation_id, question).await;

    let prompt = final_prompt(
        &retrieval.prompt,
        &retrieval.top_matches,
        &retrieval.effective_query,
    );
    let answer = retriever
        .completer
        .complete(&prompt)
        .await
        .context("answer completion failed")?;

    let question_turn =
        embed_turn(retriever, user_id, conversation_id, Role::User, question).await?;
    let answer_turn =
        embed_turn(retriever, user_id, conversation_id, Role::Assistant, &answer).await?;

    for turn in [&question_turn, &answer_turn] {
        retriever
            .store
            .append_chat_turn(turn)
            .await
            .with_context(|| format!("failed to store {} turn", turn.role))?;
    }

    info!(
        user_id,
        conversation_id,
        matches = retrieval.top_matches.len(),
        "answered question"
    );

    Ok(Answer {
        conversation_id: conversation_id.to_string(),
        answer,
        effective_query: retrieval.effective_query,
        top_matches: retrieval.top_matches,
        include_documents: retrieval.include_documents,
    })
}

async fn embed_turn(
    retriever: &Retriever<'_>,
    user_id: i64,
    conversation_id: &str,
    role: Role,
    message: &str,
) -> Result<NewChatTurn> {
    let embedding = retriever
        .embedder
        .embed(message)
        .await
        .with_context(|| format!("failed to embed {} turn", role))?;

    Ok(NewChatTurn {
        user_id,
        conversation_id: conversation_id.to_string(),
        role,
        message: message.to_string(),
        embedding,
    })
}
