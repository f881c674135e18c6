//! Core data models used throughout Docze.
//!
//! These types represent the chat turns, document chunks, and file metadata
//! that flow between the store and the retrieval engine.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Who authored a chat turn. There is no third value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => anyhow::bail!("invalid chat role: '{}'", other),
        }
    }
}

/// One stored message in a conversation.
///
/// `seq` is assigned by the store and increases monotonically with insertion;
/// "most recent" always means "highest `seq`".
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub seq: i64,
    pub user_id: i64,
    pub conversation_id: String,
    pub role: Role,
    pub message: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// A chat turn waiting to be appended. The embedding must be computed from
/// `message` itself.
#[derive(Debug, Clone)]
pub struct NewChatTurn {
    pub user_id: i64,
    pub conversation_id: String,
    pub role: Role,
    pub message: String,
    pub embedding: Vec<f32>,
}

/// A unit of extracted document text with its embedding.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    pub user_id: i64,
    pub file_name: String,
    pub chunk_index: i64,
    pub text: String,
    pub embedding: Vec<f32>,
    /// Model that produced `embedding`.
    pub embedding_model: String,
}

/// File-level metadata for an ingested document.
#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    pub user_id: i64,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    /// Preview or download link shown to the model and the user.
    pub link: String,
    /// Unix timestamp (seconds).
    pub uploaded_at: i64,
}

/// The `(name, link)` view of a file that goes into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRef {
    pub name: String,
    pub link: String,
}

impl From<&FileMetadata> for DocumentRef {
    fn from(meta: &FileMetadata) -> Self {
        Self {
            name: meta.file_name.clone(),
            link: meta.link.clone(),
        }
    }
}

/// Output of one retrieval pass. Transient; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    /// Best-matching document texts, most similar first.
    pub top_matches: Vec<String>,
    /// Assembled prompt for the completion model.
    pub prompt: String,
    /// The question after pronoun resolution.
    pub effective_query: String,
    /// Whether document context was consulted.
    pub include_documents: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn role_rejects_other_values() {
        assert!("system".parse::<Role>().is_err());
        assert!("User".parse::<Role>().is_err());
    }
}
