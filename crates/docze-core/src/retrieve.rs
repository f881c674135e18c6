//! Retrieval orchestrator.
//!
//! [`Retriever::retrieve`] runs one retrieval pass, strictly in sequence:
//!
//! 1. Fetch the recent turns of the conversation (newest first).
//! 2. Resolve pronouns against them.
//! 3. If documents are wanted: load the user's chunks, embed the effective
//!    question, rank, and load file metadata.
//! 4. Look up location (best effort).
//! 5. Assemble the prompt.
//!
//! The retriever never writes to the store and never returns an error. Every
//! collaborator failure is logged and replaced with an empty value.

use tracing::{debug, warn};

use crate::assemble::ContextAssembler;
use crate::completion::Completer;
use crate::embedding::Embedder;
use crate::geo::{locate_or_unavailable, Geolocator};
use crate::models::{DocumentRef, RetrievalResult};
use crate::rank::rank;
use crate::resolve::resolve;
use crate::store::Store;

/// Default number of recent turns fed to the resolver.
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Default number of top document matches.
pub const DEFAULT_TOP_K: usize = 1;

/// Tunables for a retrieval pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalParams {
    pub history_limit: i64,
    pub top_k: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// The engine, wired to its collaborators.
pub struct Retriever<'a> {
    pub store: &'a dyn Store,
    pub embedder: &'a dyn Embedder,
    pub completer: &'a dyn Completer,
    pub locator: &'a dyn Geolocator,
    pub assembler: ContextAssembler,
    pub params: RetrievalParams,
}

impl<'a> Retriever<'a> {
    pub fn new(
        store: &'a dyn Store,
        embedder: &'a dyn Embedder,
        completer: &'a dyn Completer,
        locator: &'a dyn Geolocator,
    ) -> Self {
        Self {
            store,
            embedder,
            completer,
            locator,
            assembler: ContextAssembler::default(),
            params: RetrievalParams::default(),
        }
    }

    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_params(mut self, params: RetrievalParams) -> Self {
        self.params = params;
        self
    }

    /// Retrieve with the configured `top_k`.
    pub async fn retrieve(
        &self,
        user_id: i64,
        conversation_id: &str,
        query: &str,
    ) -> RetrievalResult {
        self.retrieve_k(user_id, conversation_id, query, self.params.top_k)
            .await
    }

    /// Retrieve keeping the `k` best document matches.
    pub async fn retrieve_k(
        &self,
        user_id: i64,
        conversation_id: &str,
        query: &str,
        k: usize,
    ) -> RetrievalResult {
        let history: Vec<String> = match self
            .store
            .recent_chat_turns(user_id, conversation_id, self.params.history_limit)
            .await
        {
            Ok(turns) => turns.into_iter().map(|t| t.message).collect(),
            Err(e) => {
                warn!(user_id, conversation_id, error = %e, "failed to load chat history");
                Vec::new()
            }
        };

        let resolution = resolve(self.completer, query, &history).await;
        debug!(
            history = resolution.history.len(),
            include_documents = resolution.include_documents,
            "resolved question"
        );

        let (top_matches, document_text, documents) = if resolution.include_documents {
            self.document_context(user_id, &resolution.question, k).await
        } else {
            (Vec::new(), String::new(), Vec::new())
        };

        let location = locate_or_unavailable(self.locator).await;

        let prompt = self.assembler.assemble(
            &resolution.history,
            &document_text,
            &location,
            &documents,
        );

        RetrievalResult {
            top_matches,
            prompt,
            effective_query: resolution.question,
            include_documents: resolution.include_documents,
        }
    }

    /// Top matches, the full document blob, and file references.
    async fn document_context(
        &self,
        user_id: i64,
        question: &str,
        k: usize,
    ) -> (Vec<String>, String, Vec<DocumentRef>) {
        let chunks = match self.store.document_chunks(user_id).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(user_id, error = %e, "failed to load document chunks");
                Vec::new()
            }
        };

        let top_matches = if chunks.is_empty() || k == 0 {
            Vec::new()
        } else {
            match self.embedder.embed(question).await {
                Ok(query_vec) => {
                    let candidates: Vec<(&str, &[f32])> = chunks
                        .iter()
                        .map(|c| (c.text.as_str(), c.embedding.as_slice()))
                        .collect();
                    rank(&query_vec, &candidates, k)
                }
                Err(e) => {
                    warn!(error = %e, "failed to embed question; skipping ranking");
                    Vec::new()
                }
            }
        };

        let document_text = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let documents = match self.store.document_metadata(user_id).await {
            Ok(files) => files.iter().map(DocumentRef::from).collect(),
            Err(e) => {
                warn!(user_id, error = %e, "failed to load document metadata");
                Vec::new()
            }
        };

        debug!(
            chunks = chunks.len(),
            matches = top_matches.len(),
            files = documents.len(),
            "gathered document context"
        );

        (top_matches, document_text, documents)
    }
}
