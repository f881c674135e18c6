//! Completion model trait.
//!
//! The engine uses a [`Completer`] three ways: rewriting pronoun-bearing
//! questions, classifying self-referential questions, and (in [`crate::chat`])
//! producing the final answer. Concrete providers live in the `docze` crate.

use anyhow::Result;
use async_trait::async_trait;

/// A black-box text completion model: one prompt in, one reply out.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Send `prompt` as a single user message and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
