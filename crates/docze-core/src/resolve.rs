//! Pronoun resolution against short-term conversation history.
//!
//! Decides, from the question's words alone, which of three paths to take:
//!
//! | Signal | Model call | History kept | Documents |
//! |--------|-----------|--------------|-----------|
//! | none / empty history | n/a | all | yes |
//! | third-person or demonstrative pronoun | rewrite question | latest turn only | yes |
//! | first-person pronoun | classify as boolean | all | model decides |
//!
//! Third-person pronouns win when both kinds appear. Any model failure falls
//! back to the neutral row ("fail open").

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::completion::Completer;

/// Pronouns that usually refer to something said in the previous turn.
pub const REFERENTIAL_PRONOUNS: &[&str] = &[
    "he", "she", "his", "her", "him", "hers", "they", "them", "their", "theirs", "it", "its",
    "here", "there", "this", "that", "these", "those",
];

/// Pronouns that point at the user.
pub const SELF_PRONOUNS: &[&str] = &["me", "my", "mine", "myself"];

/// What the resolver decided.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// History to hand to the prompt, most recent first.
    pub history: Vec<String>,
    /// The question to embed and answer.
    pub question: String,
    /// Whether document retrieval should run.
    pub include_documents: bool,
}

impl Resolution {
    fn unchanged(history: &[String], question: &str) -> Self {
        Self {
            history: history.to_vec(),
            question: question.to_string(),
            include_documents: true,
        }
    }
}

/// Lower-cased word set of `text`. A word is a maximal run of alphanumerics
/// or underscores, so `"What's"` yields `"what"` and `"s"`.
pub fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn mentions_any(words: &HashSet<String>, pronouns: &[&str]) -> bool {
    pronouns.iter().any(|p| words.contains(*p))
}

/// Interpret a model's free-form reply as a boolean.
///
/// Only a reply that is exactly `true` after trimming and lower-casing counts
/// as true. `"False"`, `"no"`, `"yes"`, `"True."` and any explanation are all
/// false.
pub fn parse_model_boolean(reply: &str) -> bool {
    reply.trim().to_lowercase() == "true"
}

/// Prompt asking the model to replace pronouns in `question` using `message`.
pub fn rewrite_prompt(message: &str, question: &str) -> String {
    format!(
        "I will give you a message and a question containing pronouns. \
         Rewrite the question by replacing pronouns with the correct entity from the message.\n\n\
         Message: \"{}\"\nQuestion: \"{}\"\nRewritten Question:",
        message, question
    )
}

/// Prompt asking whether `question` is about the user. The model answers
/// `false` for questions about the user, `true` otherwise, so the reply can
/// be used directly as the include-documents flag.
pub fn self_reference_prompt(question: &str) -> String {
    format!(
        "Sentence: {}\nRETURN ONLY BOOLEAN. Determine if the sentence is asking about the user themselves. \
         If the sentence is about the user, return false. Otherwise, return true.",
        question
    )
}

fn clean_rewrite(reply: &str) -> String {
    let trimmed = reply.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

/// Resolve `question` against `history` (most recent first).
///
/// Never fails: completion errors produce the unchanged resolution.
pub async fn resolve(completer: &dyn Completer, question: &str, history: &[String]) -> Resolution {
    let Some(latest) = history.first() else {
        return Resolution::unchanged(history, question);
    };

    let words = word_set(question);

    if mentions_any(&words, REFERENTIAL_PRONOUNS) {
        return match completer.complete(&rewrite_prompt(latest, question)).await {
            Ok(reply) => {
                let rewritten = clean_rewrite(&reply);
                let question = if rewritten.is_empty() {
                    question.to_string()
                } else {
                    rewritten
                };
                debug!(%question, "rewrote referential question");
                Resolution {
                    history: vec![latest.clone()],
                    question,
                    include_documents: true,
                }
            }
            Err(e) => {
                warn!(error = %e, "pronoun rewrite failed; using question as-is");
                Resolution::unchanged(history, question)
            }
        };
    }

    if mentions_any(&words, SELF_PRONOUNS) {
        return match completer.complete(&self_reference_prompt(question)).await {
            Ok(reply) => {
                let include_documents = parse_model_boolean(&reply);
                debug!(reply = %reply.trim(), include_documents, "classified self reference");
                Resolution {
                    history: history.to_vec(),
                    question: question.to_string(),
                    include_documents,
                }
            }
            Err(e) => {
                warn!(error = %e, "self-reference check failed; including documents");
                Resolution::unchanged(history, question)
            }
        };
    }

    Resolution::unchanged(history, question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a fixed string and records every prompt it sees.
    struct Canned {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl Canned {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("timeout".to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Completer for Canned {
        fn model_name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    fn history(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_word_set_splits_on_punctuation() {
        let words = word_set("What's HER name, again?");
        assert!(words.contains("what"));
        assert!(words.contains("s"));
        assert!(words.contains("her"));
        assert!(!words.contains("name,"));
    }

    #[test]
    fn test_parse_model_boolean() {
        assert!(parse_model_boolean("true"));
        assert!(parse_model_boolean("  TRUE\n"));
        assert!(parse_model_boolean("True"));
        assert!(!parse_model_boolean("False"));
        assert!(!parse_model_boolean("no"));
        assert!(!parse_model_boolean("unsure"));
        assert!(!parse_model_boolean("true."));
        assert!(!parse_model_boolean("The answer is true"));
        assert!(!parse_model_boolean(""));
    }

    #[tokio::test]
    async fn test_empty_history_is_unchanged() {
        let model = Canned::ok("should not be called");
        let r = resolve(&model, "What did she say?", &[]).await;
        assert_eq!(r.history, Vec::<String>::new());
        assert_eq!(r.question, "What did she say?");
        assert!(r.include_documents);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_referential_pronoun_rewrites_and_keeps_latest_only() {
        let model = Canned::ok(" \"What did Alice say?\" ");
        let h = history(&["Alice likes hiking", "older turn", "oldest turn"]);
        let r = resolve(&model, "What did she say?", &h).await;
        assert_eq!(r.history, vec!["Alice likes hiking".to_string()]);
        assert_eq!(r.question, "What did Alice say?");
        assert!(!word_set(&r.question).contains("she"));
        assert!(r.include_documents);

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Message: \"Alice likes hiking\""));
        assert!(!prompts[0].contains("older turn"));
    }

    #[tokio::test]
    async fn test_empty_rewrite_keeps_question() {
        let model = Canned::ok("   ");
        let h = history(&["Bob fixed the build"]);
        let r = resolve(&model, "Did it pass?", &h).await;
        assert_eq!(r.question, "Did it pass?");
        assert_eq!(r.history, h);
    }

    #[tokio::test]
    async fn test_self_pronoun_classification_gates_documents() {
        let h = history(&["My name is Sam."]);
        for (reply, expected) in [
            ("true", true),
            ("TRUE", true),
            ("False", false),
            ("false", false),
            ("no", false),
            ("unsure", false),
        ] {
            let model = Canned::ok(reply);
            let r = resolve(&model, "What is my favorite color?", &h).await;
            assert_eq!(r.include_documents, expected, "reply {:?}", reply);
            assert_eq!(r.history, h);
            assert_eq!(r.question, "What is my favorite color?");
        }
    }

    #[tokio::test]
    async fn test_referential_wins_over_self() {
        let model = Canned::ok("Where does my sister Ann live?");
        let h = history(&["My sister Ann moved."]);
        let r = resolve(&model, "Where does she live, my sister?", &h).await;
        assert_eq!(r.history.len(), 1);
        assert!(r.include_documents);
        assert!(model.prompts.lock().unwrap()[0].starts_with("I will give you a message"));
    }

    #[tokio::test]
    async fn test_no_pronoun_skips_model() {
        let model = Canned::ok("false");
        let h = history(&["hello", "hi"]);
        let r = resolve(&model, "What's 2+2?", &h).await;
        assert_eq!(r, Resolution::unchanged(&h, "What's 2+2?"));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_fails_open() {
        let h = history(&["Alice likes hiking", "earlier"]);

        let model = Canned::failing();
        let r = resolve(&model, "What did she say?", &h).await;
        assert_eq!(r, Resolution::unchanged(&h, "What did she say?"));

        let model = Canned::failing();
        let r = resolve(&model, "What's my name?", &h).await;
        assert_eq!(r, Resolution::unchanged(&h, "What's my name?"));
    }
}
