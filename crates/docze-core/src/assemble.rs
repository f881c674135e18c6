//! Prompt assembly.
//!
//! [`ContextAssembler`] turns the retrieved pieces into one prompt, always in
//! the same order:
//!
//! 1. Persona preamble
//! 2. Behavioral rules
//! 3. Previous conversations (or a placeholder)
//! 4. Document context (or a placeholder)
//! 5. File names and links
//! 6. Example dialogue
//! 7. System information: timestamp and location
//!
//! Assembly is pure string formatting and cannot fail.

use std::fmt::Write as _;

use chrono::{DateTime, Local};

use crate::geo::LocationInfo;
use crate::models::DocumentRef;

/// Shown when there is no conversation history.
pub const NO_HISTORY: &str = "No recent conversation history.";

/// Shown when there is no document text.
pub const NO_DOCUMENT_CONTEXT: &str = "No additional document context available.";

/// Shown when the user has no uploaded files (or documents were skipped).
pub const NO_FILES: &str = "No uploaded documents.";

/// Shown when the location lookup failed.
pub const NO_SYSTEM_INFO: &str = "- No additional system info available.";

/// Default persona name.
pub const DEFAULT_ASSISTANT_NAME: &str = "Meta~x";

const RULES: &[&str] = &[
    "Generate replies based on previous conversations if relevant.",
    "If the query is new, provide the best answer based on available knowledge.",
    "Maintain a professional, helpful, and friendly tone.",
    "If responding with document-based data, cite relevant information.",
    "Give first priority to chat history, second priority to document knowledge.",
    "If the query is about an uploaded document (words such as pdf, doc, file), reply from the uploaded information.",
    "If the user introduces themselves with a name, remember it. If the user asks to be called by a different name, update your reference accordingly.",
    "If the user asks for personal details such as name, skills or contact, take them only from previous conversations, never from uploaded documents.",
    "Use emojis in each sentence.",
    "If the query is fully based on an uploaded document, include that document's name at the end of the reply.",
];

const EXAMPLE_CHAT: &str = r#"User: "Can you summarize this document?"
AI: "Sure! Based on the document, here's a summary: [Insert Example Summary]."

User: "What was our last conversation about?"
AI: "Last time, we discussed [Summarized Past Chat]. Would you like me to expand on that?"

User: "Tell me the latest updates from the document I uploaded."
AI: "Certainly! The latest key points are: [Insert Relevant Info]."

User: "Do you know Rajinikanth?"
AI: "Hello! It's wonderful to see you again. Yes, I know about Rajinikanth. He is an iconic Indian film actor, predominantly known for his work in Tamil cinema."

User: "Where is he located?"
AI: "He is located in Chennai.""#;

/// Builds the final context prompt.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    assistant_name: String,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_ASSISTANT_NAME)
    }
}

impl ContextAssembler {
    pub fn new(assistant_name: impl Into<String>) -> Self {
        Self {
            assistant_name: assistant_name.into(),
        }
    }

    /// Assemble a prompt stamped with the current local time.
    pub fn assemble(
        &self,
        history: &[String],
        document_text: &str,
        location: &LocationInfo,
        documents: &[DocumentRef],
    ) -> String {
        self.assemble_at(history, document_text, location, documents, Local::now())
    }

    /// Assemble a prompt stamped with `now`.
    ///
    /// `history` is rendered in the order given (most recent first).
    pub fn assemble_at(
        &self,
        history: &[String],
        document_text: &str,
        location: &LocationInfo,
        documents: &[DocumentRef],
        now: DateTime<Local>,
    ) -> String {
        let mut out = String::new();

        out.push_str("Follow the given instructions and generate a reply.\n\n");

        out.push_str("## About You\n");
        let _ = writeln!(
            out,
            "You are an AI assistant named {}. You are an expert document reviewer.\n",
            self.assistant_name
        );

        out.push_str("## Instructions\n");
        for rule in RULES {
            let _ = writeln!(out, "- {}", rule);
        }
        out.push('\n');

        out.push_str("## Previous Conversations (1st Priority)\n");
        if history.is_empty() {
            let _ = writeln!(out, "{}", NO_HISTORY);
        } else {
            for turn in history {
                let _ = writeln!(out, "- {}", turn);
            }
        }
        out.push('\n');

        out.push_str("## Uploaded Document Information (Relevant Documents) (2nd Priority)\n");
        if document_text.trim().is_empty() {
            let _ = writeln!(out, "{}", NO_DOCUMENT_CONTEXT);
        } else {
            let _ = writeln!(out, "{}", document_text.trim_end());
        }
        out.push('\n');

        out.push_str("## File Names (document metadata with reference link)\n");
        if documents.is_empty() {
            let _ = writeln!(out, "{}", NO_FILES);
        } else {
            for doc in documents {
                let _ = writeln!(out, "- {}: {}", doc.name, doc.link);
            }
        }
        out.push('\n');

        out.push_str("## Example Chat (Use this as a model for your responses)\n");
        out.push_str(EXAMPLE_CHAT);
        out.push_str("\n\n");

        out.push_str("## System Information\n");
        let _ = writeln!(out, "- Current Time: {}", now.format("%Y-%m-%d %H:%M:%S"));
        out.push_str("- Current location information\n");
        match location {
            LocationInfo::Known(fields) if !fields.is_empty() => {
                for (label, value) in fields {
                    let _ = writeln!(out, "  - {}: {}", label, value);
                }
            }
            _ => {
                let _ = writeln!(out, "{}", NO_SYSTEM_INFO);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn position(prompt: &str, needle: &str) -> usize {
        prompt
            .find(needle)
            .unwrap_or_else(|| panic!("missing {:?}", needle))
    }

    #[test]
    fn test_empty_inputs_use_placeholders() {
        let prompt = ContextAssembler::default().assemble(
            &[],
            "",
            &LocationInfo::Unavailable("offline".into()),
            &[],
        );
        assert!(prompt.contains(NO_HISTORY));
        assert!(prompt.contains(NO_DOCUMENT_CONTEXT));
        assert!(prompt.contains(NO_FILES));
        assert!(prompt.contains(NO_SYSTEM_INFO));
        assert!(prompt.contains("named Meta~x"));
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let prompt = ContextAssembler::new("Docze").assemble_at(
            &["Alice likes hiking".to_string()],
            "Resume of Alice",
            &LocationInfo::Known(vec![("City".into(), "Chennai".into())]),
            &[DocumentRef {
                name: "alice.pdf".into(),
                link: "http://localhost:5000/preview/1/alice.pdf".into(),
            }],
            fixed_now(),
        );

        let order = [
            "## About You",
            "## Instructions",
            "## Previous Conversations",
            "- Alice likes hiking",
            "## Uploaded Document Information",
            "Resume of Alice",
            "## File Names",
            "- alice.pdf: http://localhost:5000/preview/1/alice.pdf",
            "## Example Chat",
            "## System Information",
            "- Current Time: 2024-03-09 14:05:07",
            "  - City: Chennai",
        ];
        let positions: Vec<usize> = order.iter().map(|n| position(&prompt, n)).collect();
        for pair in positions.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(!prompt.contains(NO_HISTORY));
        assert!(!prompt.contains(NO_SYSTEM_INFO));
    }

    #[test]
    fn test_history_keeps_given_order() {
        let history = vec!["newest".to_string(), "older".to_string()];
        let prompt = ContextAssembler::default().assemble_at(
            &history,
            "",
            &LocationInfo::Known(vec![]),
            &[],
            fixed_now(),
        );
        assert!(position(&prompt, "- newest") < position(&prompt, "- older"));
        assert!(prompt.contains(NO_SYSTEM_INFO));
    }

    #[test]
    fn test_whitespace_document_text_is_placeholder() {
        let prompt = ContextAssembler::default().assemble_at(
            &[],
            "  \n ",
            &LocationInfo::Unavailable(String::new()),
            &[],
            fixed_now(),
        );
        assert!(prompt.contains(NO_DOCUMENT_CONTEXT));
    }
}
