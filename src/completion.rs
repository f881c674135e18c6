//! Completion providers.
//!
//! Concrete [`Completer`] implementations selected by `[completion] provider`:
//! - **[`DisabledCompleter`]**: returns errors. The engine fails open, so
//!   retrieval still works; only `ask` needs a real model.
//! - **[`OpenAICompleter`]**: `POST /v1/chat/completions`.
//! - **[`OllamaCompleter`]**: `POST /api/chat` with `stream = false`.
//!
//! Every prompt is sent as a single user message.

use anyhow::{bail, Result};
use async_trait::async_trait;

use docze_core::completion::Completer;

use crate::config::CompletionConfig;
use crate::http;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Always fails. Used when `completion.provider = "disabled"`.
pub struct DisabledCompleter;

#[async_trait]
impl Completer for DisabledCompleter {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("Completion provider is disabled")
    }
}

/// Chat completions via the OpenAI API. Requires `OPENAI_API_KEY`.
pub struct OpenAICompleter {
    model: String,
    temperature: f32,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAICompleter {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("completion.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        Ok(Self {
            model,
            temperature: config.temperature,
            api_key,
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl Completer for OpenAICompleter {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });
        let json = http::post_json(
            &self.client,
            OPENAI_CHAT_URL,
            Some(&self.api_key),
            &body,
            self.max_retries,
            "OpenAI",
        )
        .await?;
        parse_openai_response(&json)
    }
}

/// Extract `choices[0].message.content`.
pub fn parse_openai_response(json: &serde_json::Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
}

/// Chat completions via a local Ollama instance.
pub struct OllamaCompleter {
    model: String,
    temperature: f32,
    url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaCompleter {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("completion.model required for Ollama provider"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Ok(Self {
            model,
            temperature: config.temperature,
            url: url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl Completer for OllamaCompleter {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "stream": false,
            "options": {"temperature": self.temperature},
            "messages": [{"role": "user", "content": prompt}],
        });
        let json = http::post_json(
            &self.client,
            &format!("{}/api/chat", self.url),
            None,
            &body,
            self.max_retries,
            "Ollama",
        )
        .await?;
        parse_ollama_response(&json)
    }
}

/// Extract `message.content`.
pub fn parse_ollama_response(json: &serde_json::Value) -> Result<String> {
    json.pointer("/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing message.content"))
}

/// Create the [`Completer`] named by `config.provider`.
pub fn create_completer(config: &CompletionConfig) -> Result<Box<dyn Completer>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledCompleter)),
        "openai" => Ok(Box::new(OpenAICompleter::new(config)?)),
        "ollama" => Ok(Box::new(OllamaCompleter::new(config)?)),
        other => bail!("Unknown completion provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_openai_response() {
        let body = json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "true"}}]
        });
        assert_eq!(parse_openai_response(&body).unwrap(), "true");
        assert!(parse_openai_response(&json!({"choices": []})).is_err());
    }

    #[test]
    fn test_parse_ollama_response() {
        let body = json!({"model": "llama3", "message": {"role": "assistant", "content": "Hi"}, "done": true});
        assert_eq!(parse_ollama_response(&body).unwrap(), "Hi");
        assert!(parse_ollama_response(&json!({"done": true})).is_err());
    }

    #[tokio::test]
    async fn test_disabled_completer_errors() {
        let completer = create_completer(&CompletionConfig::default()).unwrap();
        assert_eq!(completer.model_name(), "disabled");
        assert!(completer.complete("hello").await.is_err());
    }

    #[test]
    fn test_ollama_url_trailing_slash() {
        let config = CompletionConfig {
            provider: "ollama".to_string(),
            model: Some("llama3".to_string()),
            url: Some("http://gpu-box:11434/".to_string()),
            ..CompletionConfig::default()
        };
        let completer = OllamaCompleter::new(&config).unwrap();
        assert_eq!(completer.url, "http://gpu-box:11434");
    }
}
