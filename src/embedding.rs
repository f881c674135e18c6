//! Embedding providers.
//!
//! Concrete [`Embedder`] implementations selected by `[embedding] provider`:
//! - **[`DisabledEmbedder`]**: returns errors; used when embeddings are not configured.
//! - **[`OpenAIEmbedder`]**: calls the OpenAI embeddings API with batching, retry, and backoff.
//! - **[`OllamaEmbedder`]**: calls a local Ollama instance's `/api/embed` endpoint.
//!
//! Retry and backoff live in [`crate::http`].
//!
//! ```rust,no_run
//! # use docze::config::EmbeddingConfig;
//! # use docze::embedding::create_embedder;
//! let config = EmbeddingConfig::default(); // provider = "disabled"
//! let embedder = create_embedder(&config).unwrap();
//! assert_eq!(embedder.model_name(), "disabled");
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;

use docze_core::embedding::Embedder;

use crate::config::EmbeddingConfig;
use crate::http;

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

// ============ Disabled Provider ============

/// Always fails. Used when `embedding.provider = "disabled"`.
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        bail!("Embedding provider is disabled")
    }
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI API (`POST /v1/embeddings`).
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAIEmbedder {
    model: String,
    dims: usize,
    api_key: String,
    batch_size: usize,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIEmbedder {
    /// # Errors
    ///
    /// Returns an error if `model` or `dims` is not set in config,
    /// or if `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for OpenAI provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        Ok(Self {
            model,
            dims,
            api_key,
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json = http::post_json(
            &self.client,
            OPENAI_EMBEDDINGS_URL,
            Some(&self.api_key),
            &body,
            self.max_retries,
            "OpenAI",
        )
        .await?;
        check_dims(parse_openai_response(&json)?, self.dims)
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        single(self.request(&[text.to_string()]).await?)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            out.extend(self.request(batch).await?);
        }
        Ok(out)
    }
}

/// Parse the OpenAI embeddings API response JSON.
///
/// Items are ordered by their `index` field when present.
pub fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (pos, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing embedding"))?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(pos);
        indexed.push((index, to_f32(embedding)));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Ollama Provider ============

/// Embedding provider using a local Ollama instance (`POST /api/embed`).
pub struct OllamaEmbedder {
    model: String,
    dims: usize,
    url: String,
    batch_size: usize,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for Ollama provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for Ollama provider"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Ok(Self {
            model,
            dims,
            url: url.trim_end_matches('/').to_string(),
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
            client: http::client(config.timeout_secs)?,
        })
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json = http::post_json(
            &self.client,
            &format!("{}/api/embed", self.url),
            None,
            &body,
            self.max_retries,
            "Ollama",
        )
        .await?;
        check_dims(parse_ollama_response(&json)?, self.dims)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        single(self.request(&[text.to_string()]).await?)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            out.extend(self.request(batch).await?);
        }
        Ok(out)
    }
}

pub fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing embeddings array"))?;

    embeddings
        .iter()
        .map(|embedding| {
            embedding
                .as_array()
                .map(|values| to_f32(values))
                .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: embedding is not an array"))
        })
        .collect()
}

fn to_f32(values: &[serde_json::Value]) -> Vec<f32> {
    values
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect()
}

/// Reject vectors whose length differs from the configured `dims`.
fn check_dims(vectors: Vec<Vec<f32>>, dims: usize) -> Result<Vec<Vec<f32>>> {
    if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
        bail!(
            "Embedding has {} dimensions, expected {} (check embedding.dims)",
            bad.len(),
            dims
        );
    }
    Ok(vectors)
}

fn single(mut vectors: Vec<Vec<f32>>) -> Result<Vec<f32>> {
    if vectors.is_empty() {
        bail!("Empty embedding response");
    }
    Ok(vectors.swap_remove(0))
}

/// Create the [`Embedder`] named by `config.provider`.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledEmbedder`] |
/// | `"openai"` | [`OpenAIEmbedder`] |
/// | `"ollama"` | [`OllamaEmbedder`] |
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledEmbedder)),
        "openai" => Ok(Box::new(OpenAIEmbedder::new(config)?)),
        "ollama" => Ok(Box::new(OllamaEmbedder::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_openai_orders_by_index() {
        let body = json!({
            "data": [
                {"index": 1, "embedding": [0.5, 0.5]},
                {"index": 0, "embedding": [1.0, 0.0]},
            ]
        });
        let vecs = parse_openai_response(&body).unwrap();
        assert_eq!(vecs, vec![vec![1.0, 0.0], vec![0.5, 0.5]]);
    }

    #[test]
    fn test_parse_openai_missing_data() {
        assert!(parse_openai_response(&json!({"error": "bad"})).is_err());
    }

    #[test]
    fn test_parse_ollama() {
        let body = json!({"embeddings": [[0.1, 0.2], [0.3, 0.4]]});
        let vecs = parse_ollama_response(&body).unwrap();
        assert_eq!(vecs.len(), 2);
        assert!((vecs[1][0] - 0.3).abs() < 1e-6);
        assert!(parse_ollama_response(&json!({"embeddings": [1.0]})).is_err());
    }

    #[tokio::test]
    async fn test_disabled_embedder_errors() {
        let embedder = create_embedder(&EmbeddingConfig::default()).unwrap();
        assert_eq!(embedder.model_name(), "disabled");
        assert!(embedder.embed("hello").await.is_err());
        assert!(embedder.embed_batch(&["a".to_string()]).await.is_err());
    }

    #[test]
    fn test_check_dims() {
        assert!(check_dims(vec![vec![1.0, 2.0]], 2).is_ok());
        let err = check_dims(vec![vec![1.0, 2.0], vec![1.0]], 2).unwrap_err();
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn test_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "local".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(create_embedder(&config).is_err());
    }
}
