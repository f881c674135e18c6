use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use docze_core::retrieve::RetrievalParams;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub geolocation: GeolocationConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            url: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_completion_retries")]
    pub max_retries: u32,
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            url: None,
            temperature: default_temperature(),
            max_retries: default_completion_retries(),
            timeout_secs: default_completion_timeout(),
        }
    }
}

impl CompletionConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            top_k: default_top_k(),
        }
    }
}

impl RetrievalConfig {
    pub fn params(&self) -> RetrievalParams {
        RetrievalParams {
            history_limit: self.history_limit,
            top_k: self.top_k,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeolocationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_geo_url")]
    pub url: String,
    #[serde(default = "default_geo_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_geo_url(),
            timeout_secs: default_geo_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    #[serde(default = "default_link_base")]
    pub link_base: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Ask the completion model to tidy extracted text before chunking.
    #[serde(default)]
    pub reformat: bool,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            link_base: default_link_base(),
            max_tokens: default_max_tokens(),
            reformat: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_temperature() -> f32 {
    0.2
}
fn default_completion_retries() -> u32 {
    3
}
fn default_completion_timeout() -> u64 {
    60
}
fn default_history_limit() -> i64 {
    50
}
fn default_top_k() -> usize {
    1
}
fn default_true() -> bool {
    true
}
fn default_geo_url() -> String {
    "http://ip-api.com/json/".to_string()
}
fn default_geo_timeout() -> u64 {
    5
}
fn default_assistant_name() -> String {
    docze_core::assemble::DEFAULT_ASSISTANT_NAME.to_string()
}
fn default_link_base() -> String {
    "http://localhost:5000".to_string()
}
fn default_max_tokens() -> usize {
    2000
}
fn default_log_level() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate retrieval
    if config.retrieval.history_limit < 1 {
        anyhow::bail!("retrieval.history_limit must be >= 1");
    }
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    // Validate documents
    if config.documents.max_tokens == 0 {
        anyhow::bail!("documents.max_tokens must be > 0");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    // Validate completion
    match config.completion.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown completion provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }
    if config.completion.is_enabled() && config.completion.model.is_none() {
        anyhow::bail!(
            "completion.model must be specified when provider is '{}'",
            config.completion.provider
        );
    }

    Ok(config)
}
