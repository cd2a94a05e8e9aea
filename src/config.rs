//! TOML configuration.
//!
//! Every section except `[discord]` is optional and falls back to defaults,
//! so the smallest working file is:
//!
//! ```toml
//! [discord]
//! target_channel_id = 1411802805995569162
//! ```
//!
//! Secrets never live in this file: the bot token and API keys are read
//! from the environment (see [`bot_token`] and [`require_env`]).

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use faq_relay_core::chunk::{SplitOptions, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_DELIMITER};
use faq_relay_core::prompt::{PromptComposer, DEFAULT_MAX_CONTEXT_CHARS, DEFAULT_TEMPLATE};
use faq_relay_core::RelayError;

/// Environment variable holding the gateway bot token.
pub const BOT_TOKEN_VAR: &str = "BOT_TOKEN";
/// Older name for the bot token, still accepted.
pub const LEGACY_BOT_TOKEN_VAR: &str = "DISCORD_TOKEN";
/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    pub discord: DiscordConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
            delimiter: default_delimiter(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl CorpusConfig {
    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            delimiter: self.delimiter.clone(),
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("./data.txt")
}
fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}
fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    /// Inline template. Ignored when `template_path` is set.
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub template_path: Option<PathBuf>,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    #[serde(default = "default_reply_title")]
    pub reply_title: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: None,
            template_path: None,
            max_context_chars: default_max_context_chars(),
            reply_title: default_reply_title(),
        }
    }
}

impl PromptConfig {
    /// Resolve the template text: file, then inline, then the built-in one.
    pub fn load_template(&self) -> Result<String> {
        if let Some(path) = &self.template_path {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read prompt template: {}", path.display()));
        }
        Ok(self
            .template
            .clone()
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()))
    }

    pub fn composer(&self) -> Result<PromptComposer> {
        let template = self.load_template()?;
        Ok(PromptComposer::new(&template, self.max_context_chars)?)
    }
}

fn default_max_context_chars() -> usize {
    DEFAULT_MAX_CONTEXT_CHARS
}
fn default_reply_title() -> String {
    "AI — Instant Support".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL of the service; each provider has its own default.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            url: None,
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_generation_provider() -> String {
    "openai".to_string()
}
fn default_generation_model() -> String {
    "gpt-3.5-turbo".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscordConfig {
    pub target_channel_id: u64,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate corpus splitting
    if config.corpus.chunk_size == 0 {
        bail!("corpus.chunk_size must be > 0");
    }
    if config.corpus.chunk_overlap >= config.corpus.chunk_size {
        bail!("corpus.chunk_overlap must be smaller than corpus.chunk_size");
    }
    if config.corpus.delimiter.is_empty() {
        bail!("corpus.delimiter must not be empty");
    }

    // Validate retrieval and prompt
    if config.retrieval.top_k == 0 {
        bail!("retrieval.top_k must be >= 1");
    }
    if config.prompt.max_context_chars == 0 {
        bail!("prompt.max_context_chars must be > 0");
    }
    config
        .prompt
        .composer()
        .with_context(|| "Invalid [prompt] section")?;

    // Validate services
    match config.embedding.provider.as_str() {
        "openai" | "ollama" | "local" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be openai, ollama, or local.",
            other
        ),
    }
    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }
    match config.generation.provider.as_str() {
        "openai" => {}
        other => bail!("Unknown generation provider: '{}'. Must be openai.", other),
    }

    if config.discord.target_channel_id == 0 {
        bail!("discord.target_channel_id must be a non-zero channel ID");
    }

    Ok(())
}

/// Read a required environment variable.
pub fn require_env(name: &str) -> Result<String, RelayError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(RelayError::MissingCredential(name.to_string())),
    }
}

/// Read the gateway bot token, preferring `BOT_TOKEN` over `DISCORD_TOKEN`.
pub fn bot_token() -> Result<String, RelayError> {
    require_env(BOT_TOKEN_VAR)
        .or_else(|_| require_env(LEGACY_BOT_TOKEN_VAR))
        .map_err(|_| RelayError::MissingCredential(BOT_TOKEN_VAR.to_string()))
}
