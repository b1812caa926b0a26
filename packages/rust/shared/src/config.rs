//! Application configuration for DocAnswer.
//!
//! User config lives at `~/.docanswer/docanswer.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocAnswerError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docanswer.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docanswer";

// ---------------------------------------------------------------------------
// Config structs (matching docanswer.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target documentation site.
    #[serde(default)]
    pub site: SiteConfig,

    /// Candidate retrieval and ranking.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Resilient fetching.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Content extraction.
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Cache TTLs.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Language-model collaborator.
    #[serde(default)]
    pub llm: LlmSettings,
}

/// `[site]` section — the single documentation site questions are answered from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Help-center root, scheme + host, no trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Help-center locale segment (e.g. `pt-br`).
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Product name injected into under-specified configuration/error queries.
    #[serde(default = "default_product_keyword")]
    pub product_keyword: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            locale: default_locale(),
            product_keyword: default_product_keyword(),
        }
    }
}

fn default_base_url() -> String {
    "https://centraldeatendimento.totvs.com".into()
}
fn default_locale() -> String {
    "pt-br".into()
}
fn default_product_keyword() -> String {
    "Protheus".into()
}

impl SiteConfig {
    /// Host portion of `base_url` (used to domain-restrict web search).
    pub fn domain(&self) -> Result<String> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| DocAnswerError::config(format!("invalid site.base_url: {e}")))?;
        url.host_str()
            .map(str::to_string)
            .ok_or_else(|| DocAnswerError::config("site.base_url has no host"))
    }
}

/// `[retrieval]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum distinct candidate documents per query.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Candidates whose text enters the grounding context.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Below this best-candidate score the answer carries a weak-match caveat.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            top_k: default_top_k(),
            min_score: default_min_score(),
        }
    }
}

fn default_max_candidates() -> usize {
    5
}
fn default_top_k() -> usize {
    3
}
fn default_min_score() -> f64 {
    0.5
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per fetch strategy before moving to the next one.
    #[serde(default = "default_retries")]
    pub retries_per_strategy: u32,

    /// Base backoff delay in milliseconds (doubled per attempt).
    #[serde(default = "default_backoff_ms")]
    pub backoff_base_ms: u64,

    /// Concurrent candidate fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries_per_strategy: default_retries(),
            backoff_base_ms: default_backoff_ms(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}
fn default_retries() -> u32 {
    2
}
fn default_backoff_ms() -> u64 {
    500
}
fn default_concurrency() -> usize {
    3
}

/// `[extract]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Upper bound on extracted text, in characters.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

fn default_max_chars() -> usize {
    6_000
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for search results, successful fetches, and rerank orders.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Shorter TTL for Blocked/TransientError fetch results, so an unblocked
    /// upstream is retried sooner.
    #[serde(default = "default_blocked_ttl_secs")]
    pub blocked_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            blocked_ttl_secs: default_blocked_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    3_600
}
fn default_blocked_ttl_secs() -> u64 {
    300
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider id: `gemini`, `openai`, or `mock`.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier passed to the provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sampling temperature for answer synthesis.
    #[serde(default)]
    pub temperature: f32,

    /// Completion token cap for answer synthesis.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Whether to ask the model to reorder candidates before synthesis.
    #[serde(default = "default_true")]
    pub rerank: bool,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            rerank: default_true(),
        }
    }
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_max_tokens() -> u32 {
    512
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docanswer/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocAnswerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docanswer/docanswer.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocAnswerError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DocAnswerError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocAnswerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocAnswerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocAnswerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the configured API key env var is set and non-empty.
/// The mock provider needs no key.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    if config.llm.provider == "mock" {
        return Ok(());
    }
    let var_name = &config.llm.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(DocAnswerError::config(format!(
            "API key not found. Set the {var_name} environment variable for the {} provider.",
            config.llm.provider
        ))),
    }
}
