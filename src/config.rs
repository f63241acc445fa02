use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the DocLens server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// API key for the Gemini model provider. The single required secret.
    pub gemini_api_key: String,
    /// Optional base-URL override for the Gemini REST API (used by tests and gateways).
    pub gemini_base_url: Option<String>,
    /// Model identifier used for analysis and contextual compression.
    pub generation_model: String,
    /// Model identifier used to embed chunks and queries.
    pub embedding_model: String,
    /// Optional override for the chunk window size, in characters.
    pub chunk_size: Option<usize>,
    /// Optional override for the overlap between consecutive chunks, in characters.
    pub chunk_overlap: Option<usize>,
    /// Optional override for the number of chunks retrieved per request.
    pub retrieval_top_k: Option<usize>,
    /// Optional override for the MMR candidate pool size.
    pub retrieval_candidate_pool: Option<usize>,
    /// Optional override for the MMR relevance/diversity balance.
    pub retrieval_mmr_lambda: Option<f32>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Default generation model when `GENERATION_MODEL` is not set.
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-pro";
/// Default embedding model when `EMBEDDING_MODEL` is not set.
pub const DEFAULT_EMBEDDING_MODEL: &str = "embedding-001";

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            gemini_api_key: load_env("GEMINI_API_KEY")?,
            gemini_base_url: load_env_optional("GEMINI_BASE_URL"),
            generation_model: load_env_optional("GENERATION_MODEL")
                .unwrap_or_else(|| DEFAULT_GENERATION_MODEL.to_string()),
            embedding_model: load_env_optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            chunk_size: parse_optional("CHUNK_SIZE")?,
            chunk_overlap: parse_optional("CHUNK_OVERLAP")?,
            retrieval_top_k: parse_optional("RETRIEVAL_TOP_K")?,
            retrieval_candidate_pool: parse_optional("RETRIEVAL_CANDIDATE_POOL")?,
            retrieval_mmr_lambda: parse_optional("RETRIEVAL_MMR_LAMBDA")?,
            server_port: parse_optional("SERVER_PORT")?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        generation_model = %config.generation_model,
        embedding_model = %config.embedding_model,
        base_url = ?config.gemini_base_url,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
