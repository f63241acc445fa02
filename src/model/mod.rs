//! Model provider abstraction and adapters.
//!
//! The pipeline consumes the provider through two narrow traits so that retrieval and
//! orchestration stay independent of any concrete API and unit-testable with fakes. The
//! only shipped adapter talks to the Gemini REST API.

pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider endpoint could not be reached.
    #[error("Embedding provider unreachable: {0}")]
    ProviderUnavailable(String),
    /// Provider rejected the request or returned an error status.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed embedding response: {0}")]
    InvalidResponse(String),
}

/// Errors raised by generation providers.
#[derive(Debug, Error)]
pub enum GenerationClientError {
    /// Provider endpoint could not be reached.
    #[error("Generation provider unreachable: {0}")]
    ProviderUnavailable(String),
    /// Provider rejected the request or returned an error status.
    #[error("Failed to generate text: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Produce an embedding vector for each supplied text, in input order.
    async fn embed_texts(&self, texts: Vec<String>)
    -> Result<Vec<Vec<f32>>, EmbeddingClientError>;
}

/// Interface implemented by text-generation backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce the model's textual output for a fully composed prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationClientError>;
}

/// Build the embedding client configured for this process.
pub fn get_embedder() -> Box<dyn Embedder> {
    Box::new(GeminiClient::from_config())
}

/// Build the generation client configured for this process.
pub fn get_generator() -> Box<dyn Generator> {
    Box::new(GeminiClient::from_config())
}
