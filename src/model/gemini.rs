//! Gemini REST API adapter for embeddings and generation.
//!
//! Both capabilities are served by the same Generative Language endpoint family:
//! `models/{model}:batchEmbedContents` for embedding batches and
//! `models/{model}:generateContent` for prompt completion. The adapter issues plain
//! `reqwest` calls and never retries; a failed call fails the request that triggered it.

use super::{Embedder, EmbeddingClientError, Generator, GenerationClientError};
use crate::config::get_config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// HTTP client for the Gemini embedding and generation endpoints.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    generation_model: String,
}

impl GeminiClient {
    /// Construct a client against an explicit base URL and model pair.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        embedding_model: impl Into<String>,
        generation_model: impl Into<String>,
    ) -> Self {
        let http = Client::builder()
            .user_agent("doclens/0.1")
            .build()
            .expect("Failed to construct reqwest::Client for Gemini");
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            embedding_model: embedding_model.into(),
            generation_model: generation_model.into(),
        }
    }

    /// Construct a client from the process configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        let base_url = config
            .gemini_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(
            base_url,
            config.gemini_api_key.clone(),
            config.embedding_model.clone(),
            config.generation_model.clone(),
        )
    }

    fn embed_endpoint(&self) -> String {
        format!(
            "{}/models/{}:batchEmbedContents",
            self.base_url.trim_end_matches('/'),
            self.embedding_model
        )
    }

    fn generate_endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.generation_model
        )
    }
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed_texts(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        let expected = texts.len();
        let requests: Vec<_> = texts
            .into_iter()
            .map(|text| {
                json!({
                    "model": format!("models/{}", self.embedding_model),
                    "content": { "parts": [{ "text": text }] }
                })
            })
            .collect();

        tracing::debug!(model = %self.embedding_model, batch = expected, "Embedding batch");

        let response = self
            .http
            .post(self.embed_endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "requests": requests }))
            .send()
            .await
            .map_err(|error| {
                EmbeddingClientError::ProviderUnavailable(format!(
                    "failed to reach embedding endpoint at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "embedding endpoint returned {status}: {body}"
            )));
        }

        let body: BatchEmbedResponse = response.json().await.map_err(|error| {
            EmbeddingClientError::InvalidResponse(format!(
                "failed to decode embedding response: {error}"
            ))
        })?;

        if body.embeddings.len() != expected {
            return Err(EmbeddingClientError::InvalidResponse(format!(
                "expected {expected} embeddings, got {}",
                body.embeddings.len()
            )));
        }

        Ok(body
            .embeddings
            .into_iter()
            .map(|embedding| embedding.values)
            .collect())
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationClientError> {
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        tracing::debug!(model = %self.generation_model, prompt_chars = prompt.len(), "Generating");

        let response = self
            .http
            .post(self.generate_endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                GenerationClientError::ProviderUnavailable(format!(
                    "failed to reach generation endpoint at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationClientError::GenerationFailed(format!(
                "generation endpoint returned {status}: {body}"
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            GenerationClientError::InvalidResponse(format!(
                "failed to decode generation response: {error}"
            ))
        })?;

        let candidate = body.candidates.into_iter().next().ok_or_else(|| {
            GenerationClientError::InvalidResponse("response contained no candidates".into())
        })?;

        let mut text = String::new();
        for part in candidate.content.parts {
            text.push_str(&part.text);
        }
        Ok(text.trim().to_string())
    }
}
