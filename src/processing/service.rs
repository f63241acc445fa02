//! Analysis service coordinating extraction, chunking, indexing, retrieval, and generation.

use crate::{
    config::get_config,
    extract::extract_text,
    index::EphemeralIndex,
    metrics::{AnalysisMetrics, MetricsSnapshot},
    model::{Embedder, Generator, get_embedder, get_generator},
    processing::{
        chunking::{self, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE},
        prompt, retrieval,
        types::{
            AnalysisCategory, AnalysisOutcome, DOCUMENT_SEPARATOR, DocumentAnalysisOutcome,
            DocumentPayload, PipelineError, RequestOrigin, resolve_query,
        },
    },
};
use async_trait::async_trait;
use std::sync::Arc;

/// Resolved pipeline knobs applied to every request handled by a service instance.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisSettings {
    /// Chunk window size, in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, in characters.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per request.
    pub top_k: usize,
    /// Size of the MMR candidate pool.
    pub candidate_pool: usize,
    /// MMR relevance/diversity balance.
    pub mmr_lambda: f32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: 5,
            candidate_pool: 20,
            mmr_lambda: 0.5,
        }
    }
}

impl AnalysisSettings {
    /// Overlay configuration overrides onto the defaults.
    pub fn from_config() -> Self {
        let config = get_config();
        let defaults = Self::default();
        Self {
            chunk_size: config.chunk_size.unwrap_or(defaults.chunk_size),
            chunk_overlap: config.chunk_overlap.unwrap_or(defaults.chunk_overlap),
            top_k: config.retrieval_top_k.unwrap_or(defaults.top_k),
            candidate_pool: config
                .retrieval_candidate_pool
                .unwrap_or(defaults.candidate_pool),
            mmr_lambda: config.retrieval_mmr_lambda.unwrap_or(defaults.mmr_lambda),
        }
    }
}

/// Coordinates the full analysis pipeline: extraction, chunking, ephemeral indexing,
/// retrieval with contextual compression, prompt composition, and generation.
///
/// The service owns long-lived handles to the model clients and the metrics registry;
/// everything request-scoped (chunks, index, context) lives and dies inside one call.
/// Construct the service once near process start and share it through an `Arc`.
pub struct AnalysisService {
    embedder: Box<dyn Embedder>,
    generator: Box<dyn Generator>,
    metrics: Arc<AnalysisMetrics>,
    settings: AnalysisSettings,
}

/// Abstraction over the analysis pipeline used by the HTTP surface.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Analyze raw text with an optional query and category.
    async fn analyze_text(
        &self,
        text: String,
        query: Option<String>,
        category: Option<String>,
    ) -> Result<AnalysisOutcome, PipelineError>;

    /// Extract, combine, and analyze one or more uploaded documents.
    async fn analyze_documents(
        &self,
        documents: Vec<DocumentPayload>,
        query: Option<String>,
        category: Option<String>,
    ) -> Result<DocumentAnalysisOutcome, PipelineError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl AnalysisService {
    /// Build a service from process configuration.
    pub fn new() -> Self {
        tracing::info!("Initializing model clients");
        Self::with_clients(get_embedder(), get_generator(), AnalysisSettings::from_config())
    }

    /// Build a service from explicit clients and settings.
    pub fn with_clients(
        embedder: Box<dyn Embedder>,
        generator: Box<dyn Generator>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            embedder,
            generator,
            metrics: Arc::new(AnalysisMetrics::new()),
            settings,
        }
    }

    /// Analyze raw text posted directly to the service.
    pub async fn analyze_text(
        &self,
        text: String,
        query: Option<String>,
        category: Option<String>,
    ) -> Result<AnalysisOutcome, PipelineError> {
        let query = resolve_query(query, RequestOrigin::RawText);
        let category = AnalysisCategory::resolve(category.as_deref());
        let outcome = self.run_pipeline(&text, &query, category).await?;
        self.metrics.record_analysis(1, outcome.chunk_count as u64);
        Ok(outcome)
    }

    /// Extract, combine, and analyze uploaded documents as one corpus.
    ///
    /// Multiple documents are joined with [`DOCUMENT_SEPARATOR`] before chunking, so
    /// retrieval and generation see cross-document context jointly rather than analyzing
    /// each file in isolation.
    pub async fn analyze_documents(
        &self,
        documents: Vec<DocumentPayload>,
        query: Option<String>,
        category: Option<String>,
    ) -> Result<DocumentAnalysisOutcome, PipelineError> {
        let document_count = documents.len();
        let origin = if document_count > 1 {
            RequestOrigin::MultipleDocuments
        } else {
            RequestOrigin::SingleDocument
        };

        let mut texts = Vec::with_capacity(document_count);
        for document in documents {
            texts.push(extract_text(&document.content, document.media_type)?);
        }
        let combined_text = texts.join(DOCUMENT_SEPARATOR);

        let query = resolve_query(query, origin);
        let category = AnalysisCategory::resolve(category.as_deref());
        let outcome = self.run_pipeline(&combined_text, &query, category).await?;
        self.metrics
            .record_analysis(document_count as u64, outcome.chunk_count as u64);

        Ok(DocumentAnalysisOutcome {
            outcome,
            extracted_text: combined_text,
            document_count,
        })
    }

    /// Run the retrieval-augmented pipeline over already-resolved inputs.
    async fn run_pipeline(
        &self,
        text: &str,
        query: &str,
        category: AnalysisCategory,
    ) -> Result<AnalysisOutcome, PipelineError> {
        let settings = self.settings;
        let chunks = chunking::split_text(text, settings.chunk_size, settings.chunk_overlap);
        tracing::debug!(
            chunks = chunks.len(),
            chunk_size = settings.chunk_size,
            overlap = settings.chunk_overlap,
            "Chunked input"
        );

        let index = self.build_index(chunks).await?;
        let retrieved = retrieval::retrieve_context(
            &index,
            self.embedder.as_ref(),
            self.generator.as_ref(),
            query,
            settings.top_k,
            settings.candidate_pool,
            settings.mmr_lambda,
        )
        .await?;
        let context = retrieved.join("\n\n");

        let prompt = prompt::compose_prompt(category, query, &context, text);
        let result = self
            .generator
            .generate(&prompt)
            .await
            .map_err(PipelineError::Generation)?;

        tracing::info!(
            category = category.as_name(),
            chunks = index.len(),
            context_chunks = retrieved.len(),
            "Analysis completed"
        );

        Ok(AnalysisOutcome {
            result,
            chunk_count: index.len(),
            context_chunks: retrieved.len(),
        })
    }

    /// Embed this request's chunks and pair them into an ephemeral index.
    ///
    /// The index is scoped to the current request and dropped with it; there is no
    /// cross-request caching.
    async fn build_index(&self, chunks: Vec<String>) -> Result<EphemeralIndex, PipelineError> {
        if chunks.is_empty() {
            return Ok(EphemeralIndex::default());
        }
        let vectors = self.embedder.embed_texts(chunks.clone()).await?;
        Ok(EphemeralIndex::from_pairs(chunks, vectors))
    }

    /// Return the current analysis metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl AnalysisApi for AnalysisService {
    async fn analyze_text(
        &self,
        text: String,
        query: Option<String>,
        category: Option<String>,
    ) -> Result<AnalysisOutcome, PipelineError> {
        AnalysisService::analyze_text(self, text, query, category).await
    }

    async fn analyze_documents(
        &self,
        documents: Vec<DocumentPayload>,
        query: Option<String>,
        category: Option<String>,
    ) -> Result<DocumentAnalysisOutcome, PipelineError> {
        AnalysisService::analyze_documents(self, documents, query, category).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        AnalysisService::metrics_snapshot(self)
    }
}
