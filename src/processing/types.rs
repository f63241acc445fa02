//! Core data types, default policies, and error definitions for the analysis pipeline.

use crate::extract::{ExtractError, MediaType};
use crate::model::{EmbeddingClientError, GenerationClientError};
use thiserror::Error;

/// Literal separator placed between documents when a request analyzes several at once.
pub const DOCUMENT_SEPARATOR: &str = "\n\n---Document Separator---\n\n";

/// Analysis categories supported by the prompt composer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisCategory {
    /// Comprehensive summary of the text.
    Summary,
    /// Sentiment and emotional tone analysis.
    Sentiment,
    /// Key concepts and important terms.
    Keywords,
    /// People, organizations, locations, and other entities.
    EntityRecognition,
}

impl AnalysisCategory {
    /// Resolve an optional category name.
    ///
    /// Unknown or absent values fall back to [`AnalysisCategory::Summary`]. This is policy,
    /// not validation; callers never see an error for a misspelled category.
    pub fn resolve(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some("summary") => Self::Summary,
            Some("sentiment") => Self::Sentiment,
            Some("keywords") => Self::Keywords,
            Some("entity-recognition") => Self::EntityRecognition,
            _ => Self::Summary,
        }
    }

    /// Canonical wire name for this category.
    pub fn as_name(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Sentiment => "sentiment",
            Self::Keywords => "keywords",
            Self::EntityRecognition => "entity-recognition",
        }
    }
}

/// Where an analysis request entered the service; selects the default query text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOrigin {
    /// One uploaded document.
    SingleDocument,
    /// Several uploaded documents analyzed jointly.
    MultipleDocuments,
    /// Raw text posted directly.
    RawText,
}

impl RequestOrigin {
    fn default_query(self) -> &'static str {
        match self {
            Self::SingleDocument => "Analyze the document and provide key insights",
            Self::MultipleDocuments => {
                "Comprehensively analyze these documents, highlighting key insights across them"
            }
            Self::RawText => "Analyze this text and provide key insights",
        }
    }
}

/// Resolve an optional user query, substituting the origin-specific generic query.
///
/// Blank queries count as absent. Like the category fallback, this is documented policy
/// applied at the orchestration boundary.
pub fn resolve_query(query: Option<String>, origin: RequestOrigin) -> String {
    query
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| origin.default_query().to_string())
}

/// One uploaded document awaiting extraction.
#[derive(Debug, Clone)]
pub struct DocumentPayload {
    /// Raw bytes of the uploaded file.
    pub content: Vec<u8>,
    /// Declared media type of the payload.
    pub media_type: MediaType,
}

/// Caller-fixable request problems, surfaced as HTTP 400.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// `POST /upload` arrived without a file part.
    #[error("No file uploaded")]
    MissingFile,
    /// `POST /analyze_multiple` arrived without any file parts.
    #[error("No files uploaded")]
    NoFilesUploaded,
    /// `POST /analyze_text` arrived with empty or whitespace-only text.
    #[error("No text provided")]
    EmptyText,
    /// A file part declared a media type outside the accepted set.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    /// The multipart body could not be read.
    #[error("Invalid multipart request: {0}")]
    Multipart(String),
}

/// Errors emitted while selecting and compressing context for a query.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Embedding the query text failed.
    #[error("Failed to embed query: {0}")]
    QueryEmbedding(#[source] EmbeddingClientError),
    /// Embedding provider returned no vector for the query.
    #[error("Embedding provider returned no vector for the query")]
    EmptyQueryEmbedding,
    /// Query embedding dimension does not match the indexed vectors.
    #[error("Query embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the vectors stored in the index.
        expected: usize,
        /// Dimensionality the provider produced for the query.
        actual: usize,
    },
    /// Contextual compression of a selected chunk failed.
    #[error("Failed to compress retrieved context: {0}")]
    Compression(#[source] GenerationClientError),
}

/// Internal failures anywhere in the pipeline, surfaced as HTTP 500.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A document payload failed to decode.
    #[error("Failed to extract document text: {0}")]
    Extraction(#[from] ExtractError),
    /// Chunk embedding failed while building the index.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Retrieval failed to assemble context for the query.
    #[error("Failed to retrieve context: {0}")]
    Retrieval(#[from] RetrievalError),
    /// The final generation call failed.
    #[error("Failed to generate analysis: {0}")]
    Generation(#[from] GenerationClientError),
}

/// Summary of a completed analysis produced by the pipeline.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Model-produced analysis text.
    pub result: String,
    /// Number of chunks indexed for the request.
    pub chunk_count: usize,
    /// Number of compressed chunks that made it into the prompt context.
    pub context_chunks: usize,
}

/// Outcome of a document-based analysis, including the extracted text.
#[derive(Debug, Clone)]
pub struct DocumentAnalysisOutcome {
    /// The underlying analysis outcome.
    pub outcome: AnalysisOutcome,
    /// Combined extracted text (documents joined with [`DOCUMENT_SEPARATOR`]).
    pub extracted_text: String,
    /// Number of documents analyzed.
    pub document_count: usize,
}
