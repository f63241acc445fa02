//! Document analysis pipeline: chunking, retrieval, prompt composition, and orchestration.

pub mod chunking;
pub mod prompt;
mod retrieval;
mod service;
pub mod types;

pub use service::{AnalysisApi, AnalysisService, AnalysisSettings};
pub use types::{
    AnalysisCategory, AnalysisOutcome, DOCUMENT_SEPARATOR, DocumentAnalysisOutcome,
    DocumentPayload, PipelineError, RequestOrigin, RetrievalError, ValidationError, resolve_query,
};
