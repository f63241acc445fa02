#![deny(missing_docs)]

//! Core library for the DocLens document analysis server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Format-specific document text extraction.
pub mod extract;
/// Ephemeral per-request vector index.
pub mod index;
/// Structured logging and tracing setup.
pub mod logging;
/// Analysis metrics helpers.
pub mod metrics;
/// Model provider clients for embeddings and generation.
pub mod model;
/// Document analysis pipeline utilities.
pub mod processing;
