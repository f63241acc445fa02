use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing analysis activity.
#[derive(Default)]
pub struct AnalysisMetrics {
    requests_completed: AtomicU64,
    documents_analyzed: AtomicU64,
    chunks_indexed: AtomicU64,
}

impl AnalysisMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed analysis, the documents it covered, and the chunks it indexed.
    pub fn record_analysis(&self, document_count: u64, chunk_count: u64) {
        self.requests_completed.fetch_add(1, Ordering::Relaxed);
        self.documents_analyzed
            .fetch_add(document_count, Ordering::Relaxed);
        self.chunks_indexed.fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_completed: self.requests_completed.load(Ordering::Relaxed),
            documents_analyzed: self.documents_analyzed.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of analysis counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of analysis requests completed since startup.
    pub requests_completed: u64,
    /// Number of documents analyzed since startup (raw-text requests count as one).
    pub documents_analyzed: u64,
    /// Total chunk count indexed across all completed requests.
    pub chunks_indexed: u64,
}
