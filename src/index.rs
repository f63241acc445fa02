//! Ephemeral per-request vector index.
//!
//! The index is a plain in-memory pairing of chunk text with its embedding vector. It is
//! built exactly once per request from that request's chunks, queried during retrieval,
//! and dropped when the request completes. Nothing is cached or shared across requests.

/// A chunk paired with its embedding vector.
#[derive(Debug, Clone)]
struct IndexedChunk {
    text: String,
    vector: Vec<f32>,
}

/// Request-scoped similarity index over embedded chunks.
#[derive(Debug, Default)]
pub struct EphemeralIndex {
    entries: Vec<IndexedChunk>,
}

impl EphemeralIndex {
    /// Build an index by pairing each chunk with its embedding vector.
    ///
    /// Callers are responsible for supplying one vector per chunk, in chunk order.
    pub fn from_pairs(chunks: Vec<String>, vectors: Vec<Vec<f32>>) -> Self {
        debug_assert_eq!(chunks.len(), vectors.len());
        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| IndexedChunk { text, vector })
            .collect();
        Self { entries }
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text of the chunk at `index`, if present.
    pub fn chunk_text(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|entry| entry.text.as_str())
    }

    /// Dimensionality of the indexed vectors, if any chunk is present.
    pub fn vector_dimension(&self) -> Option<usize> {
        self.entries.first().map(|entry| entry.vector.len())
    }

    /// Rank all chunks by cosine similarity to the query vector, best first.
    pub fn top_scored(&self, query: &[f32], limit: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (index, cosine_similarity(query, &entry.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }

    /// Select up to `k` chunks by maximal marginal relevance.
    ///
    /// A candidate pool of the `pool_size` most relevant chunks is drawn first; selection
    /// then iterates, each round picking the candidate maximizing
    /// `lambda * relevance - (1 - lambda) * redundancy`, where redundancy is the highest
    /// similarity to an already-selected chunk. The returned indices follow selection
    /// order, which downstream consumers treat as a relevance signal.
    pub fn max_marginal_relevance(
        &self,
        query: &[f32],
        k: usize,
        pool_size: usize,
        lambda: f32,
    ) -> Vec<usize> {
        let mut remaining = self.top_scored(query, pool_size.max(k));
        let mut selected: Vec<usize> = Vec::with_capacity(k.min(remaining.len()));

        while selected.len() < k && !remaining.is_empty() {
            let mut best_position = 0;
            let mut best_score = f32::NEG_INFINITY;
            for (position, (candidate, relevance)) in remaining.iter().enumerate() {
                let redundancy = selected
                    .iter()
                    .map(|chosen| {
                        cosine_similarity(
                            &self.entries[*candidate].vector,
                            &self.entries[*chosen].vector,
                        )
                    })
                    .fold(0.0_f32, f32::max);
                let score = lambda * relevance - (1.0 - lambda) * redundancy;
                if score > best_score {
                    best_score = score;
                    best_position = position;
                }
            }
            let (chosen, _) = remaining.remove(best_position);
            selected.push(chosen);
        }

        selected
    }
}

/// Cosine similarity between two vectors; zero-norm inputs score 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
