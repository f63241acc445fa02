//! Context retrieval: MMR candidate selection plus contextual compression.

use crate::index::EphemeralIndex;
use crate::model::{Embedder, Generator};
use crate::processing::prompt::{NO_OUTPUT_MARKER, build_extraction_prompt};
use crate::processing::types::RetrievalError;

/// Select and compress the chunks most relevant to `query`.
///
/// The query is embedded once, a relevance-ranked candidate pool of `candidate_pool`
/// chunks is drawn, and up to `top_k` chunks are picked by maximal marginal relevance.
/// Each pick is then compressed through the generator with an extraction instruction;
/// picks whose compression comes back empty (or as the no-output marker) are dropped.
/// The returned excerpts follow MMR selection order, not document order.
pub(crate) async fn retrieve_context(
    index: &EphemeralIndex,
    embedder: &dyn Embedder,
    generator: &dyn Generator,
    query: &str,
    top_k: usize,
    candidate_pool: usize,
    mmr_lambda: f32,
) -> Result<Vec<String>, RetrievalError> {
    if index.is_empty() {
        return Ok(Vec::new());
    }

    let mut vectors = embedder
        .embed_texts(vec![query.to_string()])
        .await
        .map_err(RetrievalError::QueryEmbedding)?;
    let query_vector = vectors.pop().ok_or(RetrievalError::EmptyQueryEmbedding)?;

    if let Some(expected) = index.vector_dimension() {
        if query_vector.len() != expected {
            return Err(RetrievalError::DimensionMismatch {
                expected,
                actual: query_vector.len(),
            });
        }
    }

    let selected = index.max_marginal_relevance(&query_vector, top_k, candidate_pool, mmr_lambda);
    tracing::debug!(
        selected = selected.len(),
        indexed = index.len(),
        "Selected chunks via MMR"
    );

    let mut compressed = Vec::with_capacity(selected.len());
    for chunk_index in selected {
        let Some(chunk) = index.chunk_text(chunk_index) else {
            continue;
        };
        let extraction = generator
            .generate(&build_extraction_prompt(query, chunk))
            .await
            .map_err(RetrievalError::Compression)?;
        let excerpt = extraction.trim();
        if excerpt.is_empty() || excerpt == NO_OUTPUT_MARKER {
            tracing::debug!(chunk = chunk_index, "Dropping chunk with no relevant content");
            continue;
        }
        compressed.push(excerpt.to_string());
    }

    Ok(compressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EmbeddingClientError, GenerationClientError};
    use async_trait::async_trait;

    struct FixedEmbedder {
        vector: Vec<f32>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed_texts(
            &self,
            texts: Vec<String>,
        ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
            Ok(texts.iter().map(|_| self.vector.clone()).collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed_texts(
            &self,
            _texts: Vec<String>,
        ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
            Err(EmbeddingClientError::GenerationFailed("down".into()))
        }
    }

    /// Echoes the chunk back, or drops it when the chunk contains the given needle.
    struct EchoCompressor {
        drop_needle: Option<&'static str>,
    }

    #[async_trait]
    impl Generator for EchoCompressor {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationClientError> {
            let chunk = prompt
                .split(">>>\n")
                .nth(1)
                .and_then(|rest| rest.split("\n>>>").next())
                .unwrap_or_default();
            if let Some(needle) = self.drop_needle {
                if chunk.contains(needle) {
                    return Ok(NO_OUTPUT_MARKER.to_string());
                }
            }
            Ok(chunk.to_string())
        }
    }

    fn two_chunk_index() -> EphemeralIndex {
        EphemeralIndex::from_pairs(
            vec!["The sky is blue.".into(), "The grass is green.".into()],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
    }

    #[tokio::test]
    async fn retrieves_compressed_chunks_in_selection_order() {
        let index = two_chunk_index();
        let embedder = FixedEmbedder {
            vector: vec![0.9, 0.1],
        };
        let compressor = EchoCompressor { drop_needle: None };

        let context = retrieve_context(&index, &embedder, &compressor, "sky?", 5, 20, 0.5)
            .await
            .expect("retrieval");

        assert_eq!(context.len(), 2);
        assert_eq!(context[0], "The sky is blue.");
    }

    #[tokio::test]
    async fn drops_chunks_compressed_to_nothing() {
        let index = two_chunk_index();
        let embedder = FixedEmbedder {
            vector: vec![0.9, 0.1],
        };
        let compressor = EchoCompressor {
            drop_needle: Some("grass"),
        };

        let context = retrieve_context(&index, &embedder, &compressor, "sky?", 5, 20, 0.5)
            .await
            .expect("retrieval");

        assert_eq!(context, vec!["The sky is blue.".to_string()]);
    }

    #[tokio::test]
    async fn never_returns_more_than_top_k() {
        let index = two_chunk_index();
        let embedder = FixedEmbedder {
            vector: vec![0.9, 0.1],
        };
        let compressor = EchoCompressor { drop_needle: None };

        let context = retrieve_context(&index, &embedder, &compressor, "sky?", 1, 20, 0.5)
            .await
            .expect("retrieval");

        assert_eq!(context.len(), 1);
    }

    #[tokio::test]
    async fn empty_index_short_circuits_without_model_calls() {
        let index = EphemeralIndex::default();
        let compressor = EchoCompressor { drop_needle: None };

        let context = retrieve_context(&index, &FailingEmbedder, &compressor, "sky?", 5, 20, 0.5)
            .await
            .expect("no model call should happen");

        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn embedding_failure_becomes_retrieval_error() {
        let index = two_chunk_index();
        let compressor = EchoCompressor { drop_needle: None };

        let error = retrieve_context(&index, &FailingEmbedder, &compressor, "sky?", 5, 20, 0.5)
            .await
            .expect_err("embedding failure");

        assert!(matches!(error, RetrievalError::QueryEmbedding(_)));
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let index = two_chunk_index();
        let embedder = FixedEmbedder {
            vector: vec![0.9, 0.1, 0.3],
        };
        let compressor = EchoCompressor { drop_needle: None };

        let error = retrieve_context(&index, &embedder, &compressor, "sky?", 5, 20, 0.5)
            .await
            .expect_err("dimension mismatch");

        assert!(matches!(
            error,
            RetrievalError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }
}
