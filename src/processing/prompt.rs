//! Prompt composition for category-specific analysis and contextual compression.

use super::types::AnalysisCategory;

/// Marker the compression model returns when a chunk holds nothing relevant.
pub(crate) const NO_OUTPUT_MARKER: &str = "NO_OUTPUT";

/// Fixed instruction template for an analysis category.
pub fn instruction_for(category: AnalysisCategory) -> &'static str {
    match category {
        AnalysisCategory::Summary => {
            "Provide a comprehensive summary of the following text, highlighting the main \
             points and key takeaways:"
        }
        AnalysisCategory::Sentiment => {
            "Analyze the sentiment and emotional tone of the following text, providing \
             specific examples:"
        }
        AnalysisCategory::Keywords => {
            "Extract and explain the key concepts and important terms from the following \
             text:"
        }
        AnalysisCategory::EntityRecognition => {
            "Identify and categorize important entities (people, organizations, locations, \
             etc.) from the following text:"
        }
    }
}

/// Compose the final generation prompt from its labeled sections.
///
/// The prompt carries both the compressed context and the complete original text; for
/// large documents this can exceed the provider's context window. The redundancy is a
/// required part of the prompt contract, not an accident of assembly.
pub fn compose_prompt(
    category: AnalysisCategory,
    query: &str,
    context: &str,
    original_text: &str,
) -> String {
    format!(
        "{}\n\nCustom Query: {query}\n\nContext: {context}\n\nOriginal Text: {original_text}",
        instruction_for(category)
    )
}

/// Build the extraction prompt used to compress one retrieved chunk.
///
/// The model is instructed to copy relevant parts verbatim and answer with
/// [`NO_OUTPUT_MARKER`] when the chunk holds nothing relevant, which retrieval uses to
/// drop the chunk.
pub(crate) fn build_extraction_prompt(query: &str, chunk: &str) -> String {
    format!(
        "Given the following question and context, extract any part of the context *AS IS* \
         that is relevant to answer the question. If none of the context is relevant return \
         {NO_OUTPUT_MARKER}.\n\nRemember, *DO NOT* edit the extracted parts of the \
         context.\n\n> Question: {query}\n> Context:\n>>>\n{chunk}\n>>>\nExtracted relevant parts:"
    )
}
