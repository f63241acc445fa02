//! Format-specific text extraction for uploaded documents.
//!
//! Each supported format decodes a raw byte payload into plain text:
//!
//! - PDF pages are extracted in document order, each followed by a newline. A page that
//!   fails to decode contributes an empty page rather than failing the document.
//! - DOCX paragraphs are concatenated, each followed by a newline, so empty paragraphs
//!   survive as blank lines.
//! - Plain text is decoded as strict UTF-8.
//!
//! Media types are parsed from the request's MIME strings before any decoding happens, so
//! unsupported formats are rejected at the HTTP boundary without touching the pipeline.

use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use thiserror::Error;

/// Errors raised while decoding a document payload.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// PDF payload could not be loaded.
    #[error("Failed to read PDF document: {0}")]
    Pdf(#[from] lopdf::Error),
    /// DOCX payload could not be parsed.
    #[error("Failed to read DOCX document: {0}")]
    Docx(String),
    /// Plain-text payload was not valid UTF-8.
    #[error("Failed to decode text document: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Document formats accepted by the analysis endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaType {
    /// `application/pdf`
    Pdf,
    /// `application/vnd.openxmlformats-officedocument.wordprocessingml.document`
    Docx,
    /// `text/plain`
    Plaintext,
}

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

impl MediaType {
    /// Parse a MIME string into a supported media type.
    ///
    /// Returns `None` for anything outside the accepted set; the HTTP surface turns that
    /// into a client error naming the offending type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Docx),
            "text/plain" => Some(Self::Plaintext),
            _ => None,
        }
    }

    /// Canonical MIME string for this media type.
    pub fn as_mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => DOCX_MIME,
            Self::Plaintext => "text/plain",
        }
    }
}

/// Decode a document payload into plain text according to its media type.
pub fn extract_text(content: &[u8], media_type: MediaType) -> Result<String, ExtractError> {
    match media_type {
        MediaType::Pdf => extract_pdf(content),
        MediaType::Docx => extract_docx(content),
        MediaType::Plaintext => Ok(String::from_utf8(content.to_vec())?),
    }
}

fn extract_pdf(content: &[u8]) -> Result<String, ExtractError> {
    let document = lopdf::Document::load_mem(content)?;
    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(error) => {
                tracing::warn!(page = page_number, error = %error, "Skipping unreadable PDF page");
            }
        }
        text.push('\n');
    }
    Ok(text)
}

fn extract_docx(content: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(content).map_err(|error| ExtractError::Docx(error.to_string()))?;
    let mut text = String::new();
    for child in docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            for paragraph_child in paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in run.children {
                        if let RunChild::Text(fragment) = run_child {
                            text.push_str(&fragment.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}
