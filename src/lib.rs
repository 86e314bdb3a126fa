//! Bilingual glossary extraction from two-column PDF textbooks using lopdf
//!
//! This crate provides:
//! - Styled span extraction (text, font, weight, size, position) per page
//! - Column bisection and line grouping
//! - Font-based classification of spans into languages, chapter headings
//!   and page furniture
//! - A chapter-grouped vocabulary document serialized as JSON
//! - The interactive front end used by the preset binaries

pub mod classify;
pub mod cli;
pub mod extractor;
pub mod glossary;
pub mod layout;
pub mod vocabulary;

pub use classify::{ClassificationPolicy, SizeBuckets, SpanClass};
pub use extractor::{extract_page_spans, extract_page_spans_mem, PageSpans, Span};
pub use glossary::{ExtractionConfig, GlossaryExtractor, LineKind};
pub use vocabulary::{Chapter, JsonFormat, Vocabulary, WordPair};

use std::path::Path;

/// Outcome of a full extract-and-save run
#[derive(Debug)]
pub struct GlossaryResult {
    /// The extracted document
    pub vocabulary: Vocabulary,
    /// Number of pages decoded
    pub page_count: u32,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Extract the vocabulary of a glossary PDF file
pub fn extract_vocabulary<P: AsRef<Path>>(
    path: P,
    config: &ExtractionConfig,
) -> Result<Vocabulary, ExtractError> {
    let extractor = GlossaryExtractor::new(config)?;
    let pages = extract_page_spans(path)?;
    Ok(extractor.extract(&pages))
}

/// Extract the vocabulary of a glossary PDF held in memory
pub fn extract_vocabulary_mem(
    buffer: &[u8],
    config: &ExtractionConfig,
) -> Result<Vocabulary, ExtractError> {
    let extractor = GlossaryExtractor::new(config)?;
    let pages = extract_page_spans_mem(buffer)?;
    Ok(extractor.extract(&pages))
}

/// Extract a glossary PDF and save the vocabulary as pretty JSON.
///
/// Nothing is written unless extraction succeeds.
pub fn process_glossary<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &ExtractionConfig,
) -> Result<GlossaryResult, ExtractError> {
    let start = std::time::Instant::now();

    let extractor = GlossaryExtractor::new(config)?;
    let pages = extract_page_spans(&input)?;
    let vocabulary = extractor.extract(&pages);
    log::info!(
        "Extracted {} entries in {} chapters from {} pages",
        vocabulary.word_count(),
        vocabulary.chapter_count(),
        pages.len()
    );

    vocabulary.save(&output)?;

    Ok(GlossaryResult {
        vocabulary,
        page_count: pages.len() as u32,
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("PDF is encrypted")]
    Encrypted,
    #[error("Invalid PDF structure")]
    InvalidStructure,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("invalid vocabulary entry: {0}")]
    InvalidEntry(String),
}

impl From<lopdf::Error> for ExtractError {
    fn from(e: lopdf::Error) -> Self {
        match e {
            lopdf::Error::IO(e) => ExtractError::Io(e),
            e => ExtractError::Parse(e.to_string()),
        }
    }
}
