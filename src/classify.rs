//! Span classification strategies
//!
//! Glossaries mark the two languages by typography. Older editions set the
//! translation in bold; the third edition uses distinct point sizes for
//! page furniture, chapter headings and the Swedish headword.

use crate::extractor::Span;

/// Slack allowed when comparing a rendered size against a bucket
pub const SIZE_TOLERANCE: f32 = 0.05;

/// Role of a single span within a glossary line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanClass {
    /// Page furniture, dropped
    Noise,
    /// Candidate text for a chapter heading
    ChapterMarker,
    /// Source-language word
    Source,
    /// Target-language word
    Target,
}

/// Point sizes used by a size-bucketed layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeBuckets {
    /// Size of page numbers and other furniture
    pub noise: f32,
    /// Size of chapter headings
    pub chapter: f32,
    /// Size of source-language words; every other size is target language
    pub source: f32,
}

impl SizeBuckets {
    fn matches(size: f32, bucket: f32) -> bool {
        (size - bucket).abs() < SIZE_TOLERANCE
    }
}

/// How spans are told apart, selected once per book
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassificationPolicy {
    /// Bold spans are target language, everything else source language
    ByWeight,
    /// Spans are bucketed by exact point size
    BySize(SizeBuckets),
}

impl ClassificationPolicy {
    /// Classify a span. Total over all spans: missing style metadata falls
    /// into the policy's default bucket.
    pub fn classify(&self, span: &Span) -> SpanClass {
        match self {
            ClassificationPolicy::ByWeight => {
                if span.is_bold {
                    SpanClass::Target
                } else {
                    SpanClass::Source
                }
            }
            ClassificationPolicy::BySize(buckets) => match span.font_size {
                Some(size) if SizeBuckets::matches(size, buckets.noise) => SpanClass::Noise,
                Some(size) if SizeBuckets::matches(size, buckets.chapter) => {
                    SpanClass::ChapterMarker
                }
                Some(size) if SizeBuckets::matches(size, buckets.source) => SpanClass::Source,
                _ => SpanClass::Target,
            },
        }
    }

    /// Whether chapter headings come from a dedicated bucket rather than
    /// from the word buffers
    pub fn has_chapter_bucket(&self) -> bool {
        matches!(self, ClassificationPolicy::BySize(_))
    }
}
