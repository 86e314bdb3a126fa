//! Chapter-aware vocabulary extraction from glossary pages
//!
//! Lines are read column by column. Each line is either page furniture, a
//! chapter heading, a vocabulary entry, or an incomplete row that is
//! dropped. Chapter state is carried in a [`ChapterAccumulator`] owned by a
//! single extraction run.

use crate::classify::{ClassificationPolicy, SizeBuckets, SpanClass};
use crate::extractor::PageSpans;
use crate::layout::{page_lines, TextLine};
use crate::vocabulary::{Chapter, Vocabulary, WordPair};
use crate::ExtractError;
use regex::Regex;

/// Configuration for one glossary layout
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// How spans are assigned to languages
    pub policy: ClassificationPolicy,
    /// Word preceding the chapter number in headings (e.g. "Kapitel")
    pub chapter_marker: String,
    /// Word preceding the page number in page furniture (e.g. "Sidan")
    pub page_marker: String,
}

impl ExtractionConfig {
    /// Rivstart glossary: Swedish in regular weight, German in bold
    pub fn rivstart() -> Self {
        Self {
            policy: ClassificationPolicy::ByWeight,
            chapter_marker: "Kapitel".to_string(),
            page_marker: "Sidan".to_string(),
        }
    }

    /// Rivstart third edition: Swedish at 9pt, English at any other size,
    /// 18pt chapter headings and 11pt page numbers
    pub fn rivstart_third_edition() -> Self {
        Self {
            policy: ClassificationPolicy::BySize(SizeBuckets {
                noise: 11.0,
                chapter: 18.0,
                source: 9.0,
            }),
            chapter_marker: "KAPITEL".to_string(),
            page_marker: "Sidan".to_string(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::rivstart()
    }
}

/// What a single line turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Page number or other furniture
    Noise,
    /// Chapter heading with the exact matched marker text
    ChapterMarker(String),
    /// A complete vocabulary entry
    Entry(WordPair),
    /// Only one language present, or nothing at all
    Incomplete,
}

/// Per-line text buffers, one per span class
#[derive(Debug, Default)]
struct LineBuffers<'a> {
    source: Vec<&'a str>,
    target: Vec<&'a str>,
    heading: Vec<&'a str>,
}

impl<'a> LineBuffers<'a> {
    fn collect(line: &'a TextLine, policy: &ClassificationPolicy) -> Self {
        let mut buffers = Self::default();
        for span in &line.spans {
            match policy.classify(span) {
                SpanClass::Noise => {}
                SpanClass::ChapterMarker => buffers.heading.push(&span.text),
                SpanClass::Source => buffers.source.push(&span.text),
                SpanClass::Target => buffers.target.push(&span.text),
            }
        }
        buffers
    }
}

/// Chapters seen so far and the one currently being filled.
///
/// Each label appears once. A marker for the open chapter (a running
/// header) keeps it open; a marker for an earlier chapter resumes that
/// entry, so chapters stay in first-encounter order.
#[derive(Debug, Default)]
pub struct ChapterAccumulator {
    current: Option<usize>,
    pending: Vec<WordPair>,
    chapters: Vec<Chapter>,
}

impl ChapterAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label of the chapter currently being filled
    pub fn current_chapter(&self) -> Option<&str> {
        self.current.map(|idx| self.chapters[idx].label.as_str())
    }

    /// Seal the open chapter, if any, and switch to `label`
    pub fn open_chapter(&mut self, label: String) {
        if self.current_chapter() == Some(label.as_str()) {
            log::trace!("Repeated marker {} for the open chapter", label);
            return;
        }

        let idx = match self.chapters.iter().position(|c| c.label == label) {
            Some(idx) => {
                log::debug!("Resuming chapter {}", label);
                idx
            }
            None => {
                log::debug!("Opening chapter {}", label);
                self.chapters.push(Chapter {
                    label,
                    words: Vec::new(),
                });
                self.chapters.len() - 1
            }
        };

        if self.current.is_none() && !self.pending.is_empty() {
            log::warn!(
                "{} entries found before the first chapter marker, assigning them to {}",
                self.pending.len(),
                self.chapters[idx].label
            );
            self.chapters[idx].words.append(&mut self.pending);
        }
        self.current = Some(idx);
    }

    pub fn push_word(&mut self, pair: WordPair) {
        match self.current {
            Some(idx) => self.chapters[idx].words.push(pair),
            None => self.pending.push(pair),
        }
    }

    /// Seal the trailing chapter, even if it has no entries
    pub fn finish(self) -> Vocabulary {
        if !self.pending.is_empty() {
            log::warn!(
                "No chapter marker found, dropping {} entries",
                self.pending.len()
            );
        }
        Vocabulary {
            chapters: self.chapters,
        }
    }
}

/// Classifying extractor for one glossary layout
#[derive(Debug, Clone)]
pub struct GlossaryExtractor {
    policy: ClassificationPolicy,
    chapter_re: Regex,
    page_re: Regex,
}

impl GlossaryExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            policy: config.policy,
            chapter_re: marker_pattern(&config.chapter_marker)?,
            page_re: marker_pattern(&config.page_marker)?,
        })
    }

    /// Build the vocabulary from decoded pages. Pages are taken in the
    /// given order, left column before right column on each page.
    pub fn extract(&self, pages: &[PageSpans]) -> Vocabulary {
        let mut acc = ChapterAccumulator::new();
        for page in pages {
            for line in page_lines(page) {
                self.apply_line(&line, &mut acc);
            }
        }
        acc.finish()
    }

    /// Feed one line into the accumulator
    pub fn apply_line(&self, line: &TextLine, acc: &mut ChapterAccumulator) {
        match self.classify_line(line) {
            LineKind::Noise => {
                log::trace!("Page {}: dropping furniture {:?}", line.page, line.text());
            }
            LineKind::ChapterMarker(label) => acc.open_chapter(label),
            LineKind::Entry(pair) => acc.push_word(pair),
            LineKind::Incomplete => {
                log::trace!("Page {}: dropping one-sided line {:?}", line.page, line.text());
            }
        }
    }

    /// Decide what a line is, without touching chapter state
    pub fn classify_line(&self, line: &TextLine) -> LineKind {
        let buffers = LineBuffers::collect(line, &self.policy);
        let source = buffers.source.join(" ");
        let target = buffers.target.join(" ");
        let heading = buffers.heading.join(" ");

        if [&source, &target, &heading]
            .iter()
            .any(|text| self.page_re.is_match(text))
        {
            return LineKind::Noise;
        }

        let chapter = if self.policy.has_chapter_bucket() {
            self.chapter_re.find(&heading)
        } else {
            self.chapter_re
                .find(&source)
                .or_else(|| self.chapter_re.find(&target))
        };
        if let Some(m) = chapter {
            return LineKind::ChapterMarker(m.as_str().to_string());
        }

        match WordPair::new(&source, &target) {
            Some(pair) => LineKind::Entry(pair),
            None => LineKind::Incomplete,
        }
    }
}

/// `\b<marker>\s\d+\b` with the marker taken literally
fn marker_pattern(marker: &str) -> Result<Regex, ExtractError> {
    Ok(Regex::new(&format!(r"\b{}\s\d+\b", regex::escape(marker)))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{PageBounds, Span};
    use crate::layout::Column;

    fn span(text: &str, x: f32, y: f32, bold: bool, size: f32) -> Span {
        Span {
            text: text.into(),
            x,
            y,
            font: if bold { "Helvetica-Bold" } else { "Helvetica" }.into(),
            font_size: Some(size),
            is_bold: bold,
        }
    }

    fn line(spans: Vec<Span>) -> TextLine {
        TextLine {
            y: spans.first().map_or(0.0, |s| s.y),
            spans,
            page: 1,
            column: Column::Left,
        }
    }

    fn page(number: u32, spans: Vec<Span>) -> PageSpans {
        PageSpans {
            page: number,
            bounds: PageBounds {
                x_min: 0.0,
                y_min: 0.0,
                x_max: 600.0,
                y_max: 800.0,
            },
            spans,
        }
    }

    fn by_weight() -> GlossaryExtractor {
        GlossaryExtractor::new(&ExtractionConfig::rivstart()).unwrap()
    }

    fn by_size() -> GlossaryExtractor {
        GlossaryExtractor::new(&ExtractionConfig::rivstart_third_edition()).unwrap()
    }

    #[test]
    fn test_entry_under_open_chapter() {
        let ex = by_weight();
        let mut acc = ChapterAccumulator::new();
        acc.open_chapter("Kapitel 1".into());
        ex.apply_line(
            &line(vec![
                span("hund", 50.0, 700.0, false, 9.0),
                span("Hund", 150.0, 700.0, true, 9.0),
            ]),
            &mut acc,
        );
        let vocab = acc.finish();
        assert_eq!(vocab.chapters.len(), 1);
        assert_eq!(vocab.chapters[0].label, "Kapitel 1");
        assert_eq!(vocab.chapters[0].words, vec![WordPair::new("hund", "Hund").unwrap()]);
    }

    #[test]
    fn test_page_number_is_noise_regardless_of_weight() {
        let ex = by_weight();
        for bold in [false, true] {
            let l = line(vec![span("Sidan 42", 50.0, 40.0, bold, 9.0)]);
            assert_eq!(ex.classify_line(&l), LineKind::Noise);
        }
    }

    #[test]
    fn test_noise_line_leaves_chapter_state_alone() {
        let ex = by_weight();
        let mut acc = ChapterAccumulator::new();
        acc.open_chapter("Kapitel 2".into());
        ex.apply_line(
            &line(vec![
                span("Sidan 12", 50.0, 40.0, false, 9.0),
                span("Kapitel 3", 150.0, 40.0, true, 9.0),
            ]),
            &mut acc,
        );
        assert_eq!(acc.current_chapter(), Some("Kapitel 2"));
        assert!(acc.finish().chapters[0].words.is_empty());
    }

    #[test]
    fn test_chapter_marker_in_either_buffer() {
        let ex = by_weight();
        let regular = line(vec![span("Kapitel 13", 50.0, 700.0, false, 14.0)]);
        let bold = line(vec![span("Kapitel 4", 50.0, 700.0, true, 14.0)]);
        assert_eq!(
            ex.classify_line(&regular),
            LineKind::ChapterMarker("Kapitel 13".into())
        );
        assert_eq!(
            ex.classify_line(&bold),
            LineKind::ChapterMarker("Kapitel 4".into())
        );
    }

    #[test]
    fn test_chapter_label_is_exact_match() {
        let ex = by_weight();
        let l = line(vec![
            span("Ord till", 50.0, 700.0, false, 9.0),
            span("Kapitel 7:", 120.0, 700.0, false, 9.0),
            span("Wörter", 200.0, 700.0, true, 9.0),
        ]);
        assert_eq!(ex.classify_line(&l), LineKind::ChapterMarker("Kapitel 7".into()));
    }

    #[test]
    fn test_chapter_marker_needs_number() {
        let ex = by_weight();
        let l = line(vec![span("Kapitel", 50.0, 700.0, false, 9.0)]);
        assert_eq!(ex.classify_line(&l), LineKind::Incomplete);
        // Case matters: the third edition prints headings in capitals
        let l = line(vec![span("KAPITEL 3", 50.0, 700.0, false, 9.0)]);
        assert_eq!(ex.classify_line(&l), LineKind::Incomplete);
    }

    #[test]
    fn test_one_sided_lines_are_dropped() {
        let ex = by_weight();
        let only_source = line(vec![span("hund", 50.0, 700.0, false, 9.0)]);
        let only_target = line(vec![span("Hund", 50.0, 700.0, true, 9.0)]);
        let blank_target = line(vec![
            span("hund", 50.0, 700.0, false, 9.0),
            span("  ", 150.0, 700.0, true, 9.0),
        ]);
        assert_eq!(ex.classify_line(&only_source), LineKind::Incomplete);
        assert_eq!(ex.classify_line(&only_target), LineKind::Incomplete);
        assert_eq!(ex.classify_line(&blank_target), LineKind::Incomplete);
    }

    #[test]
    fn test_multi_span_buffers_are_space_joined() {
        let ex = by_weight();
        let l = line(vec![
            span("en", 50.0, 700.0, false, 9.0),
            span("kopp", 65.0, 700.0, false, 9.0),
            span("eine", 150.0, 700.0, true, 9.0),
            span("Tasse", 175.0, 700.0, true, 9.0),
        ]);
        assert_eq!(
            ex.classify_line(&l),
            LineKind::Entry(WordPair::new("en kopp", "eine Tasse").unwrap())
        );
    }

    #[test]
    fn test_by_size_buckets_drive_line_kind() {
        let ex = by_size();
        let heading = line(vec![span("KAPITEL 5", 50.0, 750.0, true, 18.0)]);
        assert_eq!(ex.classify_line(&heading), LineKind::ChapterMarker("KAPITEL 5".into()));

        let entry = line(vec![
            span("en hund", 50.0, 700.0, false, 9.0),
            span("a dog", 150.0, 700.0, false, 8.0),
        ]);
        assert_eq!(
            ex.classify_line(&entry),
            LineKind::Entry(WordPair::new("en hund", "a dog").unwrap())
        );

        // 11pt page numbers never reach a buffer
        let furniture = line(vec![
            span("123", 50.0, 30.0, false, 11.0),
            span("hund", 80.0, 30.0, false, 9.0),
        ]);
        assert_eq!(ex.classify_line(&furniture), LineKind::Incomplete);
    }

    #[test]
    fn test_by_size_heading_only_from_heading_bucket() {
        let ex = by_size();
        let l = line(vec![
            span("KAPITEL 5", 50.0, 700.0, false, 9.0),
            span("chapter 5", 150.0, 700.0, false, 8.0),
        ]);
        assert_eq!(
            ex.classify_line(&l),
            LineKind::Entry(WordPair::new("KAPITEL 5", "chapter 5").unwrap())
        );
    }

    #[test]
    fn test_by_size_unmatched_heading_text_is_ignored() {
        let ex = by_size();
        let l = line(vec![
            span("Ordlista", 50.0, 700.0, false, 18.0),
            span("hund", 150.0, 700.0, false, 9.0),
            span("dog", 250.0, 700.0, false, 8.0),
        ]);
        assert_eq!(
            ex.classify_line(&l),
            LineKind::Entry(WordPair::new("hund", "dog").unwrap())
        );
    }

    #[test]
    fn test_by_size_page_marker_still_filtered() {
        let ex = by_size();
        let l = line(vec![
            span("Sidan 9", 50.0, 30.0, false, 9.0),
            span("page", 150.0, 30.0, false, 8.0),
        ]);
        assert_eq!(ex.classify_line(&l), LineKind::Noise);
    }

    #[test]
    fn test_extract_chapters_in_encounter_order() {
        let ex = by_weight();
        let pages = vec![
            page(
                1,
                vec![
                    span("Kapitel 1", 50.0, 750.0, true, 14.0),
                    span("hund", 50.0, 700.0, false, 9.0),
                    span("Hund", 150.0, 700.0, true, 9.0),
                    span("Kapitel 2", 350.0, 750.0, true, 14.0),
                    span("katt", 350.0, 700.0, false, 9.0),
                    span("Katze", 450.0, 700.0, true, 9.0),
                    span("Sidan 1", 300.0, 30.0, false, 9.0),
                ],
            ),
            page(
                2,
                vec![
                    span("häst", 50.0, 700.0, false, 9.0),
                    span("Pferd", 150.0, 700.0, true, 9.0),
                ],
            ),
        ];
        let vocab = ex.extract(&pages);
        let labels: Vec<&str> = vocab.chapters.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["Kapitel 1", "Kapitel 2"]);
        assert_eq!(vocab.chapters[0].words, vec![WordPair::new("hund", "Hund").unwrap()]);
        assert_eq!(
            vocab.chapters[1].words,
            vec![
                WordPair::new("katt", "Katze").unwrap(),
                WordPair::new("häst", "Pferd").unwrap(),
            ]
        );
    }

    #[test]
    fn test_running_header_keeps_chapter_open() {
        let ex = by_weight();
        let pages = vec![
            page(
                1,
                vec![
                    span("Kapitel 1", 50.0, 750.0, true, 14.0),
                    span("hund", 50.0, 700.0, false, 9.0),
                    span("Hund", 150.0, 700.0, true, 9.0),
                ],
            ),
            page(
                2,
                vec![
                    span("Kapitel 1", 50.0, 750.0, true, 14.0),
                    span("katt", 50.0, 700.0, false, 9.0),
                    span("Katze", 150.0, 700.0, true, 9.0),
                ],
            ),
        ];
        let vocab = ex.extract(&pages);
        let labels: Vec<&str> = vocab.chapters.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["Kapitel 1"]);
        assert_eq!(
            vocab.chapters[0].words,
            vec![
                WordPair::new("hund", "Hund").unwrap(),
                WordPair::new("katt", "Katze").unwrap(),
            ]
        );
    }

    #[test]
    fn test_returning_marker_resumes_earlier_chapter() {
        let mut acc = ChapterAccumulator::new();
        acc.open_chapter("Kapitel 1".into());
        acc.push_word(WordPair::new("hund", "Hund").unwrap());
        acc.open_chapter("Kapitel 2".into());
        acc.push_word(WordPair::new("katt", "Katze").unwrap());
        acc.open_chapter("Kapitel 1".into());
        assert_eq!(acc.current_chapter(), Some("Kapitel 1"));
        acc.push_word(WordPair::new("häst", "Pferd").unwrap());

        let vocab = acc.finish();
        let labels: Vec<&str> = vocab.chapters.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["Kapitel 1", "Kapitel 2"]);
        assert_eq!(vocab.chapters[0].words.len(), 2);
        assert_eq!(vocab.chapters[0].words[1].source(), "häst");
        assert_eq!(vocab.chapters[1].words.len(), 1);
    }

    #[test]
    fn test_trailing_empty_chapter_is_sealed() {
        let ex = by_weight();
        let pages = vec![page(1, vec![span("Kapitel 9", 50.0, 750.0, true, 14.0)])];
        let vocab = ex.extract(&pages);
        assert_eq!(vocab.chapter_count(), 1);
        assert!(vocab.chapters[0].words.is_empty());
    }

    #[test]
    fn test_no_marker_yields_empty_document() {
        let ex = by_weight();
        let pages = vec![page(
            1,
            vec![
                span("hund", 50.0, 700.0, false, 9.0),
                span("Hund", 150.0, 700.0, true, 9.0),
            ],
        )];
        assert_eq!(ex.extract(&pages).chapter_count(), 0);
        assert_eq!(ex.extract(&[]).chapter_count(), 0);
    }

    #[test]
    fn test_entries_before_first_marker_join_first_chapter() {
        let ex = by_weight();
        let pages = vec![page(
            1,
            vec![
                span("hund", 50.0, 700.0, false, 9.0),
                span("Hund", 150.0, 700.0, true, 9.0),
                span("Kapitel 1", 50.0, 650.0, true, 14.0),
            ],
        )];
        let vocab = ex.extract(&pages);
        assert_eq!(vocab.chapter_count(), 1);
        assert_eq!(vocab.chapters[0].words.len(), 1);
    }

    #[test]
    fn test_marker_pattern_escapes_marker() {
        let re = marker_pattern("Kap.").unwrap();
        assert!(re.is_match("Kap. 3"));
        assert!(!re.is_match("Kapx 3"));
    }
}
