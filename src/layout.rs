//! Column bisection and line grouping
//!
//! A glossary page is printed in two columns. The page is cut at its
//! horizontal midpoint and each half is grouped into lines independently,
//! so vocabulary entries are never merged across columns.

use crate::extractor::{PageSpans, Span};

/// Vertical distance within which two spans belong to the same line
const Y_TOLERANCE: f32 = 3.0;

/// Which half of the page a span belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Left,
    Right,
}

/// A line of text (spans sharing a vertical position in one column)
#[derive(Debug, Clone)]
pub struct TextLine {
    pub spans: Vec<Span>,
    pub y: f32,
    pub page: u32,
    pub column: Column,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Split a page's spans into its left and right halves.
///
/// Spans are assigned by their origin: anything starting left of the
/// midpoint of the page bounds is in the left column. Stream order is kept
/// within each half.
pub fn split_columns(page: &PageSpans) -> (Vec<&Span>, Vec<&Span>) {
    let midpoint = page.bounds.x_min + page.bounds.width() / 2.0;
    page.spans.iter().partition(|span| span.x < midpoint)
}

/// Group a page into lines, the whole left column before the right one
pub fn page_lines(page: &PageSpans) -> Vec<TextLine> {
    let (left, right) = split_columns(page);
    let mut lines = group_column(left, page.page, Column::Left);
    lines.extend(group_column(right, page.page, Column::Right));
    lines
}

/// Group the spans of one column into lines.
///
/// Lines keep the order in which they are first encountered in the content
/// stream. A span joins the first existing line whose baseline is within
/// tolerance, so a row whose two words were drawn far apart in the stream
/// still ends up as one line.
pub fn group_column(spans: Vec<&Span>, page: u32, column: Column) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();

    for span in spans {
        match lines
            .iter_mut()
            .find(|line| (line.y - span.y).abs() < Y_TOLERANCE)
        {
            Some(line) => line.spans.push(span.clone()),
            None => lines.push(TextLine {
                spans: vec![span.clone()],
                y: span.y,
                page,
                column,
            }),
        }
    }

    // Sort spans within each line by X position (left to right)
    for line in &mut lines {
        line.spans
            .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    }

    lines
}
