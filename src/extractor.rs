//! Styled span extraction from PDF using lopdf
//!
//! Walks each page's content stream and reports every shown string as a
//! [`Span`] carrying its text, resolved font name, bold flag, rendered size
//! and position, together with the page bounds needed for column splitting.

use crate::ExtractError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

/// Subset tag prepended to embedded font names, e.g. `ABCDEF+Minion-Bold`
static SUBSET_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{6}\+").unwrap());

/// FontDescriptor flag bit 19 (ForceBold)
const FORCE_BOLD_FLAG: i64 = 1 << 18;

/// US Letter, used when a page has neither CropBox nor MediaBox
const DEFAULT_PAGE_BOUNDS: PageBounds = PageBounds {
    x_min: 0.0,
    y_min: 0.0,
    x_max: 612.0,
    y_max: 792.0,
};

/// A text fragment with font metadata and position
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    /// The text content
    pub text: String,
    /// X position on page (user space, after CTM)
    pub x: f32,
    /// Y position on page (PDF coordinates, origin at bottom-left)
    pub y: f32,
    /// Base font name without subset tag; empty when the font is unknown
    pub font: String,
    /// Rendered font size, `None` if text was shown before any `Tf`
    pub font_size: Option<f32>,
    /// Whether the font is a bold face
    pub is_bold: bool,
}

/// Page rectangle taken from the CropBox or MediaBox
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBounds {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl PageBounds {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
}

impl Default for PageBounds {
    fn default() -> Self {
        DEFAULT_PAGE_BOUNDS
    }
}

/// All spans of one page in content-stream order
#[derive(Debug, Clone)]
pub struct PageSpans {
    /// Page number (1-indexed)
    pub page: u32,
    pub bounds: PageBounds,
    pub spans: Vec<Span>,
}

/// Font facts resolved once per page from the resource dictionary
struct FontInfo {
    base_font: String,
    is_bold: bool,
}

/// Check whether a base font name denotes a bold face
pub fn is_bold_font(font_name: &str) -> bool {
    font_name.to_lowercase().contains("bold")
}

/// Load a PDF file and extract the styled spans of every page
pub fn extract_page_spans<P: AsRef<Path>>(path: P) -> Result<Vec<PageSpans>, ExtractError> {
    let doc = Document::load(path)?;
    extract_spans_from_doc(&doc)
}

/// Extract styled spans from a PDF memory buffer
pub fn extract_page_spans_mem(buffer: &[u8]) -> Result<Vec<PageSpans>, ExtractError> {
    let doc = Document::load_mem(buffer)?;
    extract_spans_from_doc(&doc)
}

/// Extract spans from a loaded document, pages in ascending order
fn extract_spans_from_doc(doc: &Document) -> Result<Vec<PageSpans>, ExtractError> {
    if doc.is_encrypted() {
        return Err(ExtractError::Encrypted);
    }
    doc.catalog().map_err(|_| ExtractError::InvalidStructure)?;

    let pages = doc.get_pages();
    let mut result = Vec::with_capacity(pages.len());

    for (&page_num, &page_id) in pages.iter() {
        let bounds = page_bounds(doc, page_id);
        let spans = match extract_page(doc, page_id) {
            Ok(spans) => spans,
            Err(e) => {
                log::warn!("Skipping page {}: {}", page_num, e);
                Vec::new()
            }
        };
        log::debug!("Page {}: {} spans", page_num, spans.len());
        result.push(PageSpans {
            page: page_num,
            bounds,
            spans,
        });
    }

    Ok(result)
}

/// Visible page rectangle: the CropBox when present, else the MediaBox,
/// each inherited through the page tree. `/Rotate` is not applied, so a
/// rotated page is bisected along its unrotated x axis.
fn page_bounds(doc: &Document, page_id: ObjectId) -> PageBounds {
    inherited_box(doc, page_id, b"CropBox")
        .or_else(|| inherited_box(doc, page_id, b"MediaBox"))
        .unwrap_or_default()
}

/// Look up a rectangle entry on the page or its nearest ancestor
fn inherited_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<PageBounds> {
    let mut current = Some(page_id);
    // Page trees are shallow; the bound only guards against reference cycles
    for _ in 0..32 {
        let dict = doc.get_dictionary(current?).ok()?;
        if let Some(bounds) = dict
            .get(key)
            .ok()
            .and_then(|obj| resolve(doc, obj).as_array().ok())
            .and_then(|arr| bounds_from_array(arr))
        {
            return Some(bounds);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

fn bounds_from_array(arr: &[Object]) -> Option<PageBounds> {
    if arr.len() < 4 {
        return None;
    }
    let (x0, y0) = (get_number(&arr[0])?, get_number(&arr[1])?);
    let (x1, y1) = (get_number(&arr[2])?, get_number(&arr[3])?);
    Some(PageBounds {
        x_min: x0.min(x1),
        y_min: y0.min(y1),
        x_max: x0.max(x1),
        y_max: y0.max(y1),
    })
}

/// Follow a reference to its object, or return the object itself
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Resolve resource names (`F1`) to base font names and boldness
fn page_font_info(
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
) -> BTreeMap<Vec<u8>, FontInfo> {
    fonts
        .iter()
        .map(|(name, dict)| {
            let raw = dict
                .get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string())
                .unwrap_or_default();
            let base_font = SUBSET_PREFIX_RE.replace(&raw, "").to_string();
            let is_bold = is_bold_font(&base_font) || has_force_bold_flag(doc, dict);
            (name.clone(), FontInfo { base_font, is_bold })
        })
        .collect()
}

fn has_force_bold_flag(doc: &Document, font: &Dictionary) -> bool {
    font.get(b"FontDescriptor")
        .ok()
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
        .and_then(|desc| desc.get(b"Flags").ok())
        .and_then(|flags| flags.as_i64().ok())
        .is_some_and(|flags| flags & FORCE_BOLD_FLAG != 0)
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

/// Text and graphics state needed to place spans
struct TextState {
    ctm: [f32; 6],
    ctm_stack: Vec<[f32; 6]>,
    font: Vec<u8>,
    font_size: Option<f32>,
    leading: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    in_text_block: bool,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            font: Vec::new(),
            font_size: None,
            leading: 0.0,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            in_text_block: false,
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix[4] += tx * self.line_matrix[0] + ty * self.line_matrix[2];
        self.line_matrix[5] += tx * self.line_matrix[1] + ty * self.line_matrix[3];
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            // Approximate line height
            self.font_size.unwrap_or(12.0) * 1.2
        };
        self.move_line(0.0, -leading);
    }
}

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Extract spans from a single page
fn extract_page(doc: &Document, page_id: ObjectId) -> Result<Vec<Span>, ExtractError> {
    use lopdf::content::Content;

    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();
    let font_info = page_font_info(doc, &fonts);

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| ExtractError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| ExtractError::Parse(e.to_string()))?;

    let mut spans = Vec::new();
    let mut state = TextState::new();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(saved) = state.ctm_stack.pop() {
                    state.ctm = saved;
                }
            }
            "cm" => {
                if let Some(m) = matrix_from_operands(operands) {
                    state.ctm = multiply_matrices(&m, &state.ctm);
                }
            }
            "BT" => {
                state.in_text_block = true;
                state.text_matrix = IDENTITY;
                state.line_matrix = IDENTITY;
            }
            "ET" => state.in_text_block = false,
            "Tf" => {
                if operands.len() >= 2 {
                    if let Ok(name) = operands[0].as_name() {
                        state.font = name.to_vec();
                    }
                    state.font_size = get_number(&operands[1]);
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(get_number) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                if operands.len() >= 2 {
                    let tx = get_number(&operands[0]).unwrap_or(0.0);
                    let ty = get_number(&operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_from_operands(operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = operands
                    .first()
                    .and_then(|o| decode_operand(o, doc, &fonts, &state.font))
                {
                    push_span(&mut spans, &state, &font_info, text);
                }
            }
            "TJ" => {
                if let Some(array) = operands.first().and_then(|o| o.as_array().ok()) {
                    let text: String = array
                        .iter()
                        .filter_map(|item| decode_operand(item, doc, &fonts, &state.font))
                        .collect();
                    push_span(&mut spans, &state, &font_info, text);
                }
            }
            "'" | "\"" => {
                state.next_line();
                if let Some(text) = operands
                    .last()
                    .and_then(|o| decode_operand(o, doc, &fonts, &state.font))
                {
                    push_span(&mut spans, &state, &font_info, text);
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn push_span(
    spans: &mut Vec<Span>,
    state: &TextState,
    font_info: &BTreeMap<Vec<u8>, FontInfo>,
    text: String,
) {
    if !state.in_text_block || text.trim().is_empty() {
        return;
    }
    let combined = multiply_matrices(&state.text_matrix, &state.ctm);
    let info = font_info.get(&state.font);
    spans.push(Span {
        text,
        x: combined[4],
        y: combined[5],
        font: info.map(|f| f.base_font.clone()).unwrap_or_default(),
        font_size: state
            .font_size
            .map(|size| effective_font_size(size, &combined)),
        is_bold: info.is_some_and(|f| f.is_bold),
    });
}

fn matrix_from_operands(operands: &[Object]) -> Option<[f32; 6]> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (slot, operand) in m.iter_mut().zip(operands) {
        *slot = get_number(operand)?;
    }
    Some(m)
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Compute effective font size from base size and the combined matrix
/// Matrix is [a, b, c, d, tx, ty] where a,d are scale factors
fn effective_font_size(base_size: f32, matrix: &[f32; 6]) -> f32 {
    let scale_x = (matrix[0].powi(2) + matrix[1].powi(2)).sqrt();
    let scale_y = (matrix[2].powi(2) + matrix[3].powi(2)).sqrt();
    base_size * scale_x.max(scale_y)
}

/// Decode a string operand with the current font's encoding
fn decode_operand(
    obj: &Object,
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    current_font: &[u8],
) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(font_dict) = fonts.get(current_font) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    // Fallback: UTF-16BE with BOM, else Latin-1
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }

    Some(bytes.iter().map(|&b| b as char).collect())
}
