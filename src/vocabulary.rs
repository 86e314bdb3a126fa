//! Chapter-grouped vocabulary document and its JSON form
//!
//! The JSON layout is the one the vocabulary app imports:
//!
//! ```json
//! [
//!     {
//!         "chapter": "Kapitel 1",
//!         "words": [["hund", "Hund"]]
//!     }
//! ]
//! ```

use crate::ExtractError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// JSON output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Four-space indentation
    #[default]
    Pretty,
    /// No extra whitespace
    Compact,
}

/// One bilingual entry. Both sides are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(String, String)", into = "(String, String)")]
pub struct WordPair {
    source: String,
    target: String,
}

impl WordPair {
    /// Build a pair from raw buffers, `None` if either side is blank
    pub fn new(source: &str, target: &str) -> Option<Self> {
        let (source, target) = (source.trim(), target.trim());
        if source.is_empty() || target.is_empty() {
            return None;
        }
        Some(Self {
            source: source.to_string(),
            target: target.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl TryFrom<(String, String)> for WordPair {
    type Error = ExtractError;

    fn try_from((source, target): (String, String)) -> Result<Self, Self::Error> {
        WordPair::new(&source, &target)
            .ok_or_else(|| ExtractError::InvalidEntry(format!("[{:?}, {:?}]", source, target)))
    }
}

impl From<WordPair> for (String, String) {
    fn from(pair: WordPair) -> Self {
        (pair.source, pair.target)
    }
}

/// A chapter label and its entries in encounter order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Matched marker text, e.g. `Kapitel 13`
    #[serde(rename = "chapter")]
    pub label: String,
    pub words: Vec<WordPair>,
}

/// Chapter as stored on disk, before entry validation
#[derive(Deserialize)]
struct RawChapter {
    chapter: String,
    words: Vec<(String, String)>,
}

impl RawChapter {
    fn validate(self) -> Result<Chapter, ExtractError> {
        let label = self.chapter;
        let words = self
            .words
            .into_iter()
            .enumerate()
            .map(|(i, (source, target))| {
                WordPair::new(&source, &target).ok_or_else(|| {
                    ExtractError::InvalidEntry(format!(
                        "{} entry {}: [{:?}, {:?}]",
                        label,
                        i + 1,
                        source,
                        target
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Chapter { label, words })
    }
}

/// The extracted document: chapters in encounter order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary {
    pub chapters: Vec<Chapter>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Total number of entries over all chapters
    pub fn word_count(&self) -> usize {
        self.chapters.iter().map(|c| c.words.len()).sum()
    }

    /// True when there is no entry at all, even if empty chapters exist
    pub fn is_empty(&self) -> bool {
        self.word_count() == 0
    }

    /// Render the document as JSON. Non-ASCII text is written literally.
    pub fn to_json(&self, format: JsonFormat) -> Result<String, ExtractError> {
        match format {
            JsonFormat::Pretty => {
                let mut buf = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
                let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                self.serialize(&mut ser)?;
                String::from_utf8(buf).map_err(|e| ExtractError::Parse(e.to_string()))
            }
            JsonFormat::Compact => Ok(serde_json::to_string(self)?),
        }
    }

    /// Parse a previously saved document. Structural problems are `Json`
    /// errors; entries with a blank side are `InvalidEntry`.
    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        let raw: Vec<RawChapter> = serde_json::from_str(json)?;
        let chapters = raw
            .into_iter()
            .map(RawChapter::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { chapters })
    }

    /// Write pretty JSON to `path`. The document is fully serialized before
    /// the file is created.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ExtractError> {
        let json = self.to_json(JsonFormat::Pretty)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
