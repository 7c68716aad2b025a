//! Filename keyword classifier
//!
//! Keywords from every category are compiled into a single Aho-Corasick
//! automaton in table declaration order. All keyword occurrences in the
//! normalized filename are collected and the lowest pattern index wins, which
//! is exactly "first category in declaration order with any hit, first keyword
//! within that category". Position in the filename and keyword length play no
//! part.

use crate::classifier::{CaptureInput, Classification, ClassificationSource, Classifier};
use aho_corasick::AhoCorasick;
use thermoscan_core::{CategoryTable, DeviceCategory, Error, Result};
use tracing::trace;

/// Characters treated as word separators in capture filenames
const SEPARATORS: [char; 3] = ['_', '-', '.'];

/// A keyword hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameMatch {
    pub category: DeviceCategory,
    pub keyword: String,
}

/// Keyword-based classifier over capture filenames
pub struct FilenameMatcher {
    automaton: AhoCorasick,
    keywords: Vec<(DeviceCategory, String)>,
}

impl FilenameMatcher {
    /// Build the matcher from a category table
    pub fn new(table: &CategoryTable) -> Result<Self> {
        let keywords: Vec<(DeviceCategory, String)> = table
            .iter()
            .flat_map(|spec| spec.keywords.iter().map(|k| (spec.category, k.clone())))
            .collect();

        let automaton = AhoCorasick::new(keywords.iter().map(|(_, k)| k.as_str()))
            .map_err(|e| Error::config(format!("Failed to build keyword matcher: {}", e)))?;

        Ok(Self {
            automaton,
            keywords,
        })
    }

    /// Lower-case the filename and turn separators into spaces
    pub fn normalize(filename: &str) -> String {
        filename.to_lowercase().replace(&SEPARATORS[..], " ")
    }

    /// Find the winning keyword, or `None` if no keyword occurs
    pub fn match_filename(&self, filename: &str) -> Option<FilenameMatch> {
        let normalized = Self::normalize(filename);

        let winner = self
            .automaton
            .find_overlapping_iter(&normalized)
            .map(|m| m.pattern().as_usize())
            .min()?;

        let (category, keyword) = &self.keywords[winner];
        trace!(filename, keyword = %keyword, category = %category, "Filename keyword matched");

        Some(FilenameMatch {
            category: *category,
            keyword: keyword.clone(),
        })
    }

    /// Number of compiled keywords
    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }
}

impl Classifier for FilenameMatcher {
    fn classify(&self, capture: &CaptureInput<'_>) -> Option<Classification> {
        self.match_filename(capture.filename).map(|m| {
            Classification::new(m.category, ClassificationSource::Filename { keyword: m.keyword })
        })
    }

    fn name(&self) -> &str {
        "filename"
    }
}
