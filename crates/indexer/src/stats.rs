use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Statistics about one corpus load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Projects with at least one loaded file
    pub projects: usize,

    /// Files parsed into documents
    pub files: usize,

    /// Regions (one topic-model sentence each)
    pub nodes: usize,

    /// Term occurrences across all regions
    pub tokens: usize,

    /// Total lines of code
    pub total_lines: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// Files per language
    pub languages: BTreeMap<String, usize>,

    /// Files that could not be read or parsed
    pub skipped: Vec<String>,
}

impl LoadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, language: &str, lines: usize, nodes: usize, tokens: usize) {
        self.files += 1;
        self.total_lines += lines;
        self.nodes += nodes;
        self.tokens += tokens;
        *self.languages.entry(language.to_string()).or_insert(0) += 1;
    }

    pub fn add_skipped(&mut self, path: String) {
        self.skipped.push(path);
    }
}
