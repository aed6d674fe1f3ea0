use crate::config::ExtractorConfig;
use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("static regex"));

/// Turns identifier and comment text into lowercase terms.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    split_tokens: bool,
    min_term_len: usize,
}

impl Tokenizer {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            split_tokens: config.split_tokens,
            min_term_len: config.min_term_len,
        }
    }

    /// Terms of one identifier.
    pub fn identifier(&self, identifier: &str) -> Vec<String> {
        let mut terms = Vec::new();
        self.push_identifier(identifier, &mut terms);
        terms
    }

    /// Terms of a comment or docstring: words split on non-word characters,
    /// then treated as identifiers.
    pub fn comment(&self, text: &str) -> Vec<String> {
        let mut terms = Vec::new();
        for word in NON_WORD.split(text).filter(|w| !w.is_empty()) {
            self.push_identifier(word, &mut terms);
        }
        terms
    }

    fn push_identifier(&self, identifier: &str, terms: &mut Vec<String>) {
        if self.split_tokens {
            for part in split_identifier(identifier) {
                self.push_term(part, terms);
            }
        } else {
            self.push_term(identifier, terms);
        }
    }

    fn push_term(&self, term: &str, terms: &mut Vec<String>) {
        if term.chars().count() >= self.min_term_len {
            terms.push(term.to_lowercase());
        }
    }
}

/// Splits on underscores and camelCase boundaries, keeping acronym runs
/// together: `parseHTTPRequest_v2` gives `parse`, `HTTP`, `Request`, `v2`.
pub fn split_identifier(identifier: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for chunk in identifier.split('_').filter(|c| !c.is_empty()) {
        let chars: Vec<(usize, char)> = chunk.char_indices().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let (offset, c) = chars[i];
            if !c.is_uppercase() {
                continue;
            }
            let after_lower = !chars[i - 1].1.is_uppercase();
            let before_lower = chars.get(i + 1).is_some_and(|&(_, n)| n.is_lowercase());
            if after_lower || before_lower {
                parts.push(&chunk[start..offset]);
                start = offset;
            }
        }
        parts.push(&chunk[start..]);
    }
    parts
}
