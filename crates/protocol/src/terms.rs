use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multiset of terms with deterministic iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermBag {
    counts: BTreeMap<String, u32>,
}

impl TermBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, term: impl Into<String>) {
        self.add_n(term, 1);
    }

    pub fn add_n(&mut self, term: impl Into<String>, n: u32) {
        if n == 0 {
            return;
        }
        *self.counts.entry(term.into()).or_insert(0) += n;
    }

    /// Adds every occurrence of `other` to `self`.
    pub fn merge(&mut self, other: &TermBag) {
        for (term, count) in &other.counts {
            *self.counts.entry(term.clone()).or_insert(0) += count;
        }
    }

    pub fn count(&self, term: &str) -> u32 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    /// Total number of occurrences.
    pub fn total(&self) -> usize {
        self.counts.values().map(|&c| c as usize).sum()
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(term, &count)| (term.as_str(), count))
    }

    /// Every occurrence in term order, repeating terms by their count.
    pub fn occurrences(&self) -> impl Iterator<Item = &str> {
        self.counts
            .iter()
            .flat_map(|(term, &count)| std::iter::repeat(term.as_str()).take(count as usize))
    }
}

impl<S: Into<String>> FromIterator<S> for TermBag {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut bag = TermBag::new();
        for term in iter {
            bag.add(term);
        }
        bag
    }
}
