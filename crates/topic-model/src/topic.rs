use crate::error::{Result, TopicModelError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Number of topic types a token may be assigned to.
pub const N_TOPICS: usize = 5;

/// Number of corpus-wide background topics.
pub const N_BACKGROUND: usize = 3;

/// Position of the per-project content topic in per-token assignments.
pub const CONTENT: usize = 3;

/// Position of the per-file document topic in per-token assignments.
pub const DOCUMENT: usize = 4;

/// Topic type, in assignment-index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicId {
    Background(u8),
    Content,
    Document,
}

impl TopicId {
    pub const ALL: [TopicId; N_TOPICS] = [
        TopicId::Background(0),
        TopicId::Background(1),
        TopicId::Background(2),
        TopicId::Content,
        TopicId::Document,
    ];

    /// Background topic `k`, rejecting ids outside `0..3`.
    pub fn background(k: usize) -> Result<Self> {
        if k < N_BACKGROUND {
            Ok(TopicId::Background(k as u8))
        } else {
            Err(TopicModelError::invalid_config(format!(
                "background topic id {k} out of range 0..{N_BACKGROUND}"
            )))
        }
    }

    pub fn index(self) -> usize {
        match self {
            TopicId::Background(k) => k as usize,
            TopicId::Content => CONTENT,
            TopicId::Document => DOCUMENT,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicId::Background(k) => write!(f, "background{k}"),
            TopicId::Content => write!(f, "content"),
            TopicId::Document => write!(f, "document"),
        }
    }
}

/// Token counts assigned to one topic instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topic {
    counts: HashMap<u32, u32>,
    total: u64,
}

impl Topic {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_counts(counts: HashMap<u32, u32>) -> Self {
        let total = counts.values().map(|&c| c as u64).sum();
        Self { counts, total }
    }

    pub fn add(&mut self, token: u32) {
        *self.counts.entry(token).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn remove(&mut self, token: u32) {
        if let Some(count) = self.counts.get_mut(&token) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&token);
            }
            self.total -= 1;
        }
    }

    pub fn count(&self, token: u32) -> u32 {
        self.counts.get(&token).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn counts(&self) -> &HashMap<u32, u32> {
        &self.counts
    }

    /// Smoothed probability of `token` under this topic.
    pub fn phi_hat(&self, token: u32, beta: f64, vocab_size: usize) -> f64 {
        (self.count(token) as f64 + beta) / (self.total as f64 + vocab_size as f64 * beta)
    }

    /// The `n` most frequent tokens, ties broken by ascending id.
    pub fn top_tokens(&self, n: usize) -> Vec<(u32, u32)> {
        let mut ranked: Vec<(u32, u32)> = self.counts.iter().map(|(&t, &c)| (t, c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Every topic instance in a model: shared backgrounds, one content topic per
/// project, one document topic per file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicTables {
    pub(crate) background: [Topic; N_BACKGROUND],
    pub(crate) content: Vec<Topic>,
    pub(crate) document: Vec<Vec<Topic>>,
}

impl TopicTables {
    /// Empty tables shaped after `files_per_project`.
    pub(crate) fn shaped(files_per_project: impl IntoIterator<Item = usize>) -> Self {
        let document: Vec<Vec<Topic>> = files_per_project
            .into_iter()
            .map(|n| vec![Topic::new(); n])
            .collect();
        Self {
            background: Default::default(),
            content: vec![Topic::new(); document.len()],
            document,
        }
    }

    /// Topic instance for assignment index `k` of a token in `(project, file)`.
    pub(crate) fn get(&self, k: usize, project: usize, file: usize) -> &Topic {
        match k {
            CONTENT => &self.content[project],
            DOCUMENT => &self.document[project][file],
            _ => &self.background[k],
        }
    }

    pub(crate) fn get_mut(&mut self, k: usize, project: usize, file: usize) -> &mut Topic {
        match k {
            CONTENT => &mut self.content[project],
            DOCUMENT => &mut self.document[project][file],
            _ => &mut self.background[k],
        }
    }

    /// Per-token counts summed over every instance of topic type `k`.
    pub(crate) fn pooled_counts(&self, k: usize) -> HashMap<u32, u32> {
        let instances: Vec<&Topic> = match k {
            CONTENT => self.content.iter().collect(),
            DOCUMENT => self.document.iter().flatten().collect(),
            _ => vec![&self.background[k]],
        };
        let mut pooled = HashMap::new();
        for topic in instances {
            for (&token, &count) in &topic.counts {
                *pooled.entry(token).or_insert(0) += count;
            }
        }
        pooled
    }

    pub fn background(&self, k: usize) -> Option<&Topic> {
        self.background.get(k)
    }

    pub fn content(&self, project: usize) -> Option<&Topic> {
        self.content.get(project)
    }

    pub fn document(&self, project: usize, file: usize) -> Option<&Topic> {
        self.document.get(project).and_then(|files| files.get(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_phi_hat_of_empty_topic() {
        let topic = Topic::new();
        let phi = topic.phi_hat(42, 0.1, 1000);
        assert!((phi - 0.001).abs() < 1e-15);
    }

    #[test]
    fn test_add_remove_tracks_total() {
        let mut topic = Topic::new();
        topic.add(1);
        topic.add(1);
        topic.add(2);
        topic.remove(1);
        assert_eq!(topic.total(), 2);
        assert_eq!(topic.count(1), 1);
        topic.remove(1);
        assert!(!topic.counts().contains_key(&1));
    }

    #[test]
    fn test_topic_id_indices() {
        for (i, id) in TopicId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(TopicId::from_index(i), Some(*id));
        }
        assert!(TopicId::background(2).is_ok());
        assert!(TopicId::background(3).is_err());
    }

    #[test]
    fn test_pooled_counts_sum_instances() {
        let mut tables = TopicTables::shaped([2, 1]);
        tables.get_mut(DOCUMENT, 0, 0).add(7);
        tables.get_mut(DOCUMENT, 0, 1).add(7);
        tables.get_mut(DOCUMENT, 1, 0).add(8);
        tables.get_mut(CONTENT, 1, 0).add(7);
        let pooled = tables.pooled_counts(DOCUMENT);
        assert_eq!(pooled.get(&7), Some(&2));
        assert_eq!(pooled.get(&8), Some(&1));
        assert_eq!(tables.pooled_counts(CONTENT).get(&7), Some(&1));
    }

    #[test]
    fn test_top_tokens_ordering() {
        let mut topic = Topic::new();
        for t in [3, 1, 1, 2, 2, 5] {
            topic.add(t);
        }
        assert_eq!(topic.top_tokens(2), vec![(1, 2), (2, 2)]);
    }
}
