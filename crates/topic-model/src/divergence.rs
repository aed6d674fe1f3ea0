use crate::error::{Result, TopicModelError};
use crate::model::TopicModel;
use crate::topic::{TopicId, N_BACKGROUND};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which topic distribution a candidate node set is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KlDivergenceKind {
    /// Document topic of the file.
    #[serde(rename = "KLDivFile")]
    File,
    /// Content topic of the project.
    #[serde(rename = "KLDivProj")]
    Project,
    /// Document divergence minus content divergence.
    #[serde(rename = "KLDivFileMinusProj")]
    FileMinusProject,
}

impl KlDivergenceKind {
    pub const ALL: [KlDivergenceKind; 3] = [
        KlDivergenceKind::File,
        KlDivergenceKind::Project,
        KlDivergenceKind::FileMinusProject,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            KlDivergenceKind::File => "KLDivFile",
            KlDivergenceKind::Project => "KLDivProj",
            KlDivergenceKind::FileMinusProject => "KLDivFileMinusProj",
        }
    }
}

impl fmt::Display for KlDivergenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KlDivergenceKind {
    type Err = TopicModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "KLDivFile" | "kl-file" => Ok(KlDivergenceKind::File),
            "KLDivProj" | "kl-project" => Ok(KlDivergenceKind::Project),
            "KLDivFileMinusProj" | "kl-file-minus-project" => Ok(KlDivergenceKind::FileMinusProject),
            other => Err(TopicModelError::invalid_config(format!(
                "unknown divergence '{other}' (expected KLDivFile, KLDivProj or KLDivFileMinusProj)"
            ))),
        }
    }
}

/// Empirical token distribution of a node set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmpiricalDistribution {
    counts: BTreeMap<u32, u32>,
    total: u64,
}

impl EmpiricalDistribution {
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a u32>) -> Self {
        let mut dist = Self::default();
        for &token in tokens {
            *dist.counts.entry(token).or_insert(0) += 1;
            dist.total += 1;
        }
        dist
    }

    /// `count / size`, or 0 for an empty distribution.
    pub fn prob(&self, token: u32) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.counts.get(&token).copied().unwrap_or(0) as f64 / self.total as f64
    }

    pub fn support(&self) -> impl Iterator<Item = u32> + '_ {
        self.counts.keys().copied()
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Divergence query bound to one file, reusable across candidate node sets.
///
/// Tokens outside the candidate support back off to a background topic, so
/// their summed contribution is precomputed once and only the support is
/// revisited per query.
#[derive(Debug, Clone)]
pub struct DivergenceQuery<'m> {
    model: &'m TopicModel,
    kind: KlDivergenceKind,
    backoff: TopicId,
    project: usize,
    file: usize,
    baseline: f64,
}

impl<'m> DivergenceQuery<'m> {
    pub fn new(
        model: &'m TopicModel,
        kind: KlDivergenceKind,
        backoff: usize,
        project: &str,
        file: &str,
    ) -> Result<Self> {
        let backoff = TopicId::background(backoff)?;
        let (project, file) = model.locate(project, file)?;
        let mut query = Self {
            model,
            kind,
            backoff,
            project,
            file,
            baseline: 0.0,
        };
        query.baseline = (0..model.vocab_size() as u32)
            .map(|token| query.contribution(token, query.background_prob(token)))
            .sum();
        Ok(query)
    }

    pub fn kind(&self) -> KlDivergenceKind {
        self.kind
    }

    /// Number of nodes in the bound file.
    pub fn node_count(&self) -> usize {
        self.model.corpus.projects[self.project].documents[self.file]
            .sentences
            .len()
    }

    fn phi(&self, topic: TopicId, token: u32) -> f64 {
        self.model.phi_hat(topic, self.project, self.file, token)
    }

    fn background_prob(&self, token: u32) -> f64 {
        self.phi(self.backoff, token)
    }

    /// Contribution of one vocabulary entry given reference probability `q`.
    fn contribution(&self, token: u32, q: f64) -> f64 {
        let term = |p: f64| p * (p / q).ln();
        match self.kind {
            KlDivergenceKind::File => term(self.phi(TopicId::Document, token)),
            KlDivergenceKind::Project => term(self.phi(TopicId::Content, token)),
            KlDivergenceKind::FileMinusProject => {
                term(self.phi(TopicId::Document, token)) - term(self.phi(TopicId::Content, token))
            }
        }
    }

    /// Empirical distribution over the union of the given nodes' tokens.
    pub fn distribution(&self, node_ids: &[usize]) -> Result<EmpiricalDistribution> {
        let document = &self.model.corpus.projects[self.project].documents[self.file];
        let mut tokens = Vec::new();
        for &node in node_ids {
            let sentence = document
                .sentences
                .get(node)
                .ok_or_else(|| TopicModelError::NodeOutOfRange {
                    file: document.path.clone(),
                    node,
                    count: document.sentences.len(),
                })?;
            tokens.extend_from_slice(&sentence.tokens);
        }
        Ok(EmpiricalDistribution::from_tokens(&tokens))
    }

    /// Divergence of the selected topic from the candidate distribution.
    pub fn evaluate(&self, node_ids: &[usize]) -> Result<f64> {
        let dist = self.distribution(node_ids)?;
        let mut value = self.baseline;
        for token in dist.support() {
            if token as usize >= self.model.vocab_size() {
                continue;
            }
            value += self.contribution(token, dist.prob(token))
                - self.contribution(token, self.background_prob(token));
        }
        Ok(value)
    }
}

impl TopicModel {
    /// Divergence between a topic of `file` and the tokens of `node_ids`.
    ///
    /// Tokens missing from the candidate set fall back to background topic
    /// `backoff` (0..3). The result can be negative.
    pub fn kl_divergence(
        &self,
        kind: KlDivergenceKind,
        backoff: usize,
        project: &str,
        file: &str,
        node_ids: &[usize],
    ) -> Result<f64> {
        DivergenceQuery::new(self, kind, backoff, project, file)?.evaluate(node_ids)
    }

    /// Files of `project` ranked by how closely their tokens follow the
    /// project's content topic, keeping the top `ratio_percent` (rounded
    /// down). With `ignore_tests`, paths mentioning `test` or `Test` are
    /// dropped before the cut.
    pub fn salient_files(
        &self,
        project: &str,
        backoff: usize,
        ratio_percent: f64,
        ignore_tests: bool,
    ) -> Result<Vec<SalientFile>> {
        if !(0.0..=100.0).contains(&ratio_percent) {
            return Err(TopicModelError::invalid_config(format!(
                "ratio must be within 0..=100, got {ratio_percent}"
            )));
        }
        if backoff >= N_BACKGROUND {
            return Err(TopicModelError::invalid_config(format!(
                "background topic id {backoff} out of range 0..{N_BACKGROUND}"
            )));
        }
        let p = self
            .corpus
            .project_index(project)
            .ok_or_else(|| TopicModelError::UnknownProject(project.to_string()))?;

        let mut ranked = Vec::new();
        for document in &self.corpus.projects[p].documents {
            if ignore_tests && is_test_path(&document.path) {
                log::debug!("Skipping test file {}", document.path);
                continue;
            }
            let query =
                DivergenceQuery::new(self, KlDivergenceKind::Project, backoff, project, &document.path)?;
            let nodes: Vec<usize> = (0..document.sentences.len()).collect();
            ranked.push(SalientFile {
                path: document.path.clone(),
                score: -query.evaluate(&nodes)?,
            });
        }
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.path.cmp(&b.path)));
        let keep = ((ranked.len() as f64) * ratio_percent / 100.0).floor() as usize;
        ranked.truncate(keep);
        Ok(ranked)
    }
}

fn is_test_path(path: &str) -> bool {
    path.contains("test") || path.contains("Test")
}

/// A file ranked by negated content divergence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalientFile {
    pub path: String,
    pub score: f64,
}
