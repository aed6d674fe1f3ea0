use crate::alphabet::TermAlphabet;
use crate::config::SamplerConfig;
use crate::corpus::Corpus;
use crate::error::{Result, TopicModelError};
use crate::hyperparams::{AlphaStatistics, BetaStatistics};
use crate::topic::{Topic, TopicId, TopicTables, N_BACKGROUND, N_TOPICS};
use statrs::function::gamma::ln_gamma;
use std::collections::HashMap;
use std::sync::Arc;

/// Trained (or training) state of the five-topic model.
///
/// Read-only after training, so one model can back any number of
/// concurrent folding runs.
#[derive(Debug, Clone)]
pub struct TopicModel {
    pub(crate) corpus: Corpus,
    pub(crate) tables: TopicTables,
    pub(crate) alpha: [f64; N_TOPICS],
    pub(crate) beta: [f64; N_TOPICS],
    /// Vocabulary size frozen when training started.
    pub(crate) vocab_size: usize,
}

/// Most frequent terms of one topic instance.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSummary {
    pub topic: TopicId,
    pub total: u64,
    pub terms: Vec<(String, u32)>,
}

impl TopicModel {
    /// Model with empty count tables shaped after `corpus`.
    pub(crate) fn untrained(corpus: Corpus, config: &SamplerConfig) -> Self {
        let tables = TopicTables::shaped(corpus.projects.iter().map(|p| p.documents.len()));
        let vocab_size = corpus.alphabet().len();
        Self {
            corpus,
            tables,
            alpha: config.initial_alpha,
            beta: config.initial_beta,
            vocab_size,
        }
    }

    pub fn alphabet(&self) -> &Arc<TermAlphabet> {
        self.corpus.alphabet()
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn tables(&self) -> &TopicTables {
        &self.tables
    }

    pub fn alpha(&self) -> &[f64; N_TOPICS] {
        &self.alpha
    }

    pub fn beta(&self) -> &[f64; N_TOPICS] {
        &self.beta
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Resolves a project name and file path to table indices.
    pub fn locate(&self, project: &str, file: &str) -> Result<(usize, usize)> {
        let p = self
            .corpus
            .project_index(project)
            .ok_or_else(|| TopicModelError::UnknownProject(project.to_string()))?;
        let f = self.corpus.projects[p]
            .document_index(file)
            .ok_or_else(|| TopicModelError::UnknownDocument {
                project: project.to_string(),
                file: file.to_string(),
            })?;
        Ok((p, f))
    }

    pub(crate) fn topic(&self, topic: TopicId, project: usize, file: usize) -> &Topic {
        self.tables.get(topic.index(), project, file)
    }

    /// Smoothed probability of `token` under `topic` as seen from `(project, file)`.
    pub fn phi_hat(&self, topic: TopicId, project: usize, file: usize, token: u32) -> f64 {
        let k = topic.index();
        self.topic(topic, project, file)
            .phi_hat(token, self.beta[k], self.vocab_size)
    }

    /// Smoothed share of `topic` among the tokens of one node.
    pub fn theta_hat(&self, project: usize, file: usize, node: usize, topic: TopicId) -> Result<f64> {
        let document = self
            .corpus
            .projects
            .get(project)
            .and_then(|p| p.documents.get(file))
            .ok_or_else(|| TopicModelError::invalid_config(format!("no file {project}/{file}")))?;
        let sentence = document
            .sentences
            .get(node)
            .ok_or_else(|| TopicModelError::NodeOutOfRange {
                file: document.path.clone(),
                node,
                count: document.sentences.len(),
            })?;
        let k = topic.index();
        let alpha_sum: f64 = self.alpha.iter().sum();
        Ok((sentence.topic_counts[k] as f64 + self.alpha[k]) / (sentence.len() as f64 + alpha_sum))
    }

    /// Log evidence of the current assignment under the Dirichlet-multinomial
    /// model, for progress reporting.
    pub fn log_likelihood(&self) -> f64 {
        let w = self.vocab_size as f64;
        let mut ll = 0.0;

        let instances = self
            .tables
            .background
            .iter()
            .enumerate()
            .chain(self.tables.content.iter().map(|t| (TopicId::Content.index(), t)))
            .chain(
                self.tables
                    .document
                    .iter()
                    .flatten()
                    .map(|t| (TopicId::Document.index(), t)),
            );
        for (k, topic) in instances {
            let b = self.beta[k];
            ll += ln_gamma(w * b) - ln_gamma(topic.total() as f64 + w * b);
            let ln_gamma_b = ln_gamma(b);
            for &count in topic.counts().values() {
                ll += ln_gamma(count as f64 + b) - ln_gamma_b;
            }
        }

        let alpha_sum: f64 = self.alpha.iter().sum();
        let ln_gamma_alpha: Vec<f64> = self.alpha.iter().map(|&a| ln_gamma(a)).collect();
        let ln_gamma_sum = ln_gamma(alpha_sum);
        for sentence in self.corpus.sentences() {
            ll += ln_gamma_sum - ln_gamma(sentence.len() as f64 + alpha_sum);
            for (k, &count) in sentence.topic_counts.iter().enumerate() {
                if count > 0 {
                    ll += ln_gamma(count as f64 + self.alpha[k]) - ln_gamma_alpha[k];
                }
            }
        }
        ll
    }

    pub(crate) fn alpha_statistics(&self) -> AlphaStatistics {
        AlphaStatistics::from_node_counts(self.corpus.sentences().map(|s| &s.topic_counts))
    }

    pub(crate) fn beta_statistics(&self) -> BetaStatistics {
        let pooled: [HashMap<u32, u32>; N_TOPICS] =
            std::array::from_fn(|k| self.tables.pooled_counts(k));
        BetaStatistics::from_pooled_counts(self.vocab_size, &pooled)
    }

    /// Top `n` terms of every background topic.
    pub fn background_summaries(&self, n: usize) -> Vec<TopicSummary> {
        (0..N_BACKGROUND)
            .map(|k| self.summarize(TopicId::Background(k as u8), &self.tables.background[k], n))
            .collect()
    }

    /// Top `n` terms of a project's content topic.
    pub fn content_summary(&self, project: &str, n: usize) -> Result<TopicSummary> {
        let p = self
            .corpus
            .project_index(project)
            .ok_or_else(|| TopicModelError::UnknownProject(project.to_string()))?;
        Ok(self.summarize(TopicId::Content, &self.tables.content[p], n))
    }

    /// Top `n` terms of a file's document topic.
    pub fn document_summary(&self, project: &str, file: &str, n: usize) -> Result<TopicSummary> {
        let (p, f) = self.locate(project, file)?;
        Ok(self.summarize(TopicId::Document, &self.tables.document[p][f], n))
    }

    fn summarize(&self, id: TopicId, topic: &Topic, n: usize) -> TopicSummary {
        let alphabet = self.alphabet();
        let terms = topic
            .top_tokens(n)
            .into_iter()
            .map(|(token, count)| {
                let term = alphabet.term(token).unwrap_or_else(|| format!("#{token}"));
                (term, count)
            })
            .collect();
        TopicSummary {
            topic: id,
            total: topic.total(),
            terms,
        }
    }
}
