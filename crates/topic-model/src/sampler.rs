use crate::config::SamplerConfig;
use crate::corpus::Corpus;
use crate::error::{Result, TopicModelError};
use crate::hyperparams::HyperparameterEstimator;
use crate::model::TopicModel;
use crate::topic::N_TOPICS;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::time::Instant;

/// Collapsed Gibbs sampler over a [`TopicModel`].
///
/// Token updates mutate shared topic tables in place, so a sweep is strictly
/// sequential in corpus order.
pub struct GibbsSampler {
    model: TopicModel,
    config: SamplerConfig,
    estimator: Box<dyn HyperparameterEstimator>,
    rng: StdRng,
}

impl GibbsSampler {
    /// Sampler over a fresh corpus; call [`initialize`](Self::initialize)
    /// before sweeping.
    pub fn new(corpus: Corpus, config: SamplerConfig) -> Result<Self> {
        config.validate().map_err(TopicModelError::InvalidConfig)?;
        let model = TopicModel::untrained(corpus, &config);
        Ok(Self::with_model(model, config))
    }

    /// Continues sampling from an existing assignment, e.g. a loaded model.
    pub fn resume(model: TopicModel, config: SamplerConfig) -> Result<Self> {
        config.validate().map_err(TopicModelError::InvalidConfig)?;
        Ok(Self::with_model(model, config))
    }

    fn with_model(model: TopicModel, config: SamplerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            estimator: config.estimator.estimator(),
            model,
            config,
            rng,
        }
    }

    #[must_use]
    pub fn with_estimator(mut self, estimator: Box<dyn HyperparameterEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn model(&self) -> &TopicModel {
        &self.model
    }

    pub fn into_model(self) -> TopicModel {
        self.model
    }

    /// Assigns every token a uniformly random topic.
    pub fn initialize(&mut self) {
        let TopicModel { corpus, tables, .. } = &mut self.model;
        for (p, project) in corpus.projects.iter_mut().enumerate() {
            for (f, document) in project.documents.iter_mut().enumerate() {
                for sentence in document.sentences.iter_mut() {
                    sentence.topic_counts = [0; N_TOPICS];
                    for i in 0..sentence.tokens.len() {
                        let k = self.rng.gen_range(0..N_TOPICS);
                        sentence.topics[i] = k as u8;
                        sentence.topic_counts[k] += 1;
                        tables.get_mut(k, p, f).add(sentence.tokens[i]);
                    }
                }
            }
        }
    }

    /// One pass over every token. The final pass assigns each token its most
    /// probable topic instead of sampling.
    pub fn sweep(&mut self, final_pass: bool) -> Result<()> {
        let vocab_size = self.model.vocab_size;
        let alpha = self.model.alpha;
        let beta = self.model.beta;
        let alpha_sum: f64 = alpha.iter().sum();
        let TopicModel { corpus, tables, .. } = &mut self.model;

        for (p, project) in corpus.projects.iter_mut().enumerate() {
            for (f, document) in project.documents.iter_mut().enumerate() {
                for sentence in document.sentences.iter_mut() {
                    let length = sentence.tokens.len() as f64;
                    for i in 0..sentence.tokens.len() {
                        let token = sentence.tokens[i];
                        let old = sentence.topics[i] as usize;
                        tables.get_mut(old, p, f).remove(token);
                        sentence.topic_counts[old] -= 1;

                        let mut weights = [0.0; N_TOPICS];
                        for (k, weight) in weights.iter_mut().enumerate() {
                            let phi = tables.get(k, p, f).phi_hat(token, beta[k], vocab_size);
                            let theta =
                                (sentence.topic_counts[k] as f64 + alpha[k]) / (length + alpha_sum);
                            *weight = phi * theta;
                        }

                        let next = if final_pass {
                            argmax(&weights, token)?
                        } else {
                            draw(&weights, token, &mut self.rng)?
                        };
                        tables.get_mut(next, p, f).add(token);
                        sentence.topic_counts[next] += 1;
                        sentence.topics[i] = next as u8;
                    }
                }
            }
        }
        Ok(())
    }

    /// Re-estimates alpha and beta from the current assignment.
    pub fn optimize_hyperparameters(&mut self) -> Result<()> {
        let alpha_stats = self.model.alpha_statistics();
        let beta_stats = self.model.beta_statistics();
        let a = self
            .estimator
            .estimate_alpha(&alpha_stats, &mut self.model.alpha)?;
        let b = self
            .estimator
            .estimate_beta(&beta_stats, &mut self.model.beta)?;
        log::debug!(
            "{}: alpha={:?} ({} sweeps) beta={:?} ({} sweeps)",
            self.estimator.name(),
            self.model.alpha,
            a.sweeps,
            self.model.beta,
            b.sweeps
        );
        Ok(())
    }

    /// Runs the configured number of sweeps, then the final argmax sweep.
    ///
    /// With `save_path`, the model is persisted every `save_interval` sweeps
    /// (starting with sweep 0) and once more at the end.
    pub fn estimate(&mut self, save_path: Option<&Path>) -> Result<()> {
        let start = Instant::now();
        let iterations = self.config.iterations;
        let opt_interval = self.config.opt_interval;
        let burn_in = self.config.burn_in;
        let save_interval = self.config.save_interval;
        let likelihood_interval = self.config.likelihood_interval;

        log::info!(
            "Gibbs sampling: {} sweeps over {} tokens ({} nodes, {} files, {} terms)",
            iterations,
            self.model.corpus.token_count(),
            self.model.corpus.sentence_count(),
            self.model.corpus.document_count(),
            self.model.vocab_size
        );

        for i in 0..iterations {
            self.sweep(false)?;

            if is_due(i, save_interval) {
                if let Some(path) = save_path {
                    self.model.save(path)?;
                    log::debug!("sweep {i}: saved model to {}", path.display());
                }
            }

            if is_due(i, likelihood_interval) {
                log::debug!("sweep {i}: log-likelihood {:.4}", self.model.log_likelihood());
            }

            if i >= burn_in && is_due(i, opt_interval) {
                self.optimize_hyperparameters()?;
            }
        }

        self.sweep(true)?;
        log::info!(
            "Sampling finished in {:.1}s, log-likelihood {:.4}",
            start.elapsed().as_secs_f64(),
            self.model.log_likelihood()
        );

        if let Some(path) = save_path {
            self.model.save(path)?;
            log::info!("Saved model to {}", path.display());
        }
        Ok(())
    }
}

/// Periodic work runs on sweeps 0, interval, 2·interval, ...; 0 disables it.
fn is_due(sweep: usize, interval: usize) -> bool {
    interval > 0 && sweep % interval == 0
}

fn check_weights(weights: &[f64; N_TOPICS], token: u32) -> Result<f64> {
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        Ok(sum)
    } else {
        Err(TopicModelError::numeric(format!(
            "sampling weights for token {token} sum to {sum}: {weights:?}"
        )))
    }
}

/// Cumulative-weight draw.
fn draw(weights: &[f64; N_TOPICS], token: u32, rng: &mut impl Rng) -> Result<usize> {
    let sum = check_weights(weights, token)?;
    let target = rng.gen::<f64>() * sum;
    let mut cumulative = 0.0;
    let mut last = 0;
    for (k, &w) in weights.iter().enumerate() {
        if w > 0.0 {
            last = k;
            cumulative += w;
            if target < cumulative {
                return Ok(k);
            }
        }
    }
    Ok(last)
}

/// First topic with the largest weight.
fn argmax(weights: &[f64; N_TOPICS], token: u32) -> Result<usize> {
    check_weights(weights, token)?;
    let mut best = 0;
    for (k, &w) in weights.iter().enumerate().skip(1) {
        if w > weights[best] {
            best = k;
        }
    }
    Ok(best)
}

/// Trains a model on `corpus`: random initialisation, `config.iterations`
/// sampling sweeps with periodic hyperparameter re-estimation, final argmax
/// sweep.
pub fn train_model(corpus: Corpus, config: &SamplerConfig, save_path: Option<&Path>) -> Result<TopicModel> {
    let mut sampler = GibbsSampler::new(corpus, config.clone())?;
    sampler.initialize();
    sampler.estimate(save_path)?;
    Ok(sampler.into_model())
}
