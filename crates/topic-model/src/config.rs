use crate::hyperparams::{HyperparameterEstimator, MacKayPeto, Minka};
use crate::topic::N_TOPICS;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Initial document-topic Dirichlet parameters (background ×3, content, document)
pub const DEFAULT_ALPHA: [f64; N_TOPICS] = [1.7, 1.7, 1.7, 2.3, 2.6];

/// Initial topic-word Dirichlet parameters (background ×3, content, document)
pub const DEFAULT_BETA: [f64; N_TOPICS] = [1.0, 1.0, 1.0, 0.1, 0.01];

/// Configuration for Gibbs sampling and hyperparameter optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Number of sampling sweeps before the final argmax sweep
    pub iterations: usize,

    /// Re-estimate alpha and beta every this many sweeps (0 = never)
    pub opt_interval: usize,

    /// Sweeps to run before the first hyperparameter re-estimation
    pub burn_in: usize,

    /// Persist the model every this many sweeps (0 = only at the end)
    pub save_interval: usize,

    /// Log the model log-likelihood every this many sweeps (0 = never)
    pub likelihood_interval: usize,

    /// RNG seed; `None` draws one from the OS
    pub seed: Option<u64>,

    /// Fixed-point procedure for hyperparameter re-estimation
    pub estimator: EstimatorKind,

    pub initial_alpha: [f64; N_TOPICS],
    pub initial_beta: [f64; N_TOPICS],
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            opt_interval: 10,
            burn_in: 500,
            save_interval: 0,
            likelihood_interval: 10,
            seed: None,
            estimator: EstimatorKind::MacKayPeto,
            initial_alpha: DEFAULT_ALPHA,
            initial_beta: DEFAULT_BETA,
        }
    }
}

impl SamplerConfig {
    /// Short deterministic run, for smoke tests and tiny corpora
    pub fn for_quick_run(seed: u64) -> Self {
        Self {
            iterations: 50,
            opt_interval: 5,
            burn_in: 10,
            likelihood_interval: 0,
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.iterations == 0 {
            return Err("iterations must be > 0".to_string());
        }

        for (k, &a) in self.initial_alpha.iter().enumerate() {
            if !(a.is_finite() && a > 0.0) {
                return Err(format!("initial_alpha[{k}] must be positive, got {a}"));
            }
        }

        for (k, &b) in self.initial_beta.iter().enumerate() {
            if !(b.is_finite() && b > 0.0) {
                return Err(format!("initial_beta[{k}] must be positive, got {b}"));
            }
        }

        Ok(())
    }
}

/// Hyperparameter estimation procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EstimatorKind {
    #[default]
    MacKayPeto,
    Minka,
}

impl EstimatorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EstimatorKind::MacKayPeto => "mackay-peto",
            EstimatorKind::Minka => "minka",
        }
    }

    pub fn estimator(self) -> Box<dyn HyperparameterEstimator> {
        match self {
            EstimatorKind::MacKayPeto => Box::new(MacKayPeto::default()),
            EstimatorKind::Minka => Box::new(Minka::default()),
        }
    }
}

impl FromStr for EstimatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mackay-peto" | "mackay" | "mackaypeto" => Ok(EstimatorKind::MacKayPeto),
            "minka" => Ok(EstimatorKind::Minka),
            other => Err(format!("unknown estimator '{other}'")),
        }
    }
}
