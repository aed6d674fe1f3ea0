//! Fixed-point re-estimation of the Dirichlet hyperparameters.
//!
//! Both estimators work from frequency-of-frequency histograms: for topic
//! `k`, `C_k(f)` is the number of contexts in which `k` occurs exactly `f`
//! times. For alpha a context is a node; for beta it is a token id of the
//! vocabulary, with counts pooled over every instance of the topic type.

use crate::error::{Result, TopicModelError};
use crate::topic::N_TOPICS;
use statrs::function::gamma::digamma;
use std::collections::{BTreeMap, HashMap};

/// Convergence threshold on the L2 change of alpha between sweeps
pub const ALPHA_TOLERANCE: f64 = 1e-15;

/// Convergence threshold on the L2 change of beta between sweeps
pub const BETA_TOLERANCE: f64 = 1e-5;

/// Upper bound on fixed-point sweeps per re-estimation
pub const MAX_FIXED_POINT_SWEEPS: usize = 10_000;

/// Outcome of one fixed-point run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPoint {
    pub sweeps: usize,
    pub residual: f64,
    pub converged: bool,
}

/// Node-level topic statistics for re-estimating alpha.
#[derive(Debug, Clone, Default)]
pub struct AlphaStatistics {
    /// node length → number of nodes with that length
    lengths: BTreeMap<u32, u64>,
    frequencies: [BTreeMap<u32, u64>; N_TOPICS],
}

impl AlphaStatistics {
    /// Builds the histograms from the per-topic counts of every node.
    pub fn from_node_counts<'a, I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = &'a [u32; N_TOPICS]>,
    {
        let mut stats = Self::default();
        for counts in nodes {
            let length: u32 = counts.iter().sum();
            *stats.lengths.entry(length).or_insert(0) += 1;
            for (k, &count) in counts.iter().enumerate() {
                if count > 0 {
                    *stats.frequencies[k].entry(count).or_insert(0) += 1;
                }
            }
        }
        stats
    }
}

/// Pooled token statistics for re-estimating beta.
#[derive(Debug, Clone, Default)]
pub struct BetaStatistics {
    vocab_size: usize,
    totals: [u64; N_TOPICS],
    frequencies: [BTreeMap<u32, u64>; N_TOPICS],
}

impl BetaStatistics {
    /// Builds the histograms from per-token counts pooled by topic type.
    pub fn from_pooled_counts(vocab_size: usize, pooled: &[HashMap<u32, u32>; N_TOPICS]) -> Self {
        let mut stats = Self {
            vocab_size,
            ..Default::default()
        };
        for (k, counts) in pooled.iter().enumerate() {
            for &count in counts.values() {
                if count > 0 {
                    stats.totals[k] += count as u64;
                    *stats.frequencies[k].entry(count).or_insert(0) += 1;
                }
            }
        }
        stats
    }
}

/// A procedure that moves hyperparameters to a fixed point of the
/// Dirichlet-multinomial evidence.
pub trait HyperparameterEstimator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Re-estimates `alpha` in place.
    fn estimate_alpha(&self, stats: &AlphaStatistics, alpha: &mut [f64; N_TOPICS])
        -> Result<FixedPoint>;

    /// Re-estimates `beta` in place.
    fn estimate_beta(&self, stats: &BetaStatistics, beta: &mut [f64; N_TOPICS]) -> Result<FixedPoint>;
}

/// Tail sums of a frequency histogram: `V = N(≥1)`,
/// `G = Σ_{f≥2} N(≥f)/(f−1)`, `H = Σ_{f≥2} N(≥f)/(f−1)²`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TailSums {
    v: f64,
    g: f64,
    h: f64,
}

impl TailSums {
    fn of(frequencies: &BTreeMap<u32, u64>) -> Self {
        let Some(&max) = frequencies.keys().next_back() else {
            return Self::default();
        };
        let mut sums = Self::default();
        let mut tail = 0u64;
        for f in (1..=max).rev() {
            tail += frequencies.get(&f).copied().unwrap_or(0);
            if f == 1 {
                sums.v = tail as f64;
            } else {
                let d = (f - 1) as f64;
                sums.g += tail as f64 / d;
                sums.h += tail as f64 / (d * d);
            }
        }
        sums
    }

    /// Positive root of `H x² + (K − G) x − V = 0`.
    fn solve(&self, k: f64) -> f64 {
        let kg = k - self.g;
        2.0 * self.v / (kg + (kg * kg + 4.0 * self.h * self.v).sqrt())
    }
}

fn check_value(name: &str, k: usize, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(TopicModelError::numeric(format!(
            "{name}[{k}] left the positive reals: {value}"
        )))
    }
}

fn not_converged(name: &str, estimator: &str, residual: f64) -> FixedPoint {
    log::warn!(
        "{estimator}: {name} fixed point stopped after {MAX_FIXED_POINT_SWEEPS} sweeps (residual {residual:e})"
    );
    FixedPoint {
        sweeps: MAX_FIXED_POINT_SWEEPS,
        residual,
        converged: false,
    }
}

/// Repeats `sweep` until its L2 step drops to `tolerance`.
///
/// A sweep returns `None` when there is nothing left to update.
fn iterate<F>(name: &str, estimator: &str, tolerance: f64, mut sweep: F) -> Result<FixedPoint>
where
    F: FnMut() -> Result<Option<f64>>,
{
    let mut residual = f64::INFINITY;
    for sweeps in 1..=MAX_FIXED_POINT_SWEEPS {
        match sweep()? {
            None => {
                return Ok(FixedPoint {
                    sweeps,
                    residual: 0.0,
                    converged: true,
                })
            }
            Some(step) => {
                residual = step;
                if residual <= tolerance {
                    return Ok(FixedPoint {
                        sweeps,
                        residual,
                        converged: true,
                    });
                }
            }
        }
    }
    Ok(not_converged(name, estimator, residual))
}

fn chain(first: FixedPoint, second: FixedPoint) -> FixedPoint {
    FixedPoint {
        sweeps: first.sweeps + second.sweeps,
        residual: second.residual,
        converged: second.converged,
    }
}

/// `Σ_f C(f) · (ψ(f + x) − ψ(x))`
fn digamma_numerator(frequencies: &BTreeMap<u32, u64>, x: f64) -> f64 {
    let psi_x = digamma(x);
    frequencies
        .iter()
        .map(|(&f, &contexts)| contexts as f64 * (digamma(f as f64 + x) - psi_x))
        .sum()
}

/// One MacKay & Peto alpha sweep: `K` from the asymptotic expansion of
/// `ψ(n + A) − ψ(A)`, then the quadratic root per topic.
fn closed_form_alpha_sweep(
    stats: &AlphaStatistics,
    tails: &[TailSums],
    alpha: &mut [f64; N_TOPICS],
) -> Result<Option<f64>> {
    let sum: f64 = alpha.iter().sum();
    let k: f64 = stats
        .lengths
        .iter()
        .map(|(&n, &nodes)| {
            let n = n as f64;
            nodes as f64 * (((n + sum) / sum).ln() + 0.5 * n / (sum * (n + sum)))
        })
        .sum();
    let mut squared = 0.0;
    for (topic, tail) in tails.iter().enumerate() {
        if tail.v == 0.0 {
            continue;
        }
        let next = check_value("alpha", topic, tail.solve(k))?;
        squared += (next - alpha[topic]).powi(2);
        alpha[topic] = next;
    }
    Ok(Some(squared.sqrt()))
}

fn closed_form_beta_sweep(
    stats: &BetaStatistics,
    tails: &[TailSums],
    beta: &mut [f64; N_TOPICS],
) -> Result<Option<f64>> {
    let w = stats.vocab_size as f64;
    let mut squared = 0.0;
    for (topic, tail) in tails.iter().enumerate() {
        if tail.v == 0.0 {
            continue;
        }
        let total = stats.totals[topic] as f64;
        let wb = w * beta[topic];
        let k = w * (((total + wb) / wb).ln() + 0.5 * total / (wb * (total + wb)));
        let next = check_value("beta", topic, tail.solve(k))?;
        squared += (next - beta[topic]).powi(2);
        beta[topic] = next;
    }
    Ok(Some(squared.sqrt()))
}

/// One sweep of Minka's update `x ← x · Σ C(f)(ψ(f+x) − ψ(x)) / D`.
fn digamma_alpha_sweep(stats: &AlphaStatistics, alpha: &mut [f64; N_TOPICS]) -> Result<Option<f64>> {
    let sum: f64 = alpha.iter().sum();
    let psi_sum = digamma(sum);
    let denominator: f64 = stats
        .lengths
        .iter()
        .map(|(&n, &nodes)| nodes as f64 * (digamma(n as f64 + sum) - psi_sum))
        .sum();
    if denominator <= 0.0 {
        return Ok(None);
    }
    let mut squared = 0.0;
    for topic in 0..N_TOPICS {
        if stats.frequencies[topic].is_empty() {
            continue;
        }
        let numerator = digamma_numerator(&stats.frequencies[topic], alpha[topic]);
        let next = check_value("alpha", topic, alpha[topic] * numerator / denominator)?;
        squared += (next - alpha[topic]).powi(2);
        alpha[topic] = next;
    }
    Ok(Some(squared.sqrt()))
}

fn digamma_beta_sweep(stats: &BetaStatistics, beta: &mut [f64; N_TOPICS]) -> Result<Option<f64>> {
    let w = stats.vocab_size as f64;
    let mut squared = 0.0;
    for topic in 0..N_TOPICS {
        if stats.frequencies[topic].is_empty() {
            continue;
        }
        let total = stats.totals[topic] as f64;
        let wb = w * beta[topic];
        let denominator = w * (digamma(total + wb) - digamma(wb));
        let numerator = digamma_numerator(&stats.frequencies[topic], beta[topic]);
        let next = check_value("beta", topic, beta[topic] * numerator / denominator)?;
        squared += (next - beta[topic]).powi(2);
        beta[topic] = next;
    }
    Ok(Some(squared.sqrt()))
}

/// MacKay & Peto's closed-form fixed point.
///
/// The closed form replaces `ψ(n + x) − ψ(x)` by truncated expansions, which
/// drift from the exact optimum when the hyperparameters are small. Once it
/// settles, the estimate is finished with digamma sweeps, so both estimators
/// end on the same stationary point of the evidence.
#[derive(Debug, Clone, Copy)]
pub struct MacKayPeto {
    pub alpha_tolerance: f64,
    pub beta_tolerance: f64,
}

impl Default for MacKayPeto {
    fn default() -> Self {
        Self {
            alpha_tolerance: ALPHA_TOLERANCE,
            beta_tolerance: BETA_TOLERANCE,
        }
    }
}

impl HyperparameterEstimator for MacKayPeto {
    fn name(&self) -> &'static str {
        "mackay-peto"
    }

    fn estimate_alpha(
        &self,
        stats: &AlphaStatistics,
        alpha: &mut [f64; N_TOPICS],
    ) -> Result<FixedPoint> {
        let tails: Vec<TailSums> = stats.frequencies.iter().map(TailSums::of).collect();
        let closed = iterate("alpha", self.name(), self.alpha_tolerance, || {
            closed_form_alpha_sweep(stats, &tails, alpha)
        })?;
        let exact = iterate("alpha", self.name(), self.alpha_tolerance, || {
            digamma_alpha_sweep(stats, alpha)
        })?;
        Ok(chain(closed, exact))
    }

    fn estimate_beta(&self, stats: &BetaStatistics, beta: &mut [f64; N_TOPICS]) -> Result<FixedPoint> {
        let tails: Vec<TailSums> = stats.frequencies.iter().map(TailSums::of).collect();
        let closed = iterate("beta", self.name(), self.beta_tolerance, || {
            closed_form_beta_sweep(stats, &tails, beta)
        })?;
        let exact = iterate("beta", self.name(), self.beta_tolerance, || {
            digamma_beta_sweep(stats, beta)
        })?;
        Ok(chain(closed, exact))
    }
}

/// Minka's digamma fixed point.
#[derive(Debug, Clone, Copy)]
pub struct Minka {
    pub alpha_tolerance: f64,
    pub beta_tolerance: f64,
}

impl Default for Minka {
    fn default() -> Self {
        Self {
            alpha_tolerance: ALPHA_TOLERANCE,
            beta_tolerance: BETA_TOLERANCE,
        }
    }
}

impl HyperparameterEstimator for Minka {
    fn name(&self) -> &'static str {
        "minka"
    }

    fn estimate_alpha(
        &self,
        stats: &AlphaStatistics,
        alpha: &mut [f64; N_TOPICS],
    ) -> Result<FixedPoint> {
        iterate("alpha", self.name(), self.alpha_tolerance, || {
            digamma_alpha_sweep(stats, alpha)
        })
    }

    fn estimate_beta(&self, stats: &BetaStatistics, beta: &mut [f64; N_TOPICS]) -> Result<FixedPoint> {
        iterate("beta", self.name(), self.beta_tolerance, || {
            digamma_beta_sweep(stats, beta)
        })
    }
}
