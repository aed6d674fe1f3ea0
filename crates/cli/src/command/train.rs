use crate::command::print_json;
use crate::config::AppConfig;
use anyhow::{anyhow, Context, Result};
use autofold_indexer::CorpusLoader;
use autofold_topic_model::{train_model, EstimatorKind, N_TOPICS};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct TrainArgs {
    /// Directory holding one subdirectory per project
    #[arg(long)]
    pub projects: PathBuf,

    /// Output path for the trained model (JSON)
    #[arg(long)]
    pub model: PathBuf,

    /// Sampling sweeps
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Re-estimate hyperparameters every N sweeps (0 = never)
    #[arg(long)]
    pub opt_interval: Option<usize>,

    /// Save the model every N sweeps (0 = only at the end)
    #[arg(long)]
    pub save_interval: Option<usize>,

    /// Sweeps before the first hyperparameter re-estimation
    #[arg(long)]
    pub burn_in: Option<usize>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Hyperparameter estimator: mackay-peto|minka
    #[arg(long)]
    pub estimator: Option<EstimatorKind>,

    /// Parser threads (defaults to available parallelism)
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Debug, Serialize)]
struct TrainSummary {
    model: String,
    projects: usize,
    files: usize,
    nodes: usize,
    tokens: usize,
    vocabulary: usize,
    skipped: Vec<String>,
    estimator: &'static str,
    log_likelihood: f64,
    alpha: [f64; N_TOPICS],
    beta: [f64; N_TOPICS],
    time_ms: u64,
}

pub fn run(args: TrainArgs, config: &AppConfig, json: bool) -> Result<()> {
    let mut sampler = config.sampler.clone();
    if let Some(iterations) = args.iterations {
        sampler.iterations = iterations;
    }
    if let Some(interval) = args.opt_interval {
        sampler.opt_interval = interval;
    }
    if let Some(interval) = args.save_interval {
        sampler.save_interval = interval;
    }
    if let Some(burn_in) = args.burn_in {
        sampler.burn_in = burn_in;
    }
    if let Some(seed) = args.seed {
        sampler.seed = Some(seed);
    }
    if let Some(estimator) = args.estimator {
        sampler.estimator = estimator;
    }
    sampler.validate().map_err(|e| anyhow!("invalid sampler settings: {e}"))?;

    let mut loader = CorpusLoader::new(config.extractor.clone());
    if let Some(workers) = args.workers {
        loader = loader.with_workers(workers);
    }
    let (corpus, stats) = loader
        .load(&args.projects)
        .with_context(|| format!("Failed to load projects from {}", args.projects.display()))?;

    log::info!(
        "Training on {} tokens ({} iterations, {} estimator)",
        stats.tokens,
        sampler.iterations,
        sampler.estimator.as_str()
    );
    let started = std::time::Instant::now();
    let model = train_model(corpus, &sampler, Some(&args.model))
        .with_context(|| format!("Training failed for {}", args.projects.display()))?;

    let summary = TrainSummary {
        model: args.model.display().to_string(),
        projects: stats.projects,
        files: stats.files,
        nodes: stats.nodes,
        tokens: stats.tokens,
        vocabulary: model.vocab_size(),
        skipped: stats.skipped,
        estimator: sampler.estimator.as_str(),
        log_likelihood: model.log_likelihood(),
        alpha: *model.alpha(),
        beta: *model.beta(),
        time_ms: started.elapsed().as_millis() as u64 + stats.time_ms,
    };

    if json {
        print_json(&summary)?;
    } else {
        println!(
            "Trained {} on {} projects, {} files, {} nodes, {} tokens",
            summary.model, summary.projects, summary.files, summary.nodes, summary.tokens
        );
        println!("  vocabulary:     {}", summary.vocabulary);
        println!("  log-likelihood: {:.3}", summary.log_likelihood);
        println!("  alpha:          {}", format_params(&summary.alpha));
        println!("  beta:           {}", format_params(&summary.beta));
        if !summary.skipped.is_empty() {
            println!("  skipped:        {}", summary.skipped.join(", "));
        }
    }
    Ok(())
}

pub(crate) fn format_params(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.4}"))
        .collect::<Vec<_>>()
        .join(" ")
}
