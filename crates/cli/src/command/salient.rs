use crate::command::print_json;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use autofold_topic_model::TopicModel;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct SalientArgs {
    /// Trained model
    #[arg(long)]
    pub model: PathBuf,

    /// Project to rank
    #[arg(long)]
    pub project: String,

    /// Percentage of the project's files to keep
    #[arg(long, default_value_t = 100.0)]
    pub ratio: f64,

    /// Background topic for terms the model never assigned (0-2)
    #[arg(long)]
    pub backoff_topic: Option<usize>,

    /// Skip files whose path mentions "test" or "Test"
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub ignore_tests: bool,
}

pub fn run(args: SalientArgs, config: &AppConfig, json: bool) -> Result<()> {
    let model = TopicModel::load(&args.model)
        .with_context(|| format!("Failed to load model {}", args.model.display()))?;
    let backoff = args.backoff_topic.unwrap_or(config.fold.backoff_topic);
    let ranked = model.salient_files(&args.project, backoff, args.ratio, args.ignore_tests)?;
    log::debug!("{} salient files in {}", ranked.len(), args.project);

    if json {
        print_json(&ranked)?;
    } else {
        for file in &ranked {
            println!("{:>10.4}  {}", file.score, file.path);
        }
    }
    Ok(())
}
