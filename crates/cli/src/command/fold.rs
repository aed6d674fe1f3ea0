use crate::command::print_json;
use crate::config::AppConfig;
use crate::report::FoldReport;
use anyhow::{anyhow, bail, Context, Result};
use autofold_extractor::{extract, Language};
use autofold_folding::{fold, PolicyKind, TopicTarget};
use autofold_topic_model::TopicModel;
use clap::Args;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct FoldArgs {
    /// Source file to fold
    pub file: PathBuf,

    /// Percentage of lines to fold away (0-100)
    #[arg(long)]
    pub compression: Option<f64>,

    /// Unfolding policy: topic|vsm|shallowest|largest|javadocs
    #[arg(long)]
    pub policy: Option<PolicyKind>,

    /// Trained model, required by the topic policy
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Project the file belongs to in the model
    #[arg(long)]
    pub project: Option<String>,

    /// Path of the file inside its project, as recorded at training time
    #[arg(long)]
    pub relative_path: Option<String>,

    /// Divergence: KLDivFile|KLDivProj|KLDivFileMinusProj
    #[arg(long)]
    pub profit: Option<String>,

    /// Background topic for terms the model never assigned (0-2)
    #[arg(long)]
    pub backoff_topic: Option<usize>,
}

pub fn run(args: FoldArgs, config: &AppConfig, json: bool) -> Result<()> {
    let mut settings = config.fold.clone();
    if let Some(ratio) = args.compression {
        settings.compression_ratio = ratio;
    }
    if let Some(policy) = args.policy {
        settings.policy = policy;
    }
    if let Some(profit) = &args.profit {
        settings.profit = profit.clone();
    }
    if let Some(backoff) = args.backoff_topic {
        settings.backoff_topic = backoff;
    }
    settings.validate().map_err(|e| anyhow!("invalid fold settings: {e}"))?;

    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let language = Language::from_path(&args.file);
    let extracted = extract(&source, language, &config.extractor)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;
    let line_count = extracted.line_count();
    let budget = settings.budget_for(line_count)?;
    let file_terms = extracted.file_terms();

    let model = match &args.model {
        Some(path) if settings.policy.needs_model() => Some(
            TopicModel::load(path)
                .with_context(|| format!("Failed to load model {}", path.display()))?,
        ),
        Some(_) => {
            log::warn!("--model is ignored by the {} policy", settings.policy);
            None
        }
        None => None,
    };
    let project = args.project.clone().unwrap_or_default();
    let relative = args
        .relative_path
        .clone()
        .unwrap_or_else(|| args.file.to_string_lossy().replace('\\', "/"));

    let target = match &model {
        Some(model) => {
            if project.is_empty() {
                bail!("--project is required with --model");
            }
            let (p, d) = model.locate(&project, &relative)?;
            let trained_nodes = model.corpus().projects()[p].documents()[d].sentences().len();
            if trained_nodes != extracted.regions().len() {
                bail!(
                    "{} has {} regions but the model recorded {} for {project}/{relative}; \
                     was it trained with the same file and extractor settings?",
                    args.file.display(),
                    extracted.regions().len(),
                    trained_nodes
                );
            }
            Some(TopicTarget {
                model,
                project: &project,
                file: &relative,
            })
        }
        None => None,
    };

    let policy = settings.build_policy(&file_terms, target)?;
    let outcome = fold(extracted.into_regions(), budget, &policy)?;
    log::info!(
        "{}: {} lines, budget {budget}, spent {} in {} rounds",
        args.file.display(),
        line_count,
        outcome.spent(),
        outcome.rounds()
    );

    let report = FoldReport::new(
        args.file.display().to_string(),
        language.as_str(),
        settings.policy.as_str(),
        line_count,
        &outcome,
    );
    if json {
        print_json(&report)?;
    } else {
        println!("{}", report.folded_lines_text());
    }
    Ok(())
}
