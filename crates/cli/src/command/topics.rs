use crate::command::print_json;
use crate::command::train::format_params;
use crate::config::AppConfig;
use anyhow::{bail, Context, Result};
use autofold_topic_model::{TopicModel, TopicSummary, N_TOPICS};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct TopicsArgs {
    /// Trained model
    #[arg(long)]
    pub model: PathBuf,

    /// Terms to show per topic
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Also show this project's content topic
    #[arg(long)]
    pub project: Option<String>,

    /// Also show this file's document topic (needs --project)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(Debug, Serialize)]
struct TermCount {
    term: String,
    count: u32,
}

#[derive(Debug, Serialize)]
struct TopicReport {
    topic: String,
    total: u64,
    terms: Vec<TermCount>,
}

impl From<TopicSummary> for TopicReport {
    fn from(summary: TopicSummary) -> Self {
        Self {
            topic: summary.topic.to_string(),
            total: summary.total,
            terms: summary
                .terms
                .into_iter()
                .map(|(term, count)| TermCount { term, count })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TopicsReport {
    vocabulary: usize,
    projects: usize,
    documents: usize,
    log_likelihood: f64,
    alpha: [f64; N_TOPICS],
    beta: [f64; N_TOPICS],
    topics: Vec<TopicReport>,
}

pub fn run(args: TopicsArgs, _config: &AppConfig, json: bool) -> Result<()> {
    let model = TopicModel::load(&args.model)
        .with_context(|| format!("Failed to load model {}", args.model.display()))?;

    let mut summaries = model.background_summaries(args.top);
    match (&args.project, &args.file) {
        (Some(project), file) => {
            summaries.push(model.content_summary(project, args.top)?);
            if let Some(file) = file {
                summaries.push(model.document_summary(project, file, args.top)?);
            }
        }
        (None, Some(_)) => bail!("--file needs --project"),
        (None, None) => {}
    }

    let report = TopicsReport {
        vocabulary: model.vocab_size(),
        projects: model.corpus().projects().len(),
        documents: model.corpus().document_count(),
        log_likelihood: model.log_likelihood(),
        alpha: *model.alpha(),
        beta: *model.beta(),
        topics: summaries.into_iter().map(TopicReport::from).collect(),
    };

    if json {
        return print_json(&report);
    }

    println!(
        "{} projects, {} documents, {} terms, log-likelihood {:.3}",
        report.projects, report.documents, report.vocabulary, report.log_likelihood
    );
    println!("alpha: {}", format_params(&report.alpha));
    println!("beta:  {}", format_params(&report.beta));
    for topic in &report.topics {
        let terms = topic
            .terms
            .iter()
            .map(|t| format!("{}({})", t.term, t.count))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{} [{} tokens]: {terms}", topic.topic, topic.total);
    }
    Ok(())
}
