use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod command;
mod config;
mod report;

use command::fold::FoldArgs;
use command::salient::SalientArgs;
use command::topics::TopicsArgs;
use command::train::TrainArgs;
use config::AppConfig;

#[derive(Parser)]
#[command(name = "autofold")]
#[command(about = "Fold source files down to their most informative regions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML settings file ([extractor], [sampler], [fold])
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Output JSON format (implies --quiet)
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a topic model on a directory of projects
    Train(TrainArgs),

    /// Fold a source file and print the hidden line numbers
    Fold(FoldArgs),

    /// Rank a project's files by how typical they are of the project
    #[command(name = "salient-files")]
    SalientFiles(SalientArgs),

    /// Show the most frequent terms of each topic
    Topics(TopicsArgs),
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Train(args) => command::train::run(args, &config, cli.json)?,
        Commands::Fold(args) => command::fold::run(args, &config, cli.json)?,
        Commands::SalientFiles(args) => command::salient::run(args, &config, cli.json)?,
        Commands::Topics(args) => command::topics::run(args, &config, cli.json)?,
    }

    Ok(())
}
