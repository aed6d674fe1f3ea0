//! Subcommand implementations. Each module owns its clap arguments and a
//! `run` entry point taking the loaded [`AppConfig`](crate::config::AppConfig).

pub mod fold;
pub mod salient;
pub mod topics;
pub mod train;

use anyhow::Result;
use serde::Serialize;

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
