//! Index command implementation.

use super::open_store;
use crate::cli::IndexArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use quarry_extract::ExtractorRegistry;
use quarry_miner::{FileTask, Miner};
use std::path::Path;

/// Execute the index command.
pub async fn execute_index(
    args: IndexArgs,
    config: &Config,
    database: &Path,
    formatter: &Formatter,
) -> Result<()> {
    let store = open_store(database)?;
    let miner = Miner::new(ExtractorRegistry::with_builtins(), store, config.miner.clone())?
        .with_reports(config.reports()?);

    let tasks: Vec<FileTask> = args
        .files
        .into_iter()
        .map(|path| match &args.graph {
            Some(graph) => FileTask::new(path).with_graph(graph.clone()),
            None => FileTask::new(path),
        })
        .collect();
    let total = tasks.len();

    let results = miner.index(tasks).await;
    println!("{}", formatter.format_index_results(&results)?);
    tracing::debug!("{}", miner.metrics().summary());

    let failed = results.iter().filter(|entry| entry.result.is_err()).count();
    if failed > 0 {
        return Err(CliError::PartialFailure { failed, total });
    }

    Ok(())
}
