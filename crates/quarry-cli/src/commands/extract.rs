//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use quarry_domain::Resource;
use quarry_extract::ExtractorRegistry;
use quarry_miner::{FileTask, Miner};
use quarry_store::SqliteStore;
use std::sync::Arc;

/// Execute the extract command.
///
/// Runs the extractor for one file and prints the resulting resource graph
/// without touching the metadata database or the error reports.
pub async fn execute_extract(
    args: ExtractArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    match extract_resource(args, config).await? {
        Some(resource) => println!("{}", formatter.format_resource(&resource)?),
        None => eprintln!("{}", formatter.info("No metadata extracted")),
    }

    Ok(())
}

/// Run the built-in extractors on one file and return what they attached.
///
/// Every MIME type reaches an extractor: types without a dedicated one fall
/// back to plain file metadata.
pub async fn extract_resource(
    args: ExtractArgs,
    config: &Config,
) -> Result<Option<Arc<Resource>>> {
    let mut miner_config = config.miner.clone();
    if let Some(max_text) = args.max_text {
        miner_config.max_text_size = max_text;
    }

    let store = SqliteStore::new(":memory:")?;
    let miner = Miner::new(ExtractorRegistry::with_builtins(), store, miner_config)?;

    let mut task = FileTask::new(&args.file);
    if let Some(mimetype) = args.mimetype {
        task = task.with_mimetype(mimetype);
    }
    if let Some(content_id) = args.content_id {
        task = task.with_content_id(content_id);
    }
    if let Some(graph) = args.graph {
        task = task.with_graph(graph);
    }

    let ctx = miner.extract(&task).await?;
    Ok(ctx.resource())
}
