//! Status command implementation.

use super::open_store;
use crate::cli::StatusArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use quarry_domain::MetadataStore;
use std::path::Path;

/// Execute the status command.
///
/// With `--stat` prints resource counts per type; otherwise prints the index
/// size followed by the recorded extraction failures matching `terms`.
pub async fn execute_status(
    args: StatusArgs,
    config: &Config,
    database: &Path,
    formatter: &Formatter,
) -> Result<()> {
    let store = open_store(database)?;

    if args.stat {
        let counts = store.type_counts()?;
        println!("{}", formatter.format_type_counts(&counts)?);
        return Ok(());
    }

    let reports = config.reports()?.list(&args.terms)?;
    println!(
        "{}",
        formatter.format_status(store.resource_count()?, reports.len())?
    );
    println!("{}", formatter.format_reports(&reports)?);

    Ok(())
}
