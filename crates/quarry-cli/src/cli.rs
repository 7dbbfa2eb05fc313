//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Quarry CLI - Extract and index file metadata.
#[derive(Debug, Parser)]
#[command(name = "quarry")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "QUARRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Metadata database path
    #[arg(long, global = true, env = "QUARRY_DB")]
    pub database: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (identifiers only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract metadata from one file and print it
    Extract(ExtractArgs),

    /// Extract metadata from files and store it
    Index(IndexArgs),

    /// Show the index size and recorded extraction failures
    Status(StatusArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// File to extract
    pub file: PathBuf,

    /// MIME type to use instead of guessing from the extension
    #[arg(short, long)]
    pub mimetype: Option<String>,

    /// Content identifier to use instead of the path-derived one
    #[arg(long)]
    pub content_id: Option<String>,

    /// Destination graph
    #[arg(short, long)]
    pub graph: Option<String>,

    /// Maximum bytes of text content (0 for unlimited)
    #[arg(long)]
    pub max_text: Option<i64>,
}

/// Arguments for the index command.
#[derive(Debug, Parser)]
pub struct IndexArgs {
    /// Files to index
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Destination graph
    #[arg(short, long)]
    pub graph: Option<String>,
}

/// Arguments for the status command.
#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Only show failures whose path or URI contains one of these terms
    pub terms: Vec<String>,

    /// Show resource counts per type instead
    #[arg(long)]
    pub stat: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
