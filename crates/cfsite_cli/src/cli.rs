//! Command-line surface.

use cfsite_core::InquiryStatus;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cfsite", version, about = "Site content and dashboard operator tool")]
pub struct Cli {
    /// Optional TOML config file; `CFSITE__*` environment variables override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check core linkage.
    Ping,
    /// Print the core version.
    Version,
    /// Print the content payload stored under a key.
    Content { key: String },
    /// Print dashboard statistics.
    Stats,
    /// Upsert content from a JSON file of `{ "<key>": { ...payload } }`.
    Seed { file: PathBuf },
    /// List inquiries, newest first.
    Inquiries {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Post a test notification to the configured webhook endpoint.
    WebhookTest {
        /// Overrides `webhook.endpoint`.
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    New,
    Contacted,
    Closed,
}

impl From<StatusArg> for InquiryStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::New => InquiryStatus::New,
            StatusArg::Contacted => InquiryStatus::Contacted,
            StatusArg::Closed => InquiryStatus::Closed,
        }
    }
}
