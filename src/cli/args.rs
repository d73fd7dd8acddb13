//! CLI argument definitions using clap
//!
//! Commands:
//! - cion serve --config <path>
//! - cion check-query <text>
//! - cion check-permission --tree <json> --path <path> [--placeholders <json>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cion - deployment dashboard API server
#[derive(Parser, Debug)]
#[command(name = "cion")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API server
    Serve {
        /// Path to configuration file; defaults apply when it does not exist
        #[arg(long, default_value = "./cion.json")]
        config: PathBuf,
    },

    /// Parse a search query and print its syntax tree
    CheckQuery {
        /// Search text, e.g. 'event:new-image AND status:done'
        text: String,
    },

    /// Evaluate a permission path against a permission tree
    CheckPermission {
        /// Permission tree as JSON
        #[arg(long)]
        tree: String,

        /// Dotted permission path
        #[arg(long)]
        path: String,

        /// Placeholder values as a JSON object
        #[arg(long)]
        placeholders: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
