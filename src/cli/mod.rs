//! CLI module for cion
//!
//! Provides command-line interface for:
//! - serve: Boot the HTTP API server
//! - check-query: Parse a search query and print its tree
//! - check-permission: Evaluate a permission path against a tree

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    check_permission, check_query, describe_query, evaluate_permission, load_config, run,
    run_command, serve,
};
pub use errors::{CliError, CliResult};
