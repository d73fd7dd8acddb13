//! CLI command implementations
//!
//! `serve` boots the HTTP server. `check-query` and `check-permission` are
//! one-shot diagnostics that print a single JSON response and exit.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::http_server::{AppState, HttpServer, ServerConfig};
use crate::observability::Logger;
use crate::permissions::{DenialReasons, PermissionPath, Placeholders};
use crate::search::{self, SearchError};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::respond;

/// Load server configuration.
///
/// A missing file yields the defaults; a present file must parse and
/// validate.
pub fn load_config(path: &Path) -> CliResult<ServerConfig> {
    if !path.exists() {
        let shown = path.display().to_string();
        Logger::info("CONFIG_DEFAULTS", &[("path", shown.as_str())]);
        return Ok(ServerConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("Failed to read config: {}", e)))?;

    let config: ServerConfig = serde_json::from_str(&content)
        .map_err(|e| CliError::Config(format!("Invalid config JSON: {}", e)))?;

    config.validate().map_err(CliError::Config)?;

    Ok(config)
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config } => serve(&config),
        Command::CheckQuery { text } => check_query(&text),
        Command::CheckPermission {
            tree,
            path,
            placeholders,
        } => check_permission(&tree, &path, placeholders.as_deref()),
    }
}

/// Boot the API server and block until it exits
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let state = Arc::new(AppState::new(config));

    state
        .bootstrap()
        .map_err(|e| CliError::BootFailed(format!("Failed to create admin account: {}", e)))?;

    let server = HttpServer::with_state(state)
        .map_err(|e| CliError::BootFailed(format!("Failed to build routes: {}", e)))?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::BootFailed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::BootFailed(format!("HTTP server failed: {}", e)))
    })?;

    Ok(())
}

/// Print the syntax tree of a search query
pub fn check_query(text: &str) -> CliResult<()> {
    respond(describe_query(text))
}

/// Parse and compile `text`, returning its tree as JSON.
///
/// An empty query is reported as `null`: it matches every record.
pub fn describe_query(text: &str) -> CliResult<Value> {
    let node = search::parse(text)
        .map_err(|e| CliError::InvalidInput(SearchError::from(e).to_string()))?;

    let node = match node {
        Some(node) => node,
        None => return Ok(json!({ "query": Value::Null, "fields": [] })),
    };

    search::PredicateCompiler::compile(&node)
        .map_err(|e| CliError::InvalidInput(e.to_string()))?;

    Ok(json!({
        "query": serde_json::to_value(&node)?,
        "fields": node.fields(),
    }))
}

/// Evaluate one permission path and print the outcome
pub fn check_permission(tree: &str, path: &str, placeholders: Option<&str>) -> CliResult<()> {
    respond(evaluate_permission(tree, path, placeholders))
}

/// Evaluate `path` against `tree` (both given as text).
///
/// Returns `{"allowed": bool, "reasons": [...]}`.
pub fn evaluate_permission(
    tree: &str,
    path: &str,
    placeholders: Option<&str>,
) -> CliResult<Value> {
    let tree: Value = serde_json::from_str(tree)
        .map_err(|e| CliError::InvalidInput(format!("Invalid permission tree: {}", e)))?;

    let path = PermissionPath::parse(path).map_err(|e| CliError::InvalidInput(e.to_string()))?;

    let values: Placeholders = match placeholders {
        None => Placeholders::new(),
        Some(text) => match serde_json::from_str(text) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            Ok(_) => {
                return Err(CliError::InvalidInput(
                    "Placeholder values must be a JSON object".to_string(),
                ))
            }
            Err(e) => {
                return Err(CliError::InvalidInput(format!(
                    "Invalid placeholder JSON: {}",
                    e
                )))
            }
        },
    };

    let mut reasons = DenialReasons::new();
    let allowed = path.evaluate(&tree, &values, &mut reasons);

    Ok(json!({
        "allowed": allowed,
        "reasons": reasons,
    }))
}
