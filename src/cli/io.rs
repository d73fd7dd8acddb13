//! JSON output for diagnostic commands
//!
//! Each command prints exactly one JSON line:
//! `{"status": "ok", "data": ...}` or
//! `{"status": "error", "code": ..., "message": ...}`.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use super::errors::{CliError, CliResult};

/// One command response line
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Output {
    Ok { data: Value },
    Error { code: &'static str, message: String },
}

impl Output {
    pub fn failure(err: &CliError) -> Self {
        Output::Error {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Write one response line to `writer`
pub fn emit<W: Write>(writer: &mut W, output: &Output) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, output)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Print the outcome of a diagnostic command to stdout.
///
/// The command's error is still returned so the process exits non-zero.
pub fn respond(result: CliResult<Value>) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    match result {
        Ok(data) => emit(&mut stdout, &Output::Ok { data }),
        Err(err) => {
            emit(&mut stdout, &Output::failure(&err))?;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line(output: &Output) -> Value {
        let mut buf = Vec::new();
        emit(&mut buf, output).unwrap();
        assert_eq!(buf.last(), Some(&b'\n'));
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn test_ok_line() {
        let value = line(&Output::Ok {
            data: json!({"allowed": true}),
        });
        assert_eq!(value, json!({"status": "ok", "data": {"allowed": true}}));
    }

    #[test]
    fn test_error_line() {
        let err = CliError::InvalidInput("bad tree".into());
        let value = line(&Output::failure(&err));
        assert_eq!(
            value,
            json!({"status": "error", "code": "CION_CLI_INVALID_INPUT", "message": "bad tree"})
        );
    }
}
