//! Shared output layer: human text or stable JSON for every command.

use huddle_core::CoreError;
use serde::Serialize;
use std::io::{self, Write};

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON (one object per result, or a JSON array).
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Machine-facing error shape rendered on stderr.
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<&CoreError> for CliError {
    fn from(error: &CoreError) -> Self {
        let code = error.code();
        let mut cli = Self::new(error.to_string(), code.code());
        if let Some(hint) = code.hint() {
            cli = cli.with_hint(hint);
        }
        cli
    }
}

/// Render a value as JSON, or through the provided human formatter.
///
/// # Errors
///
/// Returns an error when serialization or writing fails.
pub fn render<T, F>(mode: OutputMode, value: &T, human: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce(&T, &mut dyn Write) -> io::Result<()>,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
    } else {
        human(value, &mut out)?;
    }
    Ok(())
}

/// Render a one-line success message (with an `ok` JSON envelope).
///
/// # Errors
///
/// Returns an error when writing fails.
pub fn render_success(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    if mode.is_json() {
        println!(
            "{}",
            serde_json::json!({ "ok": true, "message": message })
        );
    } else {
        println!("{message}");
    }
    Ok(())
}

/// Render an error to stderr in the active mode.
///
/// # Errors
///
/// Returns an error when writing fails.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    if mode.is_json() {
        eprintln!("{}", serde_json::to_string(error)?);
    } else {
        eprintln!("error[{}]: {}", error.code, error.error);
        if let Some(hint) = &error.hint {
            eprintln!("  hint: {hint}");
        }
    }
    Ok(())
}
