//! Author identity resolution for CLI commands.
//!
//! The resolution chain: `--author` flag > `HUDDLE_AUTHOR` env > `AGENT`
//! env > `USER` env (TTY only). Mutating commands require an author
//! identity; read-only commands work without one.

use std::env;

/// Errors from author resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorResolutionError {
    /// Human-readable description.
    pub message: String,
    /// Machine error code.
    pub code: &'static str,
}

impl std::fmt::Display for AuthorResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AuthorResolutionError {}

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
    fn is_tty(&self) -> bool;
}

/// Real environment reader.
struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn is_tty(&self) -> bool {
        use std::io::IsTerminal;
        std::io::stdin().is_terminal()
    }
}

/// Core resolution logic, parameterized by environment reader.
fn resolve_author_with(cli_flag: Option<&str>, env: &dyn EnvReader) -> Option<String> {
    cli_flag
        .filter(|flag| !flag.is_empty())
        .map(ToString::to_string)
        .or_else(|| env.get("HUDDLE_AUTHOR"))
        .or_else(|| env.get("AGENT"))
        .or_else(|| env.is_tty().then(|| env.get("USER")).flatten())
}

/// Resolve the author identity following the 4-step chain:
///
/// 1. `--author` CLI flag (passed as `cli_flag`)
/// 2. `HUDDLE_AUTHOR` environment variable
/// 3. `AGENT` environment variable
/// 4. `USER` environment variable (only if running in a TTY)
///
/// Returns `None` if no identity could be resolved.
pub fn resolve_author(cli_flag: Option<&str>) -> Option<String> {
    resolve_author_with(cli_flag, &RealEnv)
}

/// Resolve author identity, returning an error if not found.
///
/// Use this for mutating commands that require an author.
///
/// # Errors
///
/// Returns an error when no identity could be resolved.
pub fn require_author(cli_flag: Option<&str>) -> Result<String, AuthorResolutionError> {
    resolve_author(cli_flag).ok_or_else(|| AuthorResolutionError {
        message: "Author identity required for this command. \
                  Set --author, HUDDLE_AUTHOR, or AGENT environment variable."
            .to_string(),
        code: "missing_author",
    })
}
