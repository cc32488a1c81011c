//! Command handlers and their shared environment.

pub mod card;
pub mod init;
pub mod lock;
pub mod project;
pub mod rag;
pub mod snap;
pub mod sprint;
pub mod summary;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use huddle_core::classify::{HttpClassifier, TextClassifier};
use huddle_core::clock::SystemClock;
use huddle_core::config::{self, HuddleConfig};
use huddle_core::db;
use huddle_core::{CoreError, StandupService};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use crate::output::{render_error, CliError, OutputMode};

/// Everything a command needs: the open store, the effective config, the
/// wall clock, and the configured classifier (if any).
pub struct Env {
    pub conn: Connection,
    pub config: HuddleConfig,
    clock: SystemClock,
    classifier: Option<HttpClassifier>,
}

impl Env {
    /// Open the project's store and config.
    ///
    /// # Errors
    ///
    /// Returns an error when the store does not exist yet or cannot be
    /// opened.
    pub fn open(project_root: &Path) -> anyhow::Result<Self> {
        let path = config::db_path(project_root);
        anyhow::ensure!(
            path.exists(),
            "No huddle store at {}. Run `hud init` first.",
            path.display()
        );

        let config = config::load_config(project_root)?;
        let conn = db::open_store(&path)?;
        let classifier = config.classifier.url.clone().map(|url| {
            HttpClassifier::new(url, Duration::from_millis(config.classifier.timeout_ms))
        });

        Ok(Self {
            conn,
            config,
            clock: SystemClock,
            classifier,
        })
    }

    /// Build the request-scoped snapshot service.
    pub fn service(&self) -> StandupService<'_> {
        StandupService::new(
            &self.conn,
            self.classifier
                .as_ref()
                .map(|classifier| classifier as &dyn TextClassifier),
            &self.clock,
            self.config.rag,
        )
    }
}

/// Render a core error in the active output mode and convert it for the
/// anyhow chain.
pub(crate) fn fail(output: OutputMode, error: &CoreError) -> anyhow::Error {
    let _ = render_error(output, &CliError::from(error));
    anyhow::anyhow!("{error}")
}

/// Parse a `--date` value, defaulting to today.
pub(crate) fn parse_date(raw: Option<&str>) -> anyhow::Result<NaiveDate> {
    match raw {
        Some(text) => text
            .parse::<NaiveDate>()
            .with_context(|| format!("invalid date '{text}', expected YYYY-MM-DD")),
        None => Ok(Utc::now().date_naive()),
    }
}
