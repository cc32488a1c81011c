//! `hud init`: initialize a huddle project in the current directory.

use clap::Args;
use huddle_core::{config, db};
use std::path::Path;

use crate::output::{render_success, OutputMode};

#[derive(Args, Debug)]
pub struct InitArgs {}

pub fn run_init(
    _args: &InitArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let config_path = config::write_default_config(project_root)?;
    let db_path = config::db_path(project_root);
    let _conn = db::open_store(&db_path)?;

    tracing::info!(path = %db_path.display(), "store initialized");
    render_success(
        output,
        &format!(
            "Initialized huddle project ({}, {})",
            db_path.display(),
            config_path.display()
        ),
    )
}
