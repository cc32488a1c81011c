//! `hud project`: project plumbing.

use chrono::Utc;
use clap::{Args, Subcommand};
use huddle_core::db;
use serde_json::json;
use std::io::Write as _;
use std::path::Path;

use super::Env;
use crate::output::{render, OutputMode};

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project.
    Add(ProjectAddArgs),
}

#[derive(Args, Debug)]
pub struct ProjectAddArgs {
    /// Project name.
    #[arg(short, long)]
    pub name: String,

    /// Explicit project ID (defaults to a generated UUID).
    #[arg(long)]
    pub id: Option<String>,
}

pub fn run_project(
    command: &ProjectCommand,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    match command {
        ProjectCommand::Add(args) => run_add(args, output, project_root),
    }
}

fn run_add(args: &ProjectAddArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let project_id = args
        .id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    db::sprints::insert_project(&env.conn, &project_id, &args.name, Utc::now())?;

    render(
        output,
        &json!({ "project_id": project_id, "name": args.name }),
        |value, out| writeln!(out, "Created project {} ({})", args.name, value["project_id"]),
    )
}
