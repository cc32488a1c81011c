//! `hud sprint`: sprint plumbing.

use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use huddle_core::db;
use huddle_core::model::{Sprint, SprintStatus};
use serde_json::json;
use std::io::Write as _;
use std::path::Path;
use std::str::FromStr;

use super::Env;
use crate::output::{render, OutputMode};

#[derive(Subcommand, Debug)]
pub enum SprintCommand {
    /// Create a sprint.
    Add(SprintAddArgs),
    /// List sprints.
    Ls(SprintLsArgs),
}

#[derive(Args, Debug)]
pub struct SprintAddArgs {
    /// Owning project ID.
    #[arg(long)]
    pub project: String,

    /// Sprint name.
    #[arg(short, long)]
    pub name: String,

    /// First day (YYYY-MM-DD).
    #[arg(long)]
    pub start: String,

    /// Last day, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub end: String,

    /// Standup slots per day.
    #[arg(long, default_value_t = 1)]
    pub standups: u32,

    /// Sprint status: planned, active, completed, or closed.
    #[arg(long, default_value = "active")]
    pub status: String,

    /// Explicit sprint ID (defaults to a generated UUID).
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args, Debug)]
pub struct SprintLsArgs {}

pub fn run_sprint(
    command: &SprintCommand,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    match command {
        SprintCommand::Add(args) => run_add(args, output, project_root),
        SprintCommand::Ls(args) => run_ls(args, output, project_root),
    }
}

fn run_add(args: &SprintAddArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;

    let sprint = Sprint {
        sprint_id: args
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        project_id: args.project.clone(),
        name: args.name.clone(),
        status: SprintStatus::from_str(&args.status)?,
        start_date: args.start.parse::<NaiveDate>()?,
        end_date: args.end.parse::<NaiveDate>()?,
        standups_per_day: args.standups,
        created_at: Utc::now(),
    };
    db::sprints::insert(&env.conn, &sprint)?;

    render(
        output,
        &json!({
            "sprint_id": sprint.sprint_id,
            "name": sprint.name,
            "status": sprint.status,
            "start_date": sprint.start_date,
            "end_date": sprint.end_date,
        }),
        |value, out| writeln!(out, "Created sprint {} ({})", args.name, value["sprint_id"]),
    )
}

fn run_ls(_args: &SprintLsArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let sprints = db::sprints::list(&env.conn)?;

    render(output, &sprints, |sprints, out| {
        for sprint in sprints {
            writeln!(
                out,
                "{}  {}  {}  {}..{}",
                sprint.sprint_id, sprint.name, sprint.status, sprint.start_date, sprint.end_date
            )?;
        }
        Ok(())
    })
}
