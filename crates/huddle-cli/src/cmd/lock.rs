//! `hud lock`: the daily/slot freeze protocol and its admin escape hatch.

use clap::{Args, Subcommand};
use serde_json::json;
use std::io::Write as _;
use std::path::Path;

use super::{fail, parse_date, Env};
use crate::author::require_author;
use crate::output::{render, render_error, render_success, CliError, OutputMode};

#[derive(Subcommand, Debug)]
pub enum LockCommand {
    /// Freeze a whole day for a sprint (exactly-once).
    Day(LockDayArgs),
    /// Freeze a single standup slot of a day.
    Slot(LockSlotArgs),
    /// Scheduler variant of `day`: silently no-ops instead of erroring.
    Auto(LockAutoArgs),
    /// Report whether a day (or slot) is frozen.
    Status(LockStatusArgs),
    /// Administrative unlock. Destructive; logged as an exception path.
    Release(LockReleaseArgs),
}

#[derive(Args, Debug)]
pub struct LockDayArgs {
    /// Sprint ID.
    #[arg(long)]
    pub sprint: String,

    /// Date to lock (defaults to today).
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct LockSlotArgs {
    /// Sprint ID.
    #[arg(long)]
    pub sprint: String,

    /// Slot number (1-based).
    #[arg(long)]
    pub slot: u32,

    /// Date to lock (defaults to today).
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct LockAutoArgs {
    /// Sprint ID.
    #[arg(long)]
    pub sprint: String,

    /// Date to lock (defaults to today).
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct LockStatusArgs {
    /// Sprint ID.
    #[arg(long)]
    pub sprint: String,

    /// Date to check (defaults to today).
    #[arg(long)]
    pub date: Option<String>,

    /// Slot to check in addition to the day level.
    #[arg(long)]
    pub slot: Option<u32>,
}

#[derive(Args, Debug)]
pub struct LockReleaseArgs {
    /// Sprint ID.
    #[arg(long)]
    pub sprint: String,

    /// Date to unlock (defaults to today).
    #[arg(long)]
    pub date: Option<String>,

    /// Slot-level lock to remove (omit for the day-level lock).
    #[arg(long)]
    pub slot: Option<u32>,
}

pub fn run_lock(
    command: &LockCommand,
    author_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    match command {
        LockCommand::Day(args) => run_day(args, author_flag, output, project_root),
        LockCommand::Slot(args) => run_slot(args, author_flag, output, project_root),
        LockCommand::Auto(args) => run_auto(args, output, project_root),
        LockCommand::Status(args) => run_status(args, output, project_root),
        LockCommand::Release(args) => run_release(args, author_flag, output, project_root),
    }
}

fn required_author(author_flag: Option<&str>, output: OutputMode) -> anyhow::Result<String> {
    match require_author(author_flag) {
        Ok(author) => Ok(author),
        Err(error) => {
            render_error(output, &CliError::new(&error.message, error.code))?;
            anyhow::bail!("{}", error.message);
        }
    }
}

fn run_day(
    args: &LockDayArgs,
    author_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let actor = required_author(author_flag, output)?;
    let env = Env::open(project_root)?;
    let date = parse_date(args.date.as_deref())?;

    let lock = env
        .service()
        .lock_day(&args.sprint, date, &actor)
        .map_err(|error| fail(output, &error))?;

    render(output, &lock, |lock, out| {
        writeln!(out, "Locked {} for sprint {}", lock.lock_date, lock.sprint_id)?;
        writeln!(out, "  done:     {}", lock.done_summary.replace('\n', "; "))?;
        writeln!(out, "  to do:    {}", lock.todo_summary.replace('\n', "; "))?;
        writeln!(
            out,
            "  blockers: {}",
            lock.blockers_summary.replace('\n', "; ")
        )
    })
}

fn run_slot(
    args: &LockSlotArgs,
    author_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let actor = required_author(author_flag, output)?;
    let env = Env::open(project_root)?;
    let date = parse_date(args.date.as_deref())?;

    let lock = env
        .service()
        .lock_slot(&args.sprint, date, args.slot, &actor)
        .map_err(|error| fail(output, &error))?;

    render(output, &lock, |lock, out| {
        writeln!(
            out,
            "Locked slot {} of {} for sprint {}",
            args.slot, lock.lock_date, lock.sprint_id
        )
    })
}

fn run_auto(args: &LockAutoArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let date = parse_date(args.date.as_deref())?;

    let outcome = env
        .service()
        .auto_lock_day(&args.sprint, date)
        .map_err(|error| fail(output, &error))?;

    match outcome {
        Some(lock) => render(output, &lock, |lock, out| {
            writeln!(out, "Auto-locked {} for sprint {}", lock.lock_date, lock.sprint_id)
        }),
        None => render_success(output, "Nothing to do"),
    }
}

fn run_status(args: &LockStatusArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let date = parse_date(args.date.as_deref())?;

    let locked = env
        .service()
        .is_locked(&args.sprint, date, args.slot)
        .map_err(|error| fail(output, &error))?;

    render(
        output,
        &json!({ "sprint_id": args.sprint, "date": date, "slot": args.slot, "locked": locked }),
        |value, out| writeln!(out, "locked: {}", value["locked"]),
    )
}

fn run_release(
    args: &LockReleaseArgs,
    author_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let actor = required_author(author_flag, output)?;
    let env = Env::open(project_root)?;
    let date = parse_date(args.date.as_deref())?;

    env.service()
        .unlock(&args.sprint, date, args.slot, &actor)
        .map_err(|error| fail(output, &error))?;

    render_success(
        output,
        &format!("Unlocked {date} for sprint {} (administrative)", args.sprint),
    )
}
