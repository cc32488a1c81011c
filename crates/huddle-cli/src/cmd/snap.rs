//! `hud snap`: create, edit, delete, and list snaps, plus the
//! classify-only preview.

use clap::{Args, Subcommand};
use huddle_core::model::{Rag, SnapFields};
use huddle_core::{CreateSnapRequest, UpdateSnapRequest};
use std::io::Write as _;
use std::path::Path;
use std::str::FromStr;

use super::{fail, parse_date, Env};
use crate::author::require_author;
use crate::output::{render, render_error, render_success, CliError, OutputMode};

#[derive(Subcommand, Debug)]
pub enum SnapCommand {
    /// Record a snap against a card for today.
    Add(SnapAddArgs),
    /// Edit one of today's snaps.
    Edit(SnapEditArgs),
    /// Delete one of today's snaps.
    Rm(SnapRmArgs),
    /// List snaps for a card or a sprint/date.
    Ls(SnapLsArgs),
    /// Show one snap.
    Show(SnapShowArgs),
    /// Classify raw text without persisting anything.
    Parse(SnapParseArgs),
}

#[derive(Args, Debug)]
pub struct SnapAddArgs {
    /// Card ID.
    pub card: String,

    /// Raw standup text (classified unless structured fields are given).
    #[arg(short, long)]
    pub text: String,

    /// Structured "done" field (skips the classifier).
    #[arg(long)]
    pub done: Option<String>,

    /// Structured "to do" field.
    #[arg(long)]
    pub todo: Option<String>,

    /// Structured "blockers" field.
    #[arg(long)]
    pub blockers: Option<String>,

    /// Final RAG override: red, amber, or green.
    #[arg(long)]
    pub rag: Option<String>,

    /// Standup slot (1-based, multi-standup sprints only).
    #[arg(long)]
    pub slot: Option<u32>,
}

#[derive(Args, Debug)]
pub struct SnapEditArgs {
    /// Snap ID.
    pub id: String,

    /// Replacement raw text.
    #[arg(short, long)]
    pub text: Option<String>,

    /// Replacement "done" field.
    #[arg(long)]
    pub done: Option<String>,

    /// Replacement "to do" field.
    #[arg(long)]
    pub todo: Option<String>,

    /// Replacement "blockers" field.
    #[arg(long)]
    pub blockers: Option<String>,

    /// Final RAG override: red, amber, or green.
    #[arg(long)]
    pub rag: Option<String>,

    /// Re-run the classifier on the (possibly edited) raw text.
    #[arg(long)]
    pub regenerate: bool,

    /// Assert the upstream-granted "edit any" capability.
    #[arg(long)]
    pub elevated: bool,
}

#[derive(Args, Debug)]
pub struct SnapRmArgs {
    /// Snap ID.
    pub id: String,

    /// Assert the upstream-granted "edit any" capability.
    #[arg(long)]
    pub elevated: bool,
}

#[derive(Args, Debug)]
pub struct SnapLsArgs {
    /// List a card's snaps, newest first.
    #[arg(long, conflicts_with_all = ["sprint", "date"])]
    pub card: Option<String>,

    /// List a sprint's snaps for a date.
    #[arg(long)]
    pub sprint: Option<String>,

    /// Date for `--sprint` listings (defaults to today).
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct SnapShowArgs {
    /// Snap ID.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct SnapParseArgs {
    /// Raw standup text.
    #[arg(short, long)]
    pub text: String,

    /// Card title given to the classifier for context.
    #[arg(long, default_value = "")]
    pub title: String,
}

pub fn run_snap(
    command: &SnapCommand,
    author_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    match command {
        SnapCommand::Add(args) => run_add(args, author_flag, output, project_root),
        SnapCommand::Edit(args) => run_edit(args, author_flag, output, project_root),
        SnapCommand::Rm(args) => run_rm(args, author_flag, output, project_root),
        SnapCommand::Ls(args) => run_ls(args, output, project_root),
        SnapCommand::Show(args) => run_show(args, output, project_root),
        SnapCommand::Parse(args) => run_parse(args, output, project_root),
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

fn parse_rag(raw: Option<&str>) -> anyhow::Result<Option<Rag>> {
    raw.map(Rag::from_str).transpose().map_err(Into::into)
}

fn manual_fields(
    done: Option<&str>,
    todo: Option<&str>,
    blockers: Option<&str>,
) -> Option<SnapFields> {
    if done.is_none() && todo.is_none() && blockers.is_none() {
        return None;
    }
    Some(SnapFields {
        done: done.unwrap_or_default().to_string(),
        to_do: todo.unwrap_or_default().to_string(),
        blockers: blockers.unwrap_or_default().to_string(),
    })
}

fn run_add(
    args: &SnapAddArgs,
    author_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let author = required_author(author_flag, output)?;
    let env = Env::open(project_root)?;
    let svc = env.service();

    let snap = svc
        .create_snap(CreateSnapRequest {
            card_id: args.card.clone(),
            author_id: author,
            raw_text: args.text.clone(),
            fields: manual_fields(
                args.done.as_deref(),
                args.todo.as_deref(),
                args.blockers.as_deref(),
            ),
            final_rag: parse_rag(args.rag.as_deref())?,
            slot: args.slot,
        })
        .map_err(|error| fail(output, &error))?;

    render(output, &snap, |snap, out| {
        writeln!(
            out,
            "Recorded snap {} for card {} ({})",
            snap.snap_id,
            snap.card_id,
            snap.final_rag
                .map_or_else(|| "no rag".to_string(), |rag| rag.to_string()),
        )
    })
}

fn run_edit(
    args: &SnapEditArgs,
    author_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let author = required_author(author_flag, output)?;
    let env = Env::open(project_root)?;
    let svc = env.service();

    let snap = svc
        .update_snap(UpdateSnapRequest {
            snap_id: args.id.clone(),
            author_id: author,
            raw_text: args.text.clone(),
            fields: manual_fields(
                args.done.as_deref(),
                args.todo.as_deref(),
                args.blockers.as_deref(),
            ),
            final_rag: parse_rag(args.rag.as_deref())?,
            regenerate: args.regenerate,
            elevated: args.elevated,
        })
        .map_err(|error| fail(output, &error))?;

    render(output, &snap, |snap, out| {
        writeln!(out, "Updated snap {}", snap.snap_id)
    })
}

fn run_rm(
    args: &SnapRmArgs,
    author_flag: Option<&str>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let author = required_author(author_flag, output)?;
    let env = Env::open(project_root)?;
    let svc = env.service();

    svc.delete_snap(&args.id, &author, args.elevated)
        .map_err(|error| fail(output, &error))?;

    render_success(output, &format!("Deleted snap {}", args.id))
}

fn run_ls(args: &SnapLsArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let svc = env.service();

    if let Some(card_id) = &args.card {
        let snaps = svc
            .snaps_for_card(card_id)
            .map_err(|error| fail(output, &error))?;
        return render(output, &snaps, |snaps, out| {
            for snap in snaps {
                writeln!(
                    out,
                    "{}  {}  {}  locked={}",
                    snap.snap_id, snap.snap_date, snap.author_id, snap.is_locked
                )?;
            }
            Ok(())
        });
    }

    let Some(sprint_id) = &args.sprint else {
        anyhow::bail!("pass --card or --sprint");
    };
    let date = parse_date(args.date.as_deref())?;
    let rows = svc
        .snaps_for_sprint_and_date(sprint_id, date)
        .map_err(|error| fail(output, &error))?;

    let payload: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            serde_json::json!({
                "snap": row.snap,
                "card_title": row.card_title,
                "assignee_name": row.assignee_name,
            })
        })
        .collect();
    render(output, &payload, |_, out| {
        for row in &rows {
            writeln!(
                out,
                "{}  [{}]  {}  locked={}",
                row.snap.snap_id,
                row.card_title,
                row.assignee_name.as_deref().unwrap_or("Unassigned"),
                row.snap.is_locked
            )?;
        }
        Ok(())
    })
}

fn run_show(args: &SnapShowArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let snap = env
        .service()
        .snap(&args.id)
        .map_err(|error| fail(output, &error))?;

    render(output, &snap, |snap, out| {
        writeln!(out, "snap {}", snap.snap_id)?;
        writeln!(out, "  card:     {}", snap.card_id)?;
        writeln!(out, "  date:     {}", snap.snap_date)?;
        writeln!(out, "  done:     {}", snap.done)?;
        writeln!(out, "  to do:    {}", snap.to_do)?;
        writeln!(out, "  blockers: {}", snap.blockers)?;
        writeln!(
            out,
            "  rag:      {}",
            snap.final_rag
                .map_or_else(|| "-".to_string(), |rag| rag.to_string())
        )?;
        writeln!(out, "  locked:   {}", snap.is_locked)
    })
}

fn run_parse(args: &SnapParseArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let classification = env.service().parse_preview(&args.text, &args.title);

    render(output, &classification, |c, out| {
        writeln!(out, "done:     {}", c.done)?;
        writeln!(out, "to do:    {}", c.to_do)?;
        writeln!(out, "blockers: {}", c.blockers)?;
        writeln!(out, "rag:      {}", c.suggested_rag)
    })
}
