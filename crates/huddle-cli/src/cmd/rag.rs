//! `hud rag`: rollups, history, and the system-suggested computation.

use clap::{Args, Subcommand};
use serde_json::json;
use std::io::Write as _;
use std::path::Path;

use super::{fail, Env};
use crate::output::{render, OutputMode};

#[derive(Subcommand, Debug)]
pub enum RagCommand {
    /// Worst-case rollup for a sprint with per-assignee breakdown.
    Sprint(RagSprintArgs),
    /// Worst-case rollup across a project's sprints.
    Project(RagProjectArgs),
    /// RAG history for a card, most recent day first.
    History(RagHistoryArgs),
    /// System-suggested RAG for a card (timeline/staleness/blockers).
    Suggest(RagSuggestArgs),
}

#[derive(Args, Debug)]
pub struct RagSprintArgs {
    /// Sprint ID.
    pub sprint: String,
}

#[derive(Args, Debug)]
pub struct RagProjectArgs {
    /// Project ID.
    pub project: String,
}

#[derive(Args, Debug)]
pub struct RagHistoryArgs {
    /// Card ID.
    pub card: String,
}

#[derive(Args, Debug)]
pub struct RagSuggestArgs {
    /// Card ID.
    pub card: String,

    /// Candidate standup text (classified first; defaults to today's
    /// latest snap when omitted).
    #[arg(short, long)]
    pub text: Option<String>,
}

pub fn run_rag(command: &RagCommand, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    match command {
        RagCommand::Sprint(args) => run_sprint(args, output, project_root),
        RagCommand::Project(args) => run_project(args, output, project_root),
        RagCommand::History(args) => run_history(args, output, project_root),
        RagCommand::Suggest(args) => run_suggest(args, output, project_root),
    }
}

fn rag_label(rag: Option<huddle_core::model::Rag>) -> String {
    rag.map_or_else(|| "no data".to_string(), |rag| rag.to_string())
}

fn run_sprint(args: &RagSprintArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let rollup = env
        .service()
        .sprint_rollup(&args.sprint)
        .map_err(|error| fail(output, &error))?;

    render(output, &rollup, |rollup, out| {
        writeln!(out, "sprint {} ({}): {}", rollup.sprint_name, rollup.sprint_id, rag_label(rollup.rag))?;
        for assignee in &rollup.assignees {
            writeln!(out, "  {}: {}", assignee.assignee, rag_label(assignee.rag))?;
            for card in &assignee.cards {
                writeln!(out, "    {} {}: {}", card.card_id, card.title, rag_label(card.rag))?;
            }
        }
        Ok(())
    })
}

fn run_project(args: &RagProjectArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let rollup = env
        .service()
        .project_rollup(&args.project)
        .map_err(|error| fail(output, &error))?;

    render(output, &rollup, |rollup, out| {
        writeln!(out, "project {}: {}", rollup.project_id, rag_label(rollup.rag))?;
        for sprint in &rollup.sprints {
            writeln!(out, "  {} ({}): {}", sprint.sprint_name, sprint.sprint_id, rag_label(sprint.rag))?;
        }
        Ok(())
    })
}

fn run_history(args: &RagHistoryArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let history = env
        .service()
        .rag_history(&args.card)
        .map_err(|error| fail(output, &error))?;

    render(output, &history, |history, out| {
        for entry in history {
            writeln!(
                out,
                "{}  {}  overridden={}",
                entry.rag_date, entry.rag, entry.overridden
            )?;
        }
        Ok(())
    })
}

fn run_suggest(args: &RagSuggestArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let rag = env
        .service()
        .suggest_card_rag(&args.card, args.text.as_deref())
        .map_err(|error| fail(output, &error))?;

    render(
        output,
        &json!({ "card_id": args.card, "suggested_rag": rag }),
        |value, out| writeln!(out, "suggested rag: {}", value["suggested_rag"]),
    )
}
