//! `hud card`: card plumbing.

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Subcommand};
use huddle_core::db;
use huddle_core::model::{Card, CardStatus};
use serde_json::json;
use std::io::Write as _;
use std::path::Path;

use super::Env;
use crate::output::{render, OutputMode};

#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// Create a card in a sprint.
    Add(CardAddArgs),
    /// List a sprint's cards.
    Ls(CardLsArgs),
}

#[derive(Args, Debug)]
pub struct CardAddArgs {
    /// Owning sprint ID.
    #[arg(long)]
    pub sprint: String,

    /// Card title.
    #[arg(short, long)]
    pub title: String,

    /// Estimated effort in hours (must be positive to allow snapping).
    #[arg(short, long)]
    pub estimate: f64,

    /// Assignee display name.
    #[arg(long)]
    pub assignee: Option<String>,

    /// Explicit card ID (defaults to a generated UUID).
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args, Debug)]
pub struct CardLsArgs {
    /// Sprint to list.
    #[arg(long)]
    pub sprint: String,
}

pub fn run_card(
    command: &CardCommand,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    match command {
        CardCommand::Add(args) => run_add(args, output, project_root),
        CardCommand::Ls(args) => run_ls(args, output, project_root),
    }
}

fn run_add(args: &CardAddArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let sprint = db::sprints::get(&env.conn, &args.sprint)?
        .with_context(|| format!("unknown sprint {}", args.sprint))?;

    let card = Card {
        card_id: args
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        sprint_id: sprint.sprint_id.clone(),
        project_id: sprint.project_id.clone(),
        assignee_id: args.assignee.as_ref().map(|name| format!("id-{name}")),
        assignee_name: args.assignee.clone(),
        title: args.title.clone(),
        estimated_hours: args.estimate,
        status: CardStatus::NotStarted,
        rag: None,
        completed_at: None,
        created_at: Utc::now(),
    };
    db::cards::insert(&env.conn, &card)?;

    render(
        output,
        &json!({
            "card_id": card.card_id,
            "title": card.title,
            "sprint_id": card.sprint_id,
            "estimated_hours": card.estimated_hours,
        }),
        |value, out| writeln!(out, "Created card {} ({})", args.title, value["card_id"]),
    )
}

fn run_ls(args: &CardLsArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let cards = db::cards::for_sprint(&env.conn, &args.sprint)?;

    render(output, &cards, |cards, out| {
        for card in cards {
            writeln!(
                out,
                "{}  {}  {}  {}  {}",
                card.card_id,
                card.title,
                card.status,
                card.rag.map_or_else(|| "-".to_string(), |rag| rag.to_string()),
                card.assignee_name.as_deref().unwrap_or("Unassigned"),
            )?;
        }
        Ok(())
    })
}
