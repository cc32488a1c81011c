//! `hud summary`: generate or fetch the daily summary artifact.

use clap::Args;
use std::io::Write as _;
use std::path::Path;

use super::{fail, parse_date, Env};
use crate::output::{render, OutputMode};

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Sprint ID.
    #[arg(long)]
    pub sprint: String,

    /// Summary date (defaults to today).
    #[arg(long)]
    pub date: Option<String>,

    /// Fetch only: fail instead of generating when none exists yet.
    #[arg(long)]
    pub fetch_only: bool,
}

pub fn run_summary(args: &SummaryArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let env = Env::open(project_root)?;
    let date = parse_date(args.date.as_deref())?;
    let svc = env.service();

    let summary = if args.fetch_only {
        svc.fetch_summary(&args.sprint, date)
    } else {
        svc.generate_summary(&args.sprint, date)
    }
    .map_err(|error| fail(output, &error))?;

    render(output, &summary, |summary, out| {
        writeln!(
            out,
            "Daily summary for sprint {} on {}",
            summary.sprint_id, summary.summary_date
        )?;
        writeln!(out, "sprint rag: {}", summary.breakdown.sprint_level)?;
        writeln!(
            out,
            "cards: {} green / {} amber / {} red",
            summary.breakdown.card_level.green,
            summary.breakdown.card_level.amber,
            summary.breakdown.card_level.red
        )?;
        writeln!(out)?;
        writeln!(out, "DONE")?;
        writeln!(out, "{}", summary.done_text)?;
        writeln!(out)?;
        writeln!(out, "TO DO")?;
        writeln!(out, "{}", summary.todo_text)?;
        writeln!(out)?;
        writeln!(out, "BLOCKERS")?;
        writeln!(out, "{}", summary.blockers_text)?;
        for assignee in &summary.assignees {
            writeln!(out)?;
            writeln!(out, "{} ({})", assignee.assignee, assignee.rag)?;
            for entry in &assignee.entries {
                writeln!(
                    out,
                    "  [{}] done: {}",
                    entry.card_title,
                    if entry.done.is_empty() { "-" } else { &entry.done }
                )?;
            }
        }
        Ok(())
    })
}
