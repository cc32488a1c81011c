//! Daily summary generator.
//!
//! One immutable artifact per (sprint, date). Generation is idempotent:
//! the first call computes and persists, every later call returns the
//! stored artifact unchanged.
//!
//! The sprint-level label here uses a *majority* rule, not the worst-case
//! rule the hierarchical rollup uses. The two can disagree for the same
//! sprint and date; both are kept on purpose (see DESIGN.md).

use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::BTreeMap;

use crate::clock::Clock;
use crate::db::{self, snaps::SnapRow};
use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::model::{
    AssigneeEntry, AssigneeSummary, DailySummary, Rag, RagBreakdown, RagTally,
};
use crate::rag::worst_of;

/// Generate (or fetch) the summary for a sprint and date.
///
/// # Errors
///
/// `SprintNotFound` for an unknown sprint, or a storage error.
pub fn generate_summary(
    conn: &Connection,
    clock: &dyn Clock,
    sprint_id: &str,
    date: NaiveDate,
) -> CoreResult<DailySummary> {
    if db::sprints::get(conn, sprint_id)?.is_none() {
        return Err(CoreError::not_found(
            ErrorCode::SprintNotFound,
            format!("sprint {sprint_id}"),
        ));
    }

    if let Some(existing) = db::summaries::get(conn, sprint_id, date)? {
        return Ok(existing);
    }

    let rows = db::snaps::for_sprint_and_date(conn, sprint_id, date, None)?;
    let summary = build_summary(sprint_id, date, &rows, clock);

    let created = db::summaries::insert_if_absent(conn, &summary)?;
    if created {
        tracing::info!(sprint_id, %date, snaps = rows.len(), "daily summary generated");
        return Ok(summary);
    }

    // Lost an insert race: hand back whatever won, never a second artifact.
    db::summaries::get(conn, sprint_id, date)?.ok_or_else(|| {
        CoreError::internal(format!(
            "summary for sprint {sprint_id} on {date} vanished after insert conflict"
        ))
    })
}

/// Fetch an existing summary without generating one.
///
/// # Errors
///
/// `SummaryNotFound` when none exists, or a storage error.
pub fn fetch_summary(
    conn: &Connection,
    sprint_id: &str,
    date: NaiveDate,
) -> CoreResult<DailySummary> {
    db::summaries::get(conn, sprint_id, date)?.ok_or_else(|| {
        CoreError::not_found(
            ErrorCode::SummaryNotFound,
            format!("no summary for sprint {sprint_id} on {date}"),
        )
    })
}

fn build_summary(
    sprint_id: &str,
    date: NaiveDate,
    rows: &[SnapRow],
    clock: &dyn Clock,
) -> DailySummary {
    let mut done_lines = Vec::new();
    let mut todo_lines = Vec::new();
    let mut blocker_lines = Vec::new();
    let mut card_tally = RagTally::default();
    let mut by_assignee: BTreeMap<String, Vec<AssigneeEntry>> = BTreeMap::new();

    for row in rows {
        push_line(&mut done_lines, &row.card_title, &row.snap.done);
        push_line(&mut todo_lines, &row.card_title, &row.snap.to_do);
        push_line(&mut blocker_lines, &row.card_title, &row.snap.blockers);

        card_tally.record(row.snap.final_rag.unwrap_or(Rag::Amber));

        let assignee = row
            .assignee_name
            .clone()
            .unwrap_or_else(|| "Unassigned".to_string());
        by_assignee.entry(assignee).or_default().push(AssigneeEntry {
            card_title: row.card_title.clone(),
            done: row.snap.done.clone(),
            to_do: row.snap.to_do.clone(),
            blockers: row.snap.blockers.clone(),
            final_rag: row.snap.final_rag,
        });
    }

    let mut assignee_tally = RagTally::default();
    let assignees: Vec<AssigneeSummary> = by_assignee
        .into_iter()
        .map(|(assignee, entries)| {
            let rag = worst_of(
                entries
                    .iter()
                    .map(|entry| entry.final_rag.unwrap_or(Rag::Amber)),
            )
            .unwrap_or(Rag::Green);
            assignee_tally.record(rag);
            AssigneeSummary {
                assignee,
                rag,
                entries,
            }
        })
        .collect();

    DailySummary {
        sprint_id: sprint_id.to_string(),
        summary_date: date,
        done_text: join_or(&done_lines, "No updates recorded"),
        todo_text: join_or(&todo_lines, "None"),
        blockers_text: join_or(&blocker_lines, "None"),
        breakdown: RagBreakdown {
            card_level: card_tally,
            assignee_level: assignee_tally,
            sprint_level: majority_rag(&card_tally),
        },
        assignees,
        created_at: clock.now(),
    }
}

/// Majority rule for the sprint-level label: a color wins with a strict
/// majority over the other two combined; otherwise fall back to the worst
/// color present.
#[must_use]
pub fn majority_rag(tally: &RagTally) -> Rag {
    if tally.red > tally.green + tally.amber {
        Rag::Red
    } else if tally.amber > tally.green + tally.red {
        Rag::Amber
    } else if tally.green > tally.amber + tally.red {
        Rag::Green
    } else if tally.red > 0 {
        Rag::Red
    } else if tally.amber > 0 {
        Rag::Amber
    } else {
        Rag::Green
    }
}

fn push_line(buffer: &mut Vec<String>, card_title: &str, content: &str) {
    let trimmed = content.trim();
    if !trimmed.is_empty() {
        buffer.push(format!("[{card_title}] {trimmed}"));
    }
}

fn join_or(lines: &[String], sentinel: &str) -> String {
    if lines.is_empty() {
        sentinel.to_string()
    } else {
        lines.join("\n")
    }
}
