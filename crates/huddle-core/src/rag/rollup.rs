//! Primary card RAG and hierarchical worst-case aggregation.

use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::db;
use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::model::Rag;

/// Worst-case rule: RED if any member is RED, else AMBER if any member is
/// AMBER, else GREEN if the set is non-empty, else `None`.
///
/// `Rag`'s derived ordering makes this a plain `max`.
#[must_use]
pub fn worst_of<I>(members: I) -> Option<Rag>
where
    I: IntoIterator<Item = Rag>,
{
    members.into_iter().max()
}

/// Recompute a card's RAG from its snap history and persist it.
///
/// Rules, in order:
/// 1. no snaps at all: leave the card untouched
/// 2. no snap within the trailing window: RED unconditionally
/// 3. otherwise the newest snap's `final_rag`, defaulting to AMBER when
///    the snap carries none
///
/// Returns the RAG written, or `None` for the no-op case.
///
/// # Errors
///
/// Returns an error when the store fails.
pub fn recompute_card_rag(
    conn: &Connection,
    card_id: &str,
    today: NaiveDate,
    stale_after_days: i64,
) -> CoreResult<Option<Rag>> {
    let snaps = db::snaps::for_card_newest_first(conn, card_id)?;
    if snaps.is_empty() {
        return Ok(None);
    }

    let cutoff = today - Duration::days(stale_after_days);
    let rag = snaps
        .iter()
        .find(|snap| snap.snap_date > cutoff)
        .map_or(Rag::Red, |latest| latest.final_rag.unwrap_or(Rag::Amber));

    db::cards::set_rag(conn, card_id, rag)?;
    Ok(Some(rag))
}

/// One card's contribution to a rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRagView {
    pub card_id: String,
    pub title: String,
    pub rag: Option<Rag>,
}

/// Worst-case RAG across one assignee's cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeRollup {
    pub assignee: String,
    pub rag: Option<Rag>,
    pub cards: Vec<CardRagView>,
}

/// Worst-case RAG across a sprint's cards, with the per-assignee split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintRollup {
    pub sprint_id: String,
    pub sprint_name: String,
    pub rag: Option<Rag>,
    pub assignees: Vec<AssigneeRollup>,
}

/// Worst-case RAG across a project's sprint rollups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRollup {
    pub project_id: String,
    pub rag: Option<Rag>,
    pub sprints: Vec<SprintRollup>,
}

/// Aggregate a sprint bottom-up: card -> assignee -> sprint.
///
/// Cards without a RAG yet contribute no color (they still appear in the
/// breakdown so callers can see them).
///
/// # Errors
///
/// Returns `SprintNotFound` for an unknown sprint, or a storage error.
pub fn sprint_rollup(conn: &Connection, sprint_id: &str) -> CoreResult<SprintRollup> {
    let sprint = db::sprints::get(conn, sprint_id)?.ok_or_else(|| {
        CoreError::not_found(ErrorCode::SprintNotFound, format!("sprint {sprint_id}"))
    })?;

    let cards = db::cards::for_sprint(conn, sprint_id)?;

    let mut by_assignee: BTreeMap<String, Vec<CardRagView>> = BTreeMap::new();
    for card in cards {
        let assignee = card
            .assignee_name
            .clone()
            .unwrap_or_else(|| "Unassigned".to_string());
        by_assignee.entry(assignee).or_default().push(CardRagView {
            card_id: card.card_id,
            title: card.title,
            rag: card.rag,
        });
    }

    let assignees: Vec<AssigneeRollup> = by_assignee
        .into_iter()
        .map(|(assignee, cards)| {
            let rag = worst_of(cards.iter().filter_map(|card| card.rag));
            AssigneeRollup {
                assignee,
                rag,
                cards,
            }
        })
        .collect();

    let rag = worst_of(assignees.iter().filter_map(|a| a.rag));

    Ok(SprintRollup {
        sprint_id: sprint.sprint_id,
        sprint_name: sprint.name,
        rag,
        assignees,
    })
}

/// Aggregate a project: the worst-case rule over its sprint rollups, each
/// itself computed with the same rule.
///
/// # Errors
///
/// Returns `SprintNotFound`-family errors from nested rollups, or a
/// storage error.
pub fn project_rollup(conn: &Connection, project_id: &str) -> CoreResult<ProjectRollup> {
    if !db::sprints::project_exists(conn, project_id)? {
        return Err(CoreError::not_found(
            ErrorCode::ProjectNotFound,
            format!("project {project_id}"),
        ));
    }

    let sprints = db::sprints::for_project(conn, project_id)?;
    let mut rollups = Vec::with_capacity(sprints.len());
    for sprint in &sprints {
        rollups.push(sprint_rollup(conn, &sprint.sprint_id)?);
    }

    let rag = worst_of(rollups.iter().filter_map(|s| s.rag));

    Ok(ProjectRollup {
        project_id: project_id.to_string(),
        rag,
        sprints: rollups,
    })
}
