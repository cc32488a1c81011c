//! Card rows. The engine owns only the `status` and `rag` columns here.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{enum_from_sql, ts_from_sql, ts_to_sql};
use crate::model::{Card, CardStatus, Rag};

/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert(conn: &Connection, card: &Card) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO cards (
            card_id, sprint_id, project_id, assignee_id, assignee_name, title,
            estimated_hours, status, rag, completed_at, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            card.card_id,
            card.sprint_id,
            card.project_id,
            card.assignee_id,
            card.assignee_name,
            card.title,
            card.estimated_hours,
            card.status.as_str(),
            card.rag.map(Rag::as_str),
            card.completed_at.map(ts_to_sql),
            ts_to_sql(card.created_at),
        ],
    )?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn get(conn: &Connection, card_id: &str) -> rusqlite::Result<Option<Card>> {
    conn.query_row(
        &format!("{SELECT_CARD} WHERE card_id = ?1"),
        params![card_id],
        map_card,
    )
    .optional()
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn for_sprint(conn: &Connection, sprint_id: &str) -> rusqlite::Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_CARD} WHERE sprint_id = ?1 ORDER BY created_at ASC, card_id ASC"
    ))?;
    let rows = stmt.query_map(params![sprint_id], map_card)?;
    rows.collect()
}

/// # Errors
///
/// Returns an error if the update fails.
pub fn set_rag(conn: &Connection, card_id: &str, rag: Rag) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE cards SET rag = ?2 WHERE card_id = ?1",
        params![card_id, rag.as_str()],
    )?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the update fails.
pub fn set_status(conn: &Connection, card_id: &str, status: CardStatus) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE cards SET status = ?2 WHERE card_id = ?1",
        params![card_id, status.as_str()],
    )?;
    Ok(())
}

const SELECT_CARD: &str = "SELECT card_id, sprint_id, project_id, assignee_id, assignee_name,
        title, estimated_hours, status, rag, completed_at, created_at
 FROM cards";

fn map_card(row: &Row<'_>) -> rusqlite::Result<Card> {
    let status: String = row.get(7)?;
    let rag: Option<String> = row.get(8)?;
    let completed: Option<String> = row.get(9)?;
    let created: String = row.get(10)?;
    Ok(Card {
        card_id: row.get(0)?,
        sprint_id: row.get(1)?,
        project_id: row.get(2)?,
        assignee_id: row.get(3)?,
        assignee_name: row.get(4)?,
        title: row.get(5)?,
        estimated_hours: row.get(6)?,
        status: enum_from_sql(7, &status)?,
        rag: rag.as_deref().map(|raw| enum_from_sql(8, raw)).transpose()?,
        completed_at: completed
            .as_deref()
            .map(|raw| ts_from_sql(9, raw))
            .transpose()?,
        created_at: ts_from_sql(10, &created)?,
    })
}
