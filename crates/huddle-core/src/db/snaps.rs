//! Snap rows: the source of truth for every rollup.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{date_from_sql, date_to_sql, enum_from_sql, ts_from_sql, ts_to_sql};
use crate::model::{Rag, Snap};

/// A snap joined with the card context needed by summaries and lock
/// synthesis.
#[derive(Debug, Clone)]
pub struct SnapRow {
    pub snap: Snap,
    pub card_title: String,
    pub assignee_name: Option<String>,
    pub card_rag: Option<Rag>,
}

/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert(conn: &Connection, snap: &Snap) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO snaps (
            snap_id, card_id, author_id, raw_text, done, to_do, blockers,
            suggested_rag, final_rag, snap_date, slot, is_locked,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            snap.snap_id,
            snap.card_id,
            snap.author_id,
            snap.raw_text,
            snap.done,
            snap.to_do,
            snap.blockers,
            snap.suggested_rag.map(Rag::as_str),
            snap.final_rag.map(Rag::as_str),
            date_to_sql(snap.snap_date),
            snap.slot,
            i32::from(snap.is_locked),
            ts_to_sql(snap.created_at),
            ts_to_sql(snap.updated_at),
        ],
    )?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the update fails.
pub fn update(conn: &Connection, snap: &Snap) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE snaps SET
            raw_text = ?2, done = ?3, to_do = ?4, blockers = ?5,
            suggested_rag = ?6, final_rag = ?7, updated_at = ?8
         WHERE snap_id = ?1",
        params![
            snap.snap_id,
            snap.raw_text,
            snap.done,
            snap.to_do,
            snap.blockers,
            snap.suggested_rag.map(Rag::as_str),
            snap.final_rag.map(Rag::as_str),
            ts_to_sql(snap.updated_at),
        ],
    )?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete(conn: &Connection, snap_id: &str) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM snaps WHERE snap_id = ?1", params![snap_id])
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn get(conn: &Connection, snap_id: &str) -> rusqlite::Result<Option<Snap>> {
    conn.query_row(
        &format!("{SELECT_SNAP} WHERE snap_id = ?1"),
        params![snap_id],
        map_snap,
    )
    .optional()
}

/// All snaps for a card, newest first. The primary RAG path and the
/// staleness scan both depend on this ordering.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn for_card_newest_first(conn: &Connection, card_id: &str) -> rusqlite::Result<Vec<Snap>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_SNAP} WHERE card_id = ?1
         ORDER BY snap_date DESC, created_at DESC, snap_id DESC"
    ))?;
    let rows = stmt.query_map(params![card_id], map_snap)?;
    rows.collect()
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn count_for_card(conn: &Connection, card_id: &str) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM snaps WHERE card_id = ?1",
        params![card_id],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or_default())
}

/// Snaps for a sprint on a date, optionally restricted to a slot, joined
/// with their card context. Ordered by assignee then card for stable
/// summary text.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn for_sprint_and_date(
    conn: &Connection,
    sprint_id: &str,
    date: NaiveDate,
    slot: Option<u32>,
) -> rusqlite::Result<Vec<SnapRow>> {
    let base = format!(
        "SELECT {SNAP_COLS}, c.title, c.assignee_name, c.rag
         FROM snaps s
         JOIN cards c ON c.card_id = s.card_id
         WHERE c.sprint_id = ?1 AND s.snap_date = ?2"
    );
    let order = " ORDER BY c.assignee_name ASC, c.title ASC, s.created_at ASC, s.snap_id ASC";

    if let Some(slot) = slot {
        let mut stmt = conn.prepare(&format!("{base} AND s.slot = ?3{order}"))?;
        let rows = stmt.query_map(params![sprint_id, date_to_sql(date), slot], map_snap_row)?;
        rows.collect()
    } else {
        let mut stmt = conn.prepare(&format!("{base}{order}"))?;
        let rows = stmt.query_map(params![sprint_id, date_to_sql(date)], map_snap_row)?;
        rows.collect()
    }
}

/// Flip `is_locked` for every snap in scope. Returns the number of snaps
/// affected.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_locked(
    conn: &Connection,
    sprint_id: &str,
    date: NaiveDate,
    slot: Option<u32>,
    locked: bool,
) -> rusqlite::Result<usize> {
    let flag = i32::from(locked);
    if let Some(slot) = slot {
        conn.execute(
            "UPDATE snaps SET is_locked = ?4
             WHERE snap_date = ?2 AND slot = ?3
               AND card_id IN (SELECT card_id FROM cards WHERE sprint_id = ?1)",
            params![sprint_id, date_to_sql(date), slot, flag],
        )
    } else {
        conn.execute(
            "UPDATE snaps SET is_locked = ?3
             WHERE snap_date = ?2
               AND card_id IN (SELECT card_id FROM cards WHERE sprint_id = ?1)",
            params![sprint_id, date_to_sql(date), flag],
        )
    }
}

const SNAP_COLS: &str = "s.snap_id, s.card_id, s.author_id, s.raw_text, s.done, s.to_do,
        s.blockers, s.suggested_rag, s.final_rag, s.snap_date, s.slot,
        s.is_locked, s.created_at, s.updated_at";

const SELECT_SNAP: &str = "SELECT snap_id, card_id, author_id, raw_text, done, to_do, blockers,
        suggested_rag, final_rag, snap_date, slot, is_locked, created_at, updated_at
 FROM snaps";

fn map_snap(row: &Row<'_>) -> rusqlite::Result<Snap> {
    let suggested: Option<String> = row.get(7)?;
    let final_rag: Option<String> = row.get(8)?;
    let snap_date: String = row.get(9)?;
    let created: String = row.get(12)?;
    let updated: String = row.get(13)?;
    Ok(Snap {
        snap_id: row.get(0)?,
        card_id: row.get(1)?,
        author_id: row.get(2)?,
        raw_text: row.get(3)?,
        done: row.get(4)?,
        to_do: row.get(5)?,
        blockers: row.get(6)?,
        suggested_rag: suggested
            .as_deref()
            .map(|raw| enum_from_sql(7, raw))
            .transpose()?,
        final_rag: final_rag
            .as_deref()
            .map(|raw| enum_from_sql(8, raw))
            .transpose()?,
        snap_date: date_from_sql(9, &snap_date)?,
        slot: row.get(10)?,
        is_locked: row.get::<_, i64>(11)? != 0,
        created_at: ts_from_sql(12, &created)?,
        updated_at: ts_from_sql(13, &updated)?,
    })
}

fn map_snap_row(row: &Row<'_>) -> rusqlite::Result<SnapRow> {
    let snap = map_snap(row)?;
    let card_rag: Option<String> = row.get(16)?;
    Ok(SnapRow {
        snap,
        card_title: row.get(14)?,
        assignee_name: row.get(15)?,
        card_rag: card_rag
            .as_deref()
            .map(|raw| enum_from_sql(16, raw))
            .transpose()?,
    })
}
