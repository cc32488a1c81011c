//! Lock rows. The day-level lock is stored as `slot = 0`; the UNIQUE
//! constraint on (sprint, date, slot) is the atomic exactly-once guard.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{date_from_sql, date_to_sql, ts_from_sql, ts_to_sql};
use crate::model::StandupLock;

const fn slot_to_sql(slot: Option<u32>) -> u32 {
    match slot {
        Some(n) => n,
        None => 0,
    }
}

/// Insert the lock record. A UNIQUE-constraint failure here means the
/// tuple is already locked; callers translate it to a validation error.
///
/// # Errors
///
/// Returns an error if the insert fails, including on duplicate tuples.
pub fn insert(conn: &Connection, lock: &StandupLock) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO standup_locks (
            sprint_id, lock_date, slot, done_summary, todo_summary,
            blockers_summary, locked_by, auto_locked, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            lock.sprint_id,
            date_to_sql(lock.lock_date),
            slot_to_sql(lock.slot),
            lock.done_summary,
            lock.todo_summary,
            lock.blockers_summary,
            lock.locked_by,
            i32::from(lock.auto_locked),
            ts_to_sql(lock.created_at),
        ],
    )?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn get(
    conn: &Connection,
    sprint_id: &str,
    date: NaiveDate,
    slot: Option<u32>,
) -> rusqlite::Result<Option<StandupLock>> {
    conn.query_row(
        &format!("{SELECT_LOCK} WHERE sprint_id = ?1 AND lock_date = ?2 AND slot = ?3"),
        params![sprint_id, date_to_sql(date), slot_to_sql(slot)],
        map_lock,
    )
    .optional()
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn exists(
    conn: &Connection,
    sprint_id: &str,
    date: NaiveDate,
    slot: Option<u32>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM standup_locks
            WHERE sprint_id = ?1 AND lock_date = ?2 AND slot = ?3
        )",
        params![sprint_id, date_to_sql(date), slot_to_sql(slot)],
        |row| row.get(0),
    )
}

/// Whether the tuple is frozen: a day-level lock always dominates; a slot
/// query additionally matches its own slot lock.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn day_or_slot_locked(
    conn: &Connection,
    sprint_id: &str,
    date: NaiveDate,
    slot: Option<u32>,
) -> rusqlite::Result<bool> {
    if exists(conn, sprint_id, date, None)? {
        return Ok(true);
    }
    match slot {
        Some(_) => exists(conn, sprint_id, date, slot),
        None => Ok(false),
    }
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn for_sprint(conn: &Connection, sprint_id: &str) -> rusqlite::Result<Vec<StandupLock>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_LOCK} WHERE sprint_id = ?1 ORDER BY lock_date ASC, slot ASC"
    ))?;
    let rows = stmt.query_map(params![sprint_id], map_lock)?;
    rows.collect()
}

/// Remove a lock record. Administrative escape hatch only. Returns the
/// number of rows removed (0 when no such lock existed).
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete(
    conn: &Connection,
    sprint_id: &str,
    date: NaiveDate,
    slot: Option<u32>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM standup_locks WHERE sprint_id = ?1 AND lock_date = ?2 AND slot = ?3",
        params![sprint_id, date_to_sql(date), slot_to_sql(slot)],
    )
}

const SELECT_LOCK: &str = "SELECT sprint_id, lock_date, slot, done_summary, todo_summary,
        blockers_summary, locked_by, auto_locked, created_at
 FROM standup_locks";

fn map_lock(row: &Row<'_>) -> rusqlite::Result<StandupLock> {
    let lock_date: String = row.get(1)?;
    let slot: u32 = row.get(2)?;
    let created: String = row.get(8)?;
    Ok(StandupLock {
        sprint_id: row.get(0)?,
        lock_date: date_from_sql(1, &lock_date)?,
        slot: (slot > 0).then_some(slot),
        done_summary: row.get(3)?,
        todo_summary: row.get(4)?,
        blockers_summary: row.get(5)?,
        locked_by: row.get(6)?,
        auto_locked: row.get::<_, i64>(7)? != 0,
        created_at: ts_from_sql(8, &created)?,
    })
}
