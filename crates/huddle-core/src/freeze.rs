//! Lock manager: the exactly-once daily/slot freeze protocol.
//!
//! State machine per (sprint, date[, slot]): Open -> Locked, terminal in
//! normal operation. The UNIQUE constraint on the lock tuple is the atomic
//! guard; the lock row, the snap `is_locked` flips, the RAG history
//! upserts, and the embedded textual synthesis all commit in one
//! transaction so no partial state is ever observable.

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::clock::Clock;
use crate::db::{self, snaps::SnapRow, with_immediate_tx};
use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::model::{CardRagEntry, Rag, StandupLock};

/// Freeze a whole day for a sprint.
///
/// # Errors
///
/// `SprintNotFound` for an unknown sprint, `DateOutsideSprint` when the
/// date misses the sprint window, `AlreadyLocked` when the tuple was
/// locked before, or a storage error.
pub fn lock_day(
    conn: &Connection,
    clock: &dyn Clock,
    sprint_id: &str,
    date: NaiveDate,
    actor_id: &str,
) -> CoreResult<StandupLock> {
    acquire(conn, clock, sprint_id, date, None, Some(actor_id), false)
}

/// Freeze a single standup slot of a day.
///
/// # Errors
///
/// As [`lock_day`], plus `DayLocked` when the whole day is already frozen
/// and `SlotInvalid` for a slot outside the sprint's configuration.
pub fn lock_slot(
    conn: &Connection,
    clock: &dyn Clock,
    sprint_id: &str,
    date: NaiveDate,
    slot: u32,
    actor_id: &str,
) -> CoreResult<StandupLock> {
    acquire(conn, clock, sprint_id, date, Some(slot), Some(actor_id), false)
}

/// Scheduler-invoked variant of [`lock_day`]: silently no-ops when the
/// sprint is missing or closed, the date is out of range, or the day is
/// already locked. The scheduler has no human to report to.
///
/// # Errors
///
/// Returns only storage errors; every validation outcome is a no-op.
pub fn auto_lock_day(
    conn: &Connection,
    clock: &dyn Clock,
    sprint_id: &str,
    date: NaiveDate,
) -> CoreResult<Option<StandupLock>> {
    match acquire(conn, clock, sprint_id, date, None, None, true) {
        Ok(lock) => Ok(Some(lock)),
        Err(CoreError::NotFound { code, .. } | CoreError::Validation { code, .. }) => {
            tracing::info!(
                sprint_id,
                %date,
                reason = code.code(),
                "auto-lock skipped"
            );
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

/// Whether the tuple is frozen. A day-level lock always dominates; when a
/// slot is given its own lock also counts.
///
/// # Errors
///
/// Returns a storage error when the query fails.
pub fn is_locked(
    conn: &Connection,
    sprint_id: &str,
    date: NaiveDate,
    slot: Option<u32>,
) -> CoreResult<bool> {
    Ok(db::locks::day_or_slot_locked(conn, sprint_id, date, slot)?)
}

/// Administrative unlock: delete the lock record and thaw its snaps.
///
/// This is a destructive escape hatch, not a normal transition; every call
/// is logged as an exception path. Unlocking a day re-freezes the snaps of
/// any slot locks that still exist for that date.
///
/// # Errors
///
/// `LockNotFound` when no such lock exists, or a storage error.
pub fn unlock(
    conn: &Connection,
    sprint_id: &str,
    date: NaiveDate,
    slot: Option<u32>,
    actor_id: &str,
) -> CoreResult<()> {
    with_immediate_tx(conn, |conn| {
        let removed = db::locks::delete(conn, sprint_id, date, slot)?;
        if removed == 0 {
            return Err(CoreError::not_found(
                ErrorCode::LockNotFound,
                format!("no lock for sprint {sprint_id} on {date}"),
            ));
        }

        db::snaps::set_locked(conn, sprint_id, date, slot, false)?;

        // Snaps still covered by a surviving lock for the date stay frozen:
        // slot locks after a day-level unlock, and the day-level lock after
        // a slot unlock.
        for remaining in db::locks::for_sprint(conn, sprint_id)? {
            if remaining.lock_date == date {
                db::snaps::set_locked(conn, sprint_id, date, remaining.slot, true)?;
            }
        }

        Ok(())
    })?;

    tracing::warn!(
        sprint_id,
        %date,
        slot = slot.map_or(0, |n| n),
        actor = actor_id,
        "administrative unlock: lock record deleted and snaps thawed"
    );
    Ok(())
}

fn acquire(
    conn: &Connection,
    clock: &dyn Clock,
    sprint_id: &str,
    date: NaiveDate,
    slot: Option<u32>,
    actor_id: Option<&str>,
    auto: bool,
) -> CoreResult<StandupLock> {
    let sprint = db::sprints::get(conn, sprint_id)?.ok_or_else(|| {
        CoreError::not_found(ErrorCode::SprintNotFound, format!("sprint {sprint_id}"))
    })?;

    if auto && sprint.status == crate::model::SprintStatus::Closed {
        return Err(CoreError::validation(
            ErrorCode::SprintClosed,
            format!("sprint {sprint_id} is closed"),
        ));
    }

    if !sprint.contains(date) {
        return Err(CoreError::validation(
            ErrorCode::DateOutsideSprint,
            format!(
                "{date} is outside sprint window {}..{}",
                sprint.start_date, sprint.end_date
            ),
        ));
    }

    if let Some(slot) = slot {
        if slot < 1 || slot > sprint.standups_per_day {
            return Err(CoreError::validation(
                ErrorCode::SlotInvalid,
                format!(
                    "slot {slot} outside 1..={} for sprint {sprint_id}",
                    sprint.standups_per_day
                ),
            ));
        }
    }

    let lock = with_immediate_tx(conn, |conn| {
        // Friendly pre-checks; the UNIQUE constraint below is the real guard.
        if db::locks::exists(conn, sprint_id, date, None)? {
            let code = if slot.is_some() {
                ErrorCode::DayLocked
            } else {
                ErrorCode::AlreadyLocked
            };
            return Err(CoreError::validation(
                code,
                format!("sprint {sprint_id} is already locked for {date}"),
            ));
        }
        if slot.is_some() && db::locks::exists(conn, sprint_id, date, slot)? {
            return Err(CoreError::validation(
                ErrorCode::AlreadyLocked,
                format!("slot already locked for sprint {sprint_id} on {date}"),
            ));
        }

        let rows = db::snaps::for_sprint_and_date(conn, sprint_id, date, slot)?;
        let (done_summary, todo_summary, blockers_summary) = synthesize(&rows);

        let lock = StandupLock {
            sprint_id: sprint_id.to_string(),
            lock_date: date,
            slot,
            done_summary,
            todo_summary,
            blockers_summary,
            locked_by: actor_id.map(ToString::to_string),
            auto_locked: auto,
            created_at: clock.now(),
        };

        db::locks::insert(conn, &lock).map_err(|error| map_lock_insert_error(error, date))?;
        db::snaps::set_locked(conn, sprint_id, date, slot, true)?;
        record_day_history(conn, clock, &rows, date)?;

        Ok(lock)
    })?;

    tracing::info!(
        sprint_id,
        %date,
        slot = slot.map_or(0, |n| n),
        auto,
        "standup locked"
    );
    Ok(lock)
}

fn map_lock_insert_error(error: rusqlite::Error, date: NaiveDate) -> CoreError {
    match error {
        rusqlite::Error::SqliteFailure(cause, _)
            if cause.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            CoreError::validation(
                ErrorCode::AlreadyLocked,
                format!("concurrent lock already created for {date}"),
            )
        }
        other => CoreError::Storage(other),
    }
}

/// Bullet-concatenate the day's structured fields. A snap with an empty
/// field contributes nothing to that buffer; an empty day yields sentinel
/// text so the lock record is never blank.
fn synthesize(rows: &[SnapRow]) -> (String, String, String) {
    let mut done = Vec::new();
    let mut to_do = Vec::new();
    let mut blockers = Vec::new();

    for row in rows {
        push_bullet(&mut done, &row.card_title, &row.snap.done);
        push_bullet(&mut to_do, &row.card_title, &row.snap.to_do);
        push_bullet(&mut blockers, &row.card_title, &row.snap.blockers);
    }

    (
        join_or(&done, "No updates recorded"),
        join_or(&to_do, "None"),
        join_or(&blockers, "None"),
    )
}

fn push_bullet(buffer: &mut Vec<String>, card_title: &str, content: &str) {
    let trimmed = content.trim();
    if !trimmed.is_empty() {
        buffer.push(format!("- [{card_title}] {trimmed}"));
    }
}

fn join_or(lines: &[String], sentinel: &str) -> String {
    if lines.is_empty() {
        sentinel.to_string()
    } else {
        lines.join("\n")
    }
}

/// Upsert one RAG history row per card captured by this lock, recording
/// the card's RAG at this moment and whether the author overrode the
/// classifier's suggestion.
fn record_day_history(
    conn: &Connection,
    clock: &dyn Clock,
    rows: &[SnapRow],
    date: NaiveDate,
) -> CoreResult<()> {
    use std::collections::BTreeMap;

    // Rows are ordered with each card's snaps adjacent and ascending, so
    // the last row seen per card is its latest snap of the day.
    let mut latest_per_card: BTreeMap<&str, &SnapRow> = BTreeMap::new();
    for row in rows {
        latest_per_card.insert(row.snap.card_id.as_str(), row);
    }

    for (card_id, row) in latest_per_card {
        let rag = row
            .card_rag
            .or(row.snap.final_rag)
            .unwrap_or(Rag::Amber);
        let overridden = row.snap.is_overridden();
        db::history::upsert(
            conn,
            &CardRagEntry {
                card_id: card_id.to_string(),
                rag_date: date,
                rag,
                overridden,
                overridden_by: overridden.then(|| row.snap.author_id.clone()),
                recorded_at: clock.now(),
            },
        )?;
    }

    Ok(())
}
