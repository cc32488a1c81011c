//! Daily summary artifacts. Append-once: the primary key on
//! (sprint, date) plus `INSERT OR IGNORE` makes generation idempotent even
//! under concurrent generators.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{date_from_sql, date_to_sql, ts_from_sql, ts_to_sql};
use crate::model::DailySummary;

/// Insert the summary unless one already exists for the tuple. Returns
/// `true` when this call created the row.
///
/// # Errors
///
/// Returns an error if the insert or JSON encoding fails.
pub fn insert_if_absent(conn: &Connection, summary: &DailySummary) -> rusqlite::Result<bool> {
    let breakdown = serde_json::to_string(&summary.breakdown)
        .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;
    let assignees = serde_json::to_string(&summary.assignees)
        .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;

    let changed = conn.execute(
        "INSERT OR IGNORE INTO daily_summaries (
            sprint_id, summary_date, done_text, todo_text, blockers_text,
            rag_breakdown, assignee_detail, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            summary.sprint_id,
            date_to_sql(summary.summary_date),
            summary.done_text,
            summary.todo_text,
            summary.blockers_text,
            breakdown,
            assignees,
            ts_to_sql(summary.created_at),
        ],
    )?;
    Ok(changed > 0)
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn get(
    conn: &Connection,
    sprint_id: &str,
    date: NaiveDate,
) -> rusqlite::Result<Option<DailySummary>> {
    conn.query_row(
        "SELECT sprint_id, summary_date, done_text, todo_text, blockers_text,
                rag_breakdown, assignee_detail, created_at
         FROM daily_summaries
         WHERE sprint_id = ?1 AND summary_date = ?2",
        params![sprint_id, date_to_sql(date)],
        map_summary,
    )
    .optional()
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<DailySummary> {
    let summary_date: String = row.get(1)?;
    let breakdown: String = row.get(5)?;
    let assignees: String = row.get(6)?;
    let created: String = row.get(7)?;
    Ok(DailySummary {
        sprint_id: row.get(0)?,
        summary_date: date_from_sql(1, &summary_date)?,
        done_text: row.get(2)?,
        todo_text: row.get(3)?,
        blockers_text: row.get(4)?,
        breakdown: serde_json::from_str(&breakdown).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(error))
        })?,
        assignees: serde_json::from_str(&assignees).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(error))
        })?,
        created_at: ts_from_sql(7, &created)?,
    })
}
