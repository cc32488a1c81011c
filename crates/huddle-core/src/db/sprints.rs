//! Sprint and project rows. Plumbing entities: the engine reads them for
//! validation and rollup scoping but never mutates them.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{date_from_sql, date_to_sql, enum_from_sql, ts_from_sql, ts_to_sql};
use crate::model::Sprint;

/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_project(
    conn: &Connection,
    project_id: &str,
    name: &str,
    created_at: chrono::DateTime<chrono::Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO projects (project_id, name, created_at) VALUES (?1, ?2, ?3)",
        params![project_id, name, ts_to_sql(created_at)],
    )?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn project_exists(conn: &Connection, project_id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM projects WHERE project_id = ?1)",
        params![project_id],
        |row| row.get(0),
    )
}

/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert(conn: &Connection, sprint: &Sprint) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO sprints (
            sprint_id, project_id, name, status, start_date, end_date,
            standups_per_day, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            sprint.sprint_id,
            sprint.project_id,
            sprint.name,
            sprint.status.as_str(),
            date_to_sql(sprint.start_date),
            date_to_sql(sprint.end_date),
            sprint.standups_per_day,
            ts_to_sql(sprint.created_at),
        ],
    )?;
    Ok(())
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn get(conn: &Connection, sprint_id: &str) -> rusqlite::Result<Option<Sprint>> {
    conn.query_row(
        &format!("{SELECT_SPRINT} WHERE sprint_id = ?1"),
        params![sprint_id],
        map_sprint,
    )
    .optional()
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn for_project(conn: &Connection, project_id: &str) -> rusqlite::Result<Vec<Sprint>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_SPRINT} WHERE project_id = ?1 ORDER BY start_date ASC, sprint_id ASC"
    ))?;
    let rows = stmt.query_map(params![project_id], map_sprint)?;
    rows.collect()
}

/// # Errors
///
/// Returns an error if the query fails.
pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Sprint>> {
    let mut stmt =
        conn.prepare(&format!("{SELECT_SPRINT} ORDER BY start_date ASC, sprint_id ASC"))?;
    let rows = stmt.query_map([], map_sprint)?;
    rows.collect()
}

const SELECT_SPRINT: &str = "SELECT sprint_id, project_id, name, status, start_date, end_date,
        standups_per_day, created_at
 FROM sprints";

fn map_sprint(row: &Row<'_>) -> rusqlite::Result<Sprint> {
    let status: String = row.get(3)?;
    let start: String = row.get(4)?;
    let end: String = row.get(5)?;
    let created: String = row.get(7)?;
    Ok(Sprint {
        sprint_id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        status: enum_from_sql(3, &status)?,
        start_date: date_from_sql(4, &start)?,
        end_date: date_from_sql(5, &end)?,
        standups_per_day: row.get(6)?,
        created_at: ts_from_sql(7, &created)?,
    })
}
