//! SQLite schema migrations for the huddle store.

use super::schema;
use rusqlite::{types::Type, Connection};

/// Latest schema version understood by this binary.
pub const LATEST_SCHEMA_VERSION: u32 = 1;

const MIGRATIONS: &[(u32, &str)] = &[(1, schema::MIGRATION_V1_SQL)];

/// Read `PRAGMA user_version` and convert it to a Rust `u32`.
///
/// # Errors
///
/// Returns an error if querying SQLite fails or the version value cannot be
/// represented as `u32`.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(version).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(error))
    })
}

/// Apply all pending migrations in ascending order.
///
/// Migrations are idempotent because:
/// - each migration only runs when `migration.version > user_version`
/// - migration SQL itself uses `IF NOT EXISTS` for DDL safety
///
/// # Errors
///
/// Returns an error if any migration fails.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let mut current = current_schema_version(conn)?;

    for (version, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }

        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", i64::from(*version))?;
        tx.commit()?;
        current = *version;
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::{current_schema_version, migrate, LATEST_SCHEMA_VERSION};
    use crate::db::schema;
    use rusqlite::{params, Connection};

    fn sqlite_object_exists(
        conn: &Connection,
        object_type: &str,
        object_name: &str,
    ) -> rusqlite::Result<bool> {
        conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            )",
            params![object_type, object_name],
            |row| row.get(0),
        )
    }

    #[test]
    fn migrate_empty_db_to_latest() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        let applied = migrate(&mut conn)?;
        assert_eq!(applied, LATEST_SCHEMA_VERSION);
        assert_eq!(current_schema_version(&conn)?, LATEST_SCHEMA_VERSION);

        for table in [
            "projects",
            "sprints",
            "cards",
            "snaps",
            "standup_locks",
            "card_rag_history",
            "daily_summaries",
        ] {
            assert!(
                sqlite_object_exists(&conn, "table", table)?,
                "missing expected table {table}"
            );
        }

        for index in schema::REQUIRED_INDEXES {
            assert!(
                sqlite_object_exists(&conn, "index", index)?,
                "missing expected index {index}"
            );
        }

        Ok(())
    }

    #[test]
    fn migrate_is_idempotent() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);
        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);

        Ok(())
    }

    #[test]
    fn lock_uniqueness_covers_day_and_slot() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;
        migrate(&mut conn)?;

        conn.execute(
            "INSERT INTO projects (project_id, name, created_at) VALUES ('p1', 'P', 't')",
            [],
        )?;
        conn.execute(
            "INSERT INTO sprints (sprint_id, project_id, name, status, start_date, end_date, standups_per_day, created_at)
             VALUES ('s1', 'p1', 'S', 'active', '2025-01-01', '2025-01-14', 1, 't')",
            [],
        )?;

        conn.execute(
            "INSERT INTO standup_locks (sprint_id, lock_date, slot, created_at)
             VALUES ('s1', '2025-01-05', 0, 't')",
            [],
        )?;

        let duplicate = conn.execute(
            "INSERT INTO standup_locks (sprint_id, lock_date, slot, created_at)
             VALUES ('s1', '2025-01-05', 0, 't')",
            [],
        );
        assert!(duplicate.is_err(), "day-level duplicate must be rejected");

        // A different slot on the same day is a distinct tuple.
        conn.execute(
            "INSERT INTO standup_locks (sprint_id, lock_date, slot, created_at)
             VALUES ('s1', '2025-01-05', 1, 't')",
            [],
        )?;

        Ok(())
    }
}
