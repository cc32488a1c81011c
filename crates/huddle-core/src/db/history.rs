//! Card RAG history: one row per (card, date), upserted at lock time and
//! on manual override.

use rusqlite::{params, Connection, Row};

use super::{date_from_sql, date_to_sql, enum_from_sql, ts_from_sql, ts_to_sql};
use crate::model::{CardRagEntry, Rag};

/// # Errors
///
/// Returns an error if the upsert fails.
pub fn upsert(conn: &Connection, entry: &CardRagEntry) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO card_rag_history (
            card_id, rag_date, rag, overridden, overridden_by, recorded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT (card_id, rag_date) DO UPDATE SET
            rag = excluded.rag,
            overridden = excluded.overridden,
            overridden_by = excluded.overridden_by,
            recorded_at = excluded.recorded_at",
        params![
            entry.card_id,
            date_to_sql(entry.rag_date),
            entry.rag.as_str(),
            i32::from(entry.overridden),
            entry.overridden_by,
            ts_to_sql(entry.recorded_at),
        ],
    )?;
    Ok(())
}

/// History for a card, most recent day first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn for_card(conn: &Connection, card_id: &str) -> rusqlite::Result<Vec<CardRagEntry>> {
    let mut stmt = conn.prepare(
        "SELECT card_id, rag_date, rag, overridden, overridden_by, recorded_at
         FROM card_rag_history
         WHERE card_id = ?1
         ORDER BY rag_date DESC",
    )?;
    let rows = stmt.query_map(params![card_id], map_entry)?;
    rows.collect()
}

fn map_entry(row: &Row<'_>) -> rusqlite::Result<CardRagEntry> {
    let rag_date: String = row.get(1)?;
    let rag: String = row.get(2)?;
    let recorded: String = row.get(5)?;
    Ok(CardRagEntry {
        card_id: row.get(0)?,
        rag_date: date_from_sql(1, &rag_date)?,
        rag: enum_from_sql::<Rag>(2, &rag)?,
        overridden: row.get::<_, i64>(3)? != 0,
        overridden_by: row.get(4)?,
        recorded_at: ts_from_sql(5, &recorded)?,
    })
}
