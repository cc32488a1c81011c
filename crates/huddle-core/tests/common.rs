//! Shared fixtures for huddle-core integration tests.
#![allow(dead_code)] // each test binary uses a different subset

use chrono::{NaiveDate, TimeZone, Utc};
use huddle_core::clock::Clock;
use huddle_core::config::RagTuning;
use huddle_core::db;
use huddle_core::model::{Card, CardStatus, Sprint, SprintStatus};
use huddle_core::StandupService;
use rusqlite::Connection;

pub fn store() -> Connection {
    db::open_in_memory().expect("open in-memory store")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn service<'a>(conn: &'a Connection, clock: &'a dyn Clock) -> StandupService<'a> {
    StandupService::new(conn, None, clock, RagTuning::default())
}

pub fn seed_project(conn: &Connection, project_id: &str) {
    db::sprints::insert_project(
        conn,
        project_id,
        "Atlas",
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).expect("ts"),
    )
    .expect("insert project");
}

pub fn seed_sprint(
    conn: &Connection,
    sprint_id: &str,
    project_id: &str,
    status: SprintStatus,
    start: NaiveDate,
    end: NaiveDate,
    standups_per_day: u32,
) -> Sprint {
    let sprint = Sprint {
        sprint_id: sprint_id.to_string(),
        project_id: project_id.to_string(),
        name: format!("Sprint {sprint_id}"),
        status,
        start_date: start,
        end_date: end,
        standups_per_day,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).expect("ts"),
    };
    db::sprints::insert(conn, &sprint).expect("insert sprint");
    sprint
}

pub fn seed_card(
    conn: &Connection,
    card_id: &str,
    sprint_id: &str,
    project_id: &str,
    assignee_name: Option<&str>,
    estimated_hours: f64,
) -> Card {
    let card = Card {
        card_id: card_id.to_string(),
        sprint_id: sprint_id.to_string(),
        project_id: project_id.to_string(),
        assignee_id: assignee_name.map(|name| format!("id-{name}")),
        assignee_name: assignee_name.map(ToString::to_string),
        title: format!("Card {card_id}"),
        estimated_hours,
        status: CardStatus::NotStarted,
        rag: None,
        completed_at: None,
        created_at: Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).expect("ts"),
    };
    db::cards::insert(conn, &card).expect("insert card");
    card
}

/// Standard fixture: one project, one active two-week sprint starting
/// 2025-01-06, one 16-hour card assigned to Avery.
pub fn standard_fixture(conn: &Connection) -> (Sprint, Card) {
    seed_project(conn, "p1");
    let sprint = seed_sprint(
        conn,
        "s1",
        "p1",
        SprintStatus::Active,
        date(2025, 1, 6),
        date(2025, 1, 17),
        1,
    );
    let card = seed_card(conn, "c1", "s1", "p1", Some("Avery"), 16.0);
    (sprint, card)
}
