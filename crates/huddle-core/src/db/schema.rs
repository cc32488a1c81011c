//! Canonical SQLite schema for the huddle store.
//!
//! - `projects` / `sprints` / `cards` hold the plumbing entities owned by
//!   the CRUD layer; the engine only mutates `cards.status` and `cards.rag`
//! - `snaps` is the source of truth for every rollup
//! - `standup_locks` encodes the day-level lock as `slot = 0` so the
//!   UNIQUE constraint is the atomic exactly-once guard for both the daily
//!   and per-slot variants (SQL NULLs compare distinct under UNIQUE)
//! - `card_rag_history` and `daily_summaries` are append-once artifacts
//!   with their uniqueness enforced by primary keys

/// Migration v1: full store schema.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    project_id TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sprints (
    sprint_id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(project_id),
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    status TEXT NOT NULL DEFAULT 'planned'
        CHECK (status IN ('planned', 'active', 'completed', 'closed')),
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    standups_per_day INTEGER NOT NULL DEFAULT 1 CHECK (standups_per_day >= 1),
    created_at TEXT NOT NULL,
    CHECK (start_date <= end_date)
);

CREATE INDEX IF NOT EXISTS idx_sprints_project
    ON sprints(project_id);

CREATE TABLE IF NOT EXISTS cards (
    card_id TEXT PRIMARY KEY,
    sprint_id TEXT NOT NULL REFERENCES sprints(sprint_id),
    project_id TEXT NOT NULL REFERENCES projects(project_id),
    assignee_id TEXT,
    assignee_name TEXT,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    estimated_hours REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'not_started'
        CHECK (status IN ('not_started', 'in_progress', 'completed', 'closed')),
    rag TEXT CHECK (rag IS NULL OR rag IN ('red', 'amber', 'green')),
    completed_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cards_sprint
    ON cards(sprint_id);

CREATE TABLE IF NOT EXISTS snaps (
    snap_id TEXT PRIMARY KEY,
    card_id TEXT NOT NULL REFERENCES cards(card_id) ON DELETE CASCADE,
    author_id TEXT NOT NULL,
    raw_text TEXT NOT NULL,
    done TEXT NOT NULL DEFAULT '',
    to_do TEXT NOT NULL DEFAULT '',
    blockers TEXT NOT NULL DEFAULT '',
    suggested_rag TEXT CHECK (suggested_rag IS NULL OR suggested_rag IN ('red', 'amber', 'green')),
    final_rag TEXT CHECK (final_rag IS NULL OR final_rag IN ('red', 'amber', 'green')),
    snap_date TEXT NOT NULL,
    slot INTEGER CHECK (slot IS NULL OR slot >= 1),
    is_locked INTEGER NOT NULL DEFAULT 0 CHECK (is_locked IN (0, 1)),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_snaps_card_date
    ON snaps(card_id, snap_date DESC, created_at DESC);

CREATE INDEX IF NOT EXISTS idx_snaps_date
    ON snaps(snap_date);

CREATE TABLE IF NOT EXISTS standup_locks (
    lock_id INTEGER PRIMARY KEY AUTOINCREMENT,
    sprint_id TEXT NOT NULL REFERENCES sprints(sprint_id),
    lock_date TEXT NOT NULL,
    slot INTEGER NOT NULL DEFAULT 0 CHECK (slot >= 0),
    done_summary TEXT NOT NULL DEFAULT '',
    todo_summary TEXT NOT NULL DEFAULT '',
    blockers_summary TEXT NOT NULL DEFAULT '',
    locked_by TEXT,
    auto_locked INTEGER NOT NULL DEFAULT 0 CHECK (auto_locked IN (0, 1)),
    created_at TEXT NOT NULL,
    UNIQUE (sprint_id, lock_date, slot)
);

CREATE TABLE IF NOT EXISTS card_rag_history (
    card_id TEXT NOT NULL REFERENCES cards(card_id) ON DELETE CASCADE,
    rag_date TEXT NOT NULL,
    rag TEXT NOT NULL CHECK (rag IN ('red', 'amber', 'green')),
    overridden INTEGER NOT NULL DEFAULT 0 CHECK (overridden IN (0, 1)),
    overridden_by TEXT,
    recorded_at TEXT NOT NULL,
    PRIMARY KEY (card_id, rag_date)
);

CREATE TABLE IF NOT EXISTS daily_summaries (
    sprint_id TEXT NOT NULL REFERENCES sprints(sprint_id),
    summary_date TEXT NOT NULL,
    done_text TEXT NOT NULL,
    todo_text TEXT NOT NULL,
    blockers_text TEXT NOT NULL,
    rag_breakdown TEXT NOT NULL,
    assignee_detail TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (sprint_id, summary_date)
);
";

/// Indexes that must exist after migration, checked by tests.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_sprints_project",
    "idx_cards_sprint",
    "idx_snaps_card_date",
    "idx_snaps_date",
];
