use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Rag;

/// Count of snaps (or assignees) per RAG color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagTally {
    pub green: u32,
    pub amber: u32,
    pub red: u32,
}

impl RagTally {
    pub fn record(&mut self, rag: Rag) {
        match rag {
            Rag::Green => self.green += 1,
            Rag::Amber => self.amber += 1,
            Rag::Red => self.red += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.green + self.amber + self.red
    }
}

/// Three-tier RAG distribution embedded in a daily summary.
///
/// `sprint_level` uses the majority rule, which can disagree with the
/// hierarchical worst-case rollup for the same sprint and date. Both are
/// kept deliberately; see DESIGN.md.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagBreakdown {
    pub card_level: RagTally,
    pub assignee_level: RagTally,
    pub sprint_level: Rag,
}

/// One snap's contribution to an assignee's section of the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeEntry {
    pub card_title: String,
    pub done: String,
    pub to_do: String,
    pub blockers: String,
    pub final_rag: Option<Rag>,
}

/// Per-assignee section of the summary: the worst RAG across that
/// assignee's snaps for the day plus the snaps themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeSummary {
    pub assignee: String,
    pub rag: Rag,
    pub entries: Vec<AssigneeEntry>,
}

/// Immutable aggregation artifact, one per (sprint, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub sprint_id: String,
    pub summary_date: NaiveDate,
    pub done_text: String,
    pub todo_text: String,
    pub blockers_text: String,
    pub breakdown: RagBreakdown,
    pub assignees: Vec<AssigneeSummary>,
    pub created_at: DateTime<Utc>,
}
