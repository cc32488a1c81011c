use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One freeze record per (sprint, date) or (sprint, date, slot).
///
/// `slot = None` is the day-level lock, which dominates every slot. The
/// synthesized summary text is captured at lock time and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandupLock {
    pub sprint_id: String,
    pub lock_date: NaiveDate,
    pub slot: Option<u32>,
    pub done_summary: String,
    pub todo_summary: String,
    pub blockers_summary: String,
    pub locked_by: Option<String>,
    pub auto_locked: bool,
    pub created_at: DateTime<Utc>,
}

impl StandupLock {
    /// Whether this record freezes the whole day rather than a single slot.
    #[must_use]
    pub fn is_day_level(&self) -> bool {
        self.slot.is_none()
    }
}
