use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Rag;

/// Structured standup fields, either classifier-derived or supplied by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapFields {
    pub done: String,
    pub to_do: String,
    pub blockers: String,
}

/// One standup update for one card on one calendar day.
///
/// `slot` is only populated for sprints configured with more than one
/// standup per day (1-based). Once `is_locked` flips, the snap is frozen
/// forever outside of the administrative unlock path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snap {
    pub snap_id: String,
    pub card_id: String,
    pub author_id: String,
    pub raw_text: String,
    pub done: String,
    pub to_do: String,
    pub blockers: String,
    pub suggested_rag: Option<Rag>,
    pub final_rag: Option<Rag>,
    pub snap_date: NaiveDate,
    pub slot: Option<u32>,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snap {
    /// Whether the author overrode the classifier's suggestion.
    #[must_use]
    pub fn is_overridden(&self) -> bool {
        self.final_rag != self.suggested_rag
    }
}
