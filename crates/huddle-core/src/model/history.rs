use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Rag;

/// The RAG that was in effect for a card on a given calendar day.
///
/// Unique per (card, date); written at lock time and on manual override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRagEntry {
    pub card_id: String,
    pub rag_date: NaiveDate,
    pub rag: Rag,
    pub overridden: bool,
    pub overridden_by: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
