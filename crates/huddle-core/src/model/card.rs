use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, Rag};

/// Lifecycle states of a card.
///
/// This subsystem only ever advances `NotStarted -> InProgress` (on the
/// card's first snap); the remaining transitions belong to the card CRUD
/// layer upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    NotStarted,
    InProgress,
    Completed,
    Closed,
}

impl CardStatus {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                expected: "card status",
                got: s.to_string(),
            }),
        }
    }
}

/// A trackable work item inside a sprint.
///
/// The rollup engine mutates only `rag` and `status`; every other field is
/// owned by the card CRUD layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub card_id: String,
    pub sprint_id: String,
    pub project_id: String,
    pub assignee_id: Option<String>,
    pub assignee_name: Option<String>,
    pub title: String,
    pub estimated_hours: f64,
    pub status: CardStatus,
    pub rag: Option<Rag>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    /// Calendar day the card came into existence, used as the timeline
    /// baseline when a card has no snaps yet.
    #[must_use]
    pub fn created_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::CardStatus;
    use std::str::FromStr;

    #[test]
    fn status_roundtrips() {
        for status in [
            CardStatus::NotStarted,
            CardStatus::InProgress,
            CardStatus::Completed,
            CardStatus::Closed,
        ] {
            assert_eq!(CardStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }

    #[test]
    fn status_rejects_unknown() {
        assert!(CardStatus::from_str("paused").is_err());
    }
}
