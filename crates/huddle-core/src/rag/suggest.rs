//! System-suggested RAG: the elaborate secondary computation used to
//! pre-populate a suggestion before a human override.
//!
//! Evaluation is RED-conditions-first (staleness, timeline deviation,
//! severe blocker), then AMBER conditions, with GREEN as the fallback:
//! first match wins.

use chrono::NaiveDate;

use crate::config::RagTuning;
use crate::model::{Card, Rag, Snap};

/// Blocker phrases that immediately force RED when present in the
/// candidate's blockers text.
pub const SEVERE_BLOCKER_WORDS: &[&str] = &[
    "blocked",
    "critical",
    "urgent",
    "severe",
    "major",
    "cannot proceed",
    "showstopper",
    "production down",
    "client escalation",
];

/// Candidate snap content the suggestion is computed against.
#[derive(Debug, Clone, Copy, Default)]
pub struct Candidate<'a> {
    pub done: &'a str,
    pub blockers: &'a str,
}

/// Compute the system-suggested RAG for a candidate snap on `card`.
///
/// `prior_snaps` must be ordered newest first and exclude the candidate
/// itself.
#[must_use]
pub fn system_suggested_rag(
    card: &Card,
    prior_snaps: &[Snap],
    candidate: Candidate<'_>,
    today: NaiveDate,
    tuning: &RagTuning,
) -> Rag {
    let deviation = timeline_deviation_pct(card, prior_snaps, today, tuning.workday_hours);

    if consecutive_empty_done(prior_snaps) >= 2 {
        return Rag::Red;
    }
    if deviation > tuning.deviation_threshold_pct {
        return Rag::Red;
    }
    if has_severe_blocker(candidate.blockers) {
        return Rag::Red;
    }

    if deviation > 0.0 {
        return Rag::Amber;
    }
    if !candidate.blockers.trim().is_empty() {
        return Rag::Amber;
    }
    if candidate.done.trim().is_empty() {
        return Rag::Amber;
    }

    Rag::Green
}

/// Consecutive most-recent snaps with empty `done`, scanning newest-first
/// and stopping at the first snap that reported progress.
fn consecutive_empty_done(prior_snaps: &[Snap]) -> usize {
    prior_snaps
        .iter()
        .take_while(|snap| snap.done.trim().is_empty())
        .count()
}

/// Percentage by which elapsed working time exceeds the card's estimate,
/// floored at zero. The baseline day is the first snap's date, or the
/// card's creation date when no snaps exist yet.
fn timeline_deviation_pct(
    card: &Card,
    prior_snaps: &[Snap],
    today: NaiveDate,
    workday_hours: f64,
) -> f64 {
    if card.estimated_hours <= 0.0 {
        return 0.0;
    }

    let baseline = prior_snaps
        .last()
        .map_or_else(|| card.created_date(), |first| first.snap_date);
    let days_elapsed = (today - baseline).num_days().max(0);

    #[allow(clippy::cast_precision_loss)]
    let hours_spent = (days_elapsed + 1) as f64 * workday_hours;
    let deviation = (hours_spent - card.estimated_hours) / card.estimated_hours * 100.0;
    deviation.max(0.0)
}

fn has_severe_blocker(blockers: &str) -> bool {
    let lower = blockers.to_ascii_lowercase();
    SEVERE_BLOCKER_WORDS
        .iter()
        .any(|word| lower.contains(word))
}
