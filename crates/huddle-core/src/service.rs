//! Snapshot service: the only component orchestrating callers invoke.
//!
//! Every mutation runs in a request-scoped `BEGIN IMMEDIATE` transaction:
//! the snap write happens-before the card RAG recompute, which
//! happens-before the response. SQLite's single-writer semantics serialize
//! concurrent mutations for the same card, so the read-modify-write on the
//! card row cannot lose updates.

use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use crate::classify::{classify_resilient, Classification, TextClassifier};
use crate::clock::Clock;
use crate::config::RagTuning;
use crate::db::{self, snaps::SnapRow, with_immediate_tx};
use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::freeze;
use crate::model::{
    Card, CardRagEntry, CardStatus, DailySummary, Rag, Snap, SnapFields, SprintStatus,
    StandupLock,
};
use crate::rag::{
    recompute_card_rag, rollup, suggest, ProjectRollup, SprintRollup,
};
use crate::summary;

/// Input for [`StandupService::create_snap`].
///
/// When `fields` is absent the raw text is routed through the classifier
/// (with the deterministic fallback). `final_rag` is the author/SM
/// override; it defaults to the classifier's suggestion.
#[derive(Debug, Clone)]
pub struct CreateSnapRequest {
    pub card_id: String,
    pub author_id: String,
    pub raw_text: String,
    pub fields: Option<SnapFields>,
    pub final_rag: Option<Rag>,
    pub slot: Option<u32>,
}

/// Input for [`StandupService::update_snap`].
///
/// `regenerate` re-invokes the classifier on the (possibly edited) raw
/// text and overwrites the derived fields while preserving any explicit
/// final-RAG override. `elevated` asserts the caller holds the "edit any"
/// capability granted upstream; ownership is not re-derived here.
#[derive(Debug, Clone)]
pub struct UpdateSnapRequest {
    pub snap_id: String,
    pub author_id: String,
    pub raw_text: Option<String>,
    pub fields: Option<SnapFields>,
    pub final_rag: Option<Rag>,
    pub regenerate: bool,
    pub elevated: bool,
}

/// Request-scoped orchestrator over the store, classifier, and clock.
pub struct StandupService<'a> {
    conn: &'a Connection,
    classifier: Option<&'a dyn TextClassifier>,
    clock: &'a dyn Clock,
    tuning: RagTuning,
}

impl<'a> StandupService<'a> {
    #[must_use]
    pub fn new(
        conn: &'a Connection,
        classifier: Option<&'a dyn TextClassifier>,
        clock: &'a dyn Clock,
        tuning: RagTuning,
    ) -> Self {
        Self {
            conn,
            classifier,
            clock,
            tuning,
        }
    }

    // -----------------------------------------------------------------------
    // Snap lifecycle
    // -----------------------------------------------------------------------

    /// Create a snap for today against a card.
    ///
    /// # Errors
    ///
    /// `CardNotFound`; `EffortRequired` when the card has no positive
    /// estimate; `SprintClosed`/`SprintNotActive`; `DayLocked` when today
    /// is already frozen; `DateOutsideSprint`; `SlotInvalid`; or a storage
    /// error. Classifier failures are recovered internally and never
    /// surface.
    pub fn create_snap(&self, request: CreateSnapRequest) -> CoreResult<Snap> {
        let card = self.require_card(&request.card_id)?;
        let sprint = self.require_sprint_of(&card)?;
        let today = self.clock.today();
        self.guard_snappable(&card, &sprint, today, request.slot)?;

        let (fields, suggested) = match request.fields {
            Some(fields) => (fields, None),
            None => {
                let parsed = classify_resilient(self.classifier, &request.raw_text, &card.title);
                (
                    SnapFields {
                        done: parsed.done,
                        to_do: parsed.to_do,
                        blockers: parsed.blockers,
                    },
                    Some(parsed.suggested_rag),
                )
            }
        };
        let final_rag = request.final_rag.or(suggested);

        let now = self.clock.now();
        let snap = Snap {
            snap_id: Uuid::new_v4().to_string(),
            card_id: card.card_id.clone(),
            author_id: request.author_id.clone(),
            raw_text: request.raw_text.clone(),
            done: fields.done,
            to_do: fields.to_do,
            blockers: fields.blockers,
            suggested_rag: suggested,
            final_rag,
            snap_date: today,
            slot: request.slot,
            is_locked: false,
            created_at: now,
            updated_at: now,
        };

        let stored = with_immediate_tx(self.conn, |conn| {
            db::snaps::insert(conn, &snap)?;

            if card.status == CardStatus::NotStarted
                && db::snaps::count_for_card(conn, &card.card_id)? == 1
            {
                db::cards::set_status(conn, &card.card_id, CardStatus::InProgress)?;
            }

            recompute_card_rag(conn, &card.card_id, today, self.tuning.stale_after_days)?;

            if let Some(explicit) = request.final_rag {
                if suggested != Some(explicit) {
                    self.record_override(conn, &card.card_id, today, explicit, &request.author_id)?;
                }
            }

            db::snaps::get(conn, &snap.snap_id)?.ok_or_else(|| {
                CoreError::internal(format!(
                    "snap {} missing immediately after insert",
                    snap.snap_id
                ))
            })
        })?;

        tracing::debug!(
            snap_id = %stored.snap_id,
            card_id = %card.card_id,
            "snap created"
        );
        Ok(stored)
    }

    /// Edit one of today's snaps.
    ///
    /// # Errors
    ///
    /// `SnapNotFound`; `NotAuthor` for a non-author without the elevated
    /// capability; `SnapNotToday`; `SnapLocked`/`DayLocked`; or a storage
    /// error.
    pub fn update_snap(&self, request: UpdateSnapRequest) -> CoreResult<Snap> {
        let mut snap = self.require_snap(&request.snap_id)?;
        let card = self.require_card_internal(&snap.card_id)?;
        self.guard_mutable(&snap, &card, &request.author_id, request.elevated)?;

        if let Some(raw_text) = request.raw_text {
            snap.raw_text = raw_text;
        }

        if request.regenerate {
            let parsed = classify_resilient(self.classifier, &snap.raw_text, &card.title);
            let kept_override = snap.final_rag.filter(|_| snap.is_overridden());
            snap.done = parsed.done;
            snap.to_do = parsed.to_do;
            snap.blockers = parsed.blockers;
            snap.suggested_rag = Some(parsed.suggested_rag);
            snap.final_rag = request
                .final_rag
                .or(kept_override)
                .or(snap.suggested_rag);
        } else {
            if let Some(fields) = request.fields {
                snap.done = fields.done;
                snap.to_do = fields.to_do;
                snap.blockers = fields.blockers;
            }
            if let Some(rag) = request.final_rag {
                snap.final_rag = Some(rag);
            }
        }
        snap.updated_at = self.clock.now();

        let today = self.clock.today();
        let stored = with_immediate_tx(self.conn, |conn| {
            db::snaps::update(conn, &snap)?;
            recompute_card_rag(conn, &card.card_id, today, self.tuning.stale_after_days)?;

            if let Some(explicit) = request.final_rag {
                if snap.suggested_rag != Some(explicit) {
                    self.record_override(conn, &card.card_id, today, explicit, &request.author_id)?;
                }
            }

            db::snaps::get(conn, &snap.snap_id)?.ok_or_else(|| {
                CoreError::internal(format!(
                    "snap {} missing immediately after update",
                    snap.snap_id
                ))
            })
        })?;

        Ok(stored)
    }

    /// Delete one of today's snaps and recompute the card's RAG.
    ///
    /// # Errors
    ///
    /// As [`StandupService::update_snap`].
    pub fn delete_snap(&self, snap_id: &str, author_id: &str, elevated: bool) -> CoreResult<()> {
        let snap = self.require_snap(snap_id)?;
        let card = self.require_card_internal(&snap.card_id)?;
        self.guard_mutable(&snap, &card, author_id, elevated)?;

        let today = self.clock.today();
        with_immediate_tx(self.conn, |conn| {
            db::snaps::delete(conn, snap_id)?;
            recompute_card_rag(conn, &card.card_id, today, self.tuning.stale_after_days)?;
            Ok(())
        })
    }

    /// Classify raw text without persisting anything.
    #[must_use]
    pub fn parse_preview(&self, raw_text: &str, card_title: &str) -> Classification {
        classify_resilient(self.classifier, raw_text, card_title)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// `SnapNotFound` or a storage error.
    pub fn snap(&self, snap_id: &str) -> CoreResult<Snap> {
        self.require_snap(snap_id)
    }

    /// All snaps for a card, newest first.
    ///
    /// # Errors
    ///
    /// `CardNotFound` or a storage error.
    pub fn snaps_for_card(&self, card_id: &str) -> CoreResult<Vec<Snap>> {
        self.require_card(card_id)?;
        Ok(db::snaps::for_card_newest_first(self.conn, card_id)?)
    }

    /// All snaps for a sprint on a date, with card context.
    ///
    /// # Errors
    ///
    /// `SprintNotFound` or a storage error.
    pub fn snaps_for_sprint_and_date(
        &self,
        sprint_id: &str,
        date: NaiveDate,
    ) -> CoreResult<Vec<SnapRow>> {
        if db::sprints::get(self.conn, sprint_id)?.is_none() {
            return Err(CoreError::not_found(
                ErrorCode::SprintNotFound,
                format!("sprint {sprint_id}"),
            ));
        }
        Ok(db::snaps::for_sprint_and_date(self.conn, sprint_id, date, None)?)
    }

    // -----------------------------------------------------------------------
    // Locks and summaries
    // -----------------------------------------------------------------------

    /// See [`freeze::lock_day`].
    ///
    /// # Errors
    ///
    /// As [`freeze::lock_day`].
    pub fn lock_day(
        &self,
        sprint_id: &str,
        date: NaiveDate,
        actor_id: &str,
    ) -> CoreResult<StandupLock> {
        freeze::lock_day(self.conn, self.clock, sprint_id, date, actor_id)
    }

    /// See [`freeze::lock_slot`].
    ///
    /// # Errors
    ///
    /// As [`freeze::lock_slot`].
    pub fn lock_slot(
        &self,
        sprint_id: &str,
        date: NaiveDate,
        slot: u32,
        actor_id: &str,
    ) -> CoreResult<StandupLock> {
        freeze::lock_slot(self.conn, self.clock, sprint_id, date, slot, actor_id)
    }

    /// See [`freeze::auto_lock_day`].
    ///
    /// # Errors
    ///
    /// Storage errors only; validation outcomes are silent no-ops.
    pub fn auto_lock_day(
        &self,
        sprint_id: &str,
        date: NaiveDate,
    ) -> CoreResult<Option<StandupLock>> {
        freeze::auto_lock_day(self.conn, self.clock, sprint_id, date)
    }

    /// See [`freeze::is_locked`].
    ///
    /// # Errors
    ///
    /// Returns a storage error when the query fails.
    pub fn is_locked(
        &self,
        sprint_id: &str,
        date: NaiveDate,
        slot: Option<u32>,
    ) -> CoreResult<bool> {
        freeze::is_locked(self.conn, sprint_id, date, slot)
    }

    /// See [`freeze::unlock`].
    ///
    /// # Errors
    ///
    /// As [`freeze::unlock`].
    pub fn unlock(
        &self,
        sprint_id: &str,
        date: NaiveDate,
        slot: Option<u32>,
        actor_id: &str,
    ) -> CoreResult<()> {
        freeze::unlock(self.conn, sprint_id, date, slot, actor_id)
    }

    /// See [`summary::generate_summary`].
    ///
    /// # Errors
    ///
    /// As [`summary::generate_summary`].
    pub fn generate_summary(&self, sprint_id: &str, date: NaiveDate) -> CoreResult<DailySummary> {
        summary::generate_summary(self.conn, self.clock, sprint_id, date)
    }

    /// See [`summary::fetch_summary`].
    ///
    /// # Errors
    ///
    /// As [`summary::fetch_summary`].
    pub fn fetch_summary(&self, sprint_id: &str, date: NaiveDate) -> CoreResult<DailySummary> {
        summary::fetch_summary(self.conn, sprint_id, date)
    }

    // -----------------------------------------------------------------------
    // Rollups and history
    // -----------------------------------------------------------------------

    /// Worst-case rollup for a sprint with per-assignee breakdown.
    ///
    /// # Errors
    ///
    /// `SprintNotFound` or a storage error.
    pub fn sprint_rollup(&self, sprint_id: &str) -> CoreResult<SprintRollup> {
        rollup::sprint_rollup(self.conn, sprint_id)
    }

    /// Worst-case rollup across a project's sprints.
    ///
    /// # Errors
    ///
    /// `ProjectNotFound` or a storage error.
    pub fn project_rollup(&self, project_id: &str) -> CoreResult<ProjectRollup> {
        rollup::project_rollup(self.conn, project_id)
    }

    /// RAG history for a card, most recent day first.
    ///
    /// # Errors
    ///
    /// `CardNotFound` or a storage error.
    pub fn rag_history(&self, card_id: &str) -> CoreResult<Vec<CardRagEntry>> {
        self.require_card(card_id)?;
        Ok(db::history::for_card(self.conn, card_id)?)
    }

    /// Append (upsert) a history row for a card at today's date.
    ///
    /// # Errors
    ///
    /// `CardNotFound` or a storage error.
    pub fn append_rag_history(
        &self,
        card_id: &str,
        rag: Rag,
        overridden: bool,
        actor_id: &str,
    ) -> CoreResult<CardRagEntry> {
        self.require_card(card_id)?;
        let entry = CardRagEntry {
            card_id: card_id.to_string(),
            rag_date: self.clock.today(),
            rag,
            overridden,
            overridden_by: overridden.then(|| actor_id.to_string()),
            recorded_at: self.clock.now(),
        };
        db::history::upsert(self.conn, &entry)?;
        Ok(entry)
    }

    /// System-suggested RAG for a card: the elaborate secondary
    /// computation, fed by the card's snap history and an optional
    /// candidate text (classified first, fallback included).
    ///
    /// # Errors
    ///
    /// `CardNotFound` or a storage error.
    pub fn suggest_card_rag(
        &self,
        card_id: &str,
        candidate_text: Option<&str>,
    ) -> CoreResult<Rag> {
        let card = self.require_card(card_id)?;
        let snaps = db::snaps::for_card_newest_first(self.conn, card_id)?;
        let today = self.clock.today();

        if let Some(text) = candidate_text {
            let parsed = classify_resilient(self.classifier, text, &card.title);
            let candidate = suggest::Candidate {
                done: &parsed.done,
                blockers: &parsed.blockers,
            };
            return Ok(suggest::system_suggested_rag(
                &card,
                &snaps,
                candidate,
                today,
                &self.tuning,
            ));
        }

        // No candidate text: treat today's latest snap (if any) as the
        // candidate and the rest as history.
        let (candidate_snap, prior) = match snaps.split_first() {
            Some((newest, rest)) if newest.snap_date == today => (Some(newest), rest),
            _ => (None, snaps.as_slice()),
        };
        let candidate = candidate_snap.map_or(suggest::Candidate::default(), |snap| {
            suggest::Candidate {
                done: &snap.done,
                blockers: &snap.blockers,
            }
        });
        Ok(suggest::system_suggested_rag(
            &card,
            prior,
            candidate,
            today,
            &self.tuning,
        ))
    }

    // -----------------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------------

    /// Preconditions for recording a snap, checked in order: positive
    /// estimate, active sprint, no lock for today, today inside the sprint
    /// window, slot within the sprint's configuration.
    fn guard_snappable(
        &self,
        card: &Card,
        sprint: &crate::model::Sprint,
        today: NaiveDate,
        slot: Option<u32>,
    ) -> CoreResult<()> {
        if card.estimated_hours <= 0.0 {
            return Err(CoreError::validation(
                ErrorCode::EffortRequired,
                format!("effort required: card {} has no estimate", card.card_id),
            ));
        }
        match sprint.status {
            SprintStatus::Active => {}
            SprintStatus::Closed => {
                return Err(CoreError::validation(
                    ErrorCode::SprintClosed,
                    format!("sprint {} is closed", sprint.sprint_id),
                ));
            }
            SprintStatus::Planned | SprintStatus::Completed => {
                return Err(CoreError::validation(
                    ErrorCode::SprintNotActive,
                    format!("sprint {} is not active", sprint.sprint_id),
                ));
            }
        }
        if freeze::is_locked(self.conn, &sprint.sprint_id, today, slot)? {
            return Err(CoreError::validation(
                ErrorCode::DayLocked,
                format!("standup for {today} is already locked"),
            ));
        }
        if !sprint.contains(today) {
            return Err(CoreError::validation(
                ErrorCode::DateOutsideSprint,
                format!(
                    "{today} is outside sprint window {}..{}",
                    sprint.start_date, sprint.end_date
                ),
            ));
        }
        if let Some(slot) = slot {
            if slot < 1 || slot > sprint.standups_per_day {
                return Err(CoreError::validation(
                    ErrorCode::SlotInvalid,
                    format!("slot {slot} outside 1..={}", sprint.standups_per_day),
                ));
            }
        }
        Ok(())
    }

    fn guard_mutable(
        &self,
        snap: &Snap,
        card: &Card,
        author_id: &str,
        elevated: bool,
    ) -> CoreResult<()> {
        if !elevated && snap.author_id != author_id {
            return Err(CoreError::forbidden(
                ErrorCode::NotAuthor,
                format!("snap {} belongs to {}", snap.snap_id, snap.author_id),
            ));
        }
        if snap.snap_date != self.clock.today() {
            return Err(CoreError::validation(
                ErrorCode::SnapNotToday,
                format!("snap {} is dated {}", snap.snap_id, snap.snap_date),
            ));
        }
        if snap.is_locked {
            return Err(CoreError::validation(
                ErrorCode::SnapLocked,
                format!("snap {} is locked", snap.snap_id),
            ));
        }
        if freeze::is_locked(self.conn, &card.sprint_id, snap.snap_date, snap.slot)? {
            return Err(CoreError::validation(
                ErrorCode::DayLocked,
                format!("standup for {} is locked", snap.snap_date),
            ));
        }
        Ok(())
    }

    fn record_override(
        &self,
        conn: &Connection,
        card_id: &str,
        date: NaiveDate,
        rag: Rag,
        actor_id: &str,
    ) -> CoreResult<()> {
        db::history::upsert(
            conn,
            &CardRagEntry {
                card_id: card_id.to_string(),
                rag_date: date,
                rag,
                overridden: true,
                overridden_by: Some(actor_id.to_string()),
                recorded_at: self.clock.now(),
            },
        )?;
        Ok(())
    }

    fn require_card(&self, card_id: &str) -> CoreResult<Card> {
        db::cards::get(self.conn, card_id)?.ok_or_else(|| {
            CoreError::not_found(ErrorCode::CardNotFound, format!("card {card_id}"))
        })
    }

    /// Card lookup where absence means our own data is inconsistent
    /// (a snap always references an existing card).
    fn require_card_internal(&self, card_id: &str) -> CoreResult<Card> {
        db::cards::get(self.conn, card_id)?.ok_or_else(|| {
            CoreError::internal(format!("card {card_id} missing for an existing snap"))
        })
    }

    fn require_sprint_of(&self, card: &Card) -> CoreResult<crate::model::Sprint> {
        db::sprints::get(self.conn, &card.sprint_id)?.ok_or_else(|| {
            CoreError::internal(format!(
                "sprint {} missing for card {}",
                card.sprint_id, card.card_id
            ))
        })
    }

    fn require_snap(&self, snap_id: &str) -> CoreResult<Snap> {
        db::snaps::get(self.conn, snap_id)?.ok_or_else(|| {
            CoreError::not_found(ErrorCode::SnapNotFound, format!("snap {snap_id}"))
        })
    }
}
