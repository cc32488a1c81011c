//! Snap creation/edit/delete validation rules and the primary RAG path.

mod common;

use common::{date, seed_card, seed_sprint, service, standard_fixture, store};
use huddle_core::classify::{ClassifyError, Classification, TextClassifier};
use huddle_core::clock::{FixedClock, TickingClock};
use huddle_core::config::RagTuning;
use huddle_core::db;
use huddle_core::model::{CardStatus, Rag, SnapFields, SprintStatus};
use huddle_core::rag::recompute_card_rag;
use huddle_core::{CoreError, CreateSnapRequest, ErrorCode, StandupService, UpdateSnapRequest};

fn create_request(card_id: &str, author: &str, text: &str) -> CreateSnapRequest {
    CreateSnapRequest {
        card_id: card_id.to_string(),
        author_id: author.to_string(),
        raw_text: text.to_string(),
        fields: None,
        final_rag: None,
        slot: None,
    }
}

/// Scripted classifier standing in for the external capability.
struct ScriptedClassifier(Classification);

impl TextClassifier for ScriptedClassifier {
    fn classify(&self, _: &str, _: &str) -> Result<Classification, ClassifyError> {
        Ok(self.0.clone())
    }
}

#[test]
fn first_snap_advances_card_and_sets_green_rag() {
    let conn = store();
    let (_, card) = standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let classifier = ScriptedClassifier(Classification {
        done: "Completed login page".to_string(),
        to_do: "Start API tomorrow".to_string(),
        blockers: String::new(),
        suggested_rag: Rag::Green,
    });
    let svc = StandupService::new(&conn, Some(&classifier), &clock, RagTuning::default());

    let snap = svc
        .create_snap(create_request(
            &card.card_id,
            "avery",
            "Completed login page, starting API tomorrow",
        ))
        .expect("create snap");

    assert_eq!(snap.done, "Completed login page");
    assert_eq!(snap.to_do, "Start API tomorrow");
    assert_eq!(snap.suggested_rag, Some(Rag::Green));
    assert_eq!(snap.final_rag, Some(Rag::Green));
    assert_eq!(snap.snap_date, date(2025, 1, 6));
    assert!(!snap.is_locked);

    let card = db::cards::get(&conn, &card.card_id)
        .expect("query")
        .expect("card");
    assert_eq!(card.status, CardStatus::InProgress);
    assert_eq!(card.rag, Some(Rag::Green));
}

#[test]
fn zero_effort_card_rejects_snaps() {
    let conn = store();
    common::seed_project(&conn, "p1");
    seed_sprint(
        &conn,
        "s1",
        "p1",
        SprintStatus::Active,
        date(2025, 1, 6),
        date(2025, 1, 17),
        1,
    );
    seed_card(&conn, "c1", "s1", "p1", None, 0.0);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let err = svc
        .create_snap(create_request("c1", "avery", "did things"))
        .expect_err("must reject");
    assert_eq!(err.code(), ErrorCode::EffortRequired);
}

#[test]
fn inactive_and_closed_sprints_reject_snaps() {
    let conn = store();
    common::seed_project(&conn, "p1");
    seed_sprint(
        &conn,
        "s-planned",
        "p1",
        SprintStatus::Planned,
        date(2025, 1, 6),
        date(2025, 1, 17),
        1,
    );
    seed_sprint(
        &conn,
        "s-closed",
        "p1",
        SprintStatus::Closed,
        date(2025, 1, 6),
        date(2025, 1, 17),
        1,
    );
    seed_card(&conn, "c-planned", "s-planned", "p1", None, 8.0);
    seed_card(&conn, "c-closed", "s-closed", "p1", None, 8.0);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let err = svc
        .create_snap(create_request("c-planned", "avery", "progress"))
        .expect_err("planned sprint must reject");
    assert_eq!(err.code(), ErrorCode::SprintNotActive);

    let err = svc
        .create_snap(create_request("c-closed", "avery", "progress"))
        .expect_err("closed sprint must reject");
    assert_eq!(err.code(), ErrorCode::SprintClosed);
}

#[test]
fn snap_date_outside_sprint_window_is_rejected() {
    let conn = store();
    standard_fixture(&conn);
    // The sprint ended on the 17th.
    let clock = FixedClock(date(2025, 1, 20));
    let svc = service(&conn, &clock);

    let err = svc
        .create_snap(create_request("c1", "avery", "late update"))
        .expect_err("must reject");
    assert_eq!(err.code(), ErrorCode::DateOutsideSprint);
}

#[test]
fn unknown_card_is_not_found() {
    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let err = svc
        .create_snap(create_request("nope", "avery", "progress"))
        .expect_err("must reject");
    assert_eq!(err.code(), ErrorCode::CardNotFound);
    assert!(matches!(err, CoreError::NotFound { .. }));
}

#[test]
fn manual_fields_bypass_the_classifier() {
    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let snap = svc
        .create_snap(CreateSnapRequest {
            card_id: "c1".to_string(),
            author_id: "avery".to_string(),
            raw_text: "raw".to_string(),
            fields: Some(SnapFields {
                done: "wrote migrations".to_string(),
                to_do: "wire the service".to_string(),
                blockers: String::new(),
            }),
            final_rag: Some(Rag::Amber),
            slot: None,
        })
        .expect("create snap");

    assert_eq!(snap.done, "wrote migrations");
    assert_eq!(snap.suggested_rag, None);
    assert_eq!(snap.final_rag, Some(Rag::Amber));

    let card = db::cards::get(&conn, "c1").expect("query").expect("card");
    assert_eq!(card.rag, Some(Rag::Amber));
}

#[test]
fn classifier_failure_falls_back_and_never_blocks_creation() {
    struct BrokenClassifier;
    impl TextClassifier for BrokenClassifier {
        fn classify(&self, _: &str, _: &str) -> Result<Classification, ClassifyError> {
            Err(ClassifyError::Timeout)
        }
    }

    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = StandupService::new(&conn, Some(&BrokenClassifier), &clock, RagTuning::default());

    let snap = svc
        .create_snap(create_request(
            "c1",
            "avery",
            "Finished ingest. Blocked on credentials",
        ))
        .expect("fallback must keep creation alive");

    assert!(snap.done.contains("Finished ingest"));
    assert!(snap.blockers.contains("Blocked on credentials"));
    assert_eq!(snap.suggested_rag, Some(Rag::Red));
}

#[test]
fn explicit_final_rag_overrides_suggestion_and_records_history() {
    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let snap = svc
        .create_snap(CreateSnapRequest {
            final_rag: Some(Rag::Red),
            ..create_request("c1", "avery", "finished the import pipeline")
        })
        .expect("create snap");

    // Fallback suggests green for that text; the author said red.
    assert_eq!(snap.suggested_rag, Some(Rag::Green));
    assert_eq!(snap.final_rag, Some(Rag::Red));

    let history = svc.rag_history("c1").expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].rag, Rag::Red);
    assert!(history[0].overridden);
    assert_eq!(history[0].overridden_by.as_deref(), Some("avery"));
}

#[test]
fn only_the_author_may_edit_unless_elevated() {
    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let snap = svc
        .create_snap(create_request("c1", "avery", "progress on login"))
        .expect("create");

    let err = svc
        .update_snap(UpdateSnapRequest {
            snap_id: snap.snap_id.clone(),
            author_id: "mallory".to_string(),
            raw_text: Some("hijacked".to_string()),
            fields: None,
            final_rag: None,
            regenerate: false,
            elevated: false,
        })
        .expect_err("non-author must be rejected");
    assert_eq!(err.code(), ErrorCode::NotAuthor);
    assert!(matches!(err, CoreError::Forbidden { .. }));

    // The "edit any" capability is granted upstream; the service trusts it.
    svc.update_snap(UpdateSnapRequest {
        snap_id: snap.snap_id,
        author_id: "scrum-master".to_string(),
        raw_text: None,
        fields: None,
        final_rag: Some(Rag::Amber),
        regenerate: false,
        elevated: true,
    })
    .expect("elevated edit succeeds");
}

#[test]
fn yesterdays_snap_is_immutable() {
    let conn = store();
    standard_fixture(&conn);
    let monday = FixedClock(date(2025, 1, 6));
    let snap = service(&conn, &monday)
        .create_snap(create_request("c1", "avery", "progress"))
        .expect("create");

    let tuesday = FixedClock(date(2025, 1, 7));
    let svc = service(&conn, &tuesday);

    let err = svc
        .update_snap(UpdateSnapRequest {
            snap_id: snap.snap_id.clone(),
            author_id: "avery".to_string(),
            raw_text: Some("rewriting history".to_string()),
            fields: None,
            final_rag: None,
            regenerate: false,
            elevated: false,
        })
        .expect_err("must reject");
    assert_eq!(err.code(), ErrorCode::SnapNotToday);

    let err = svc
        .delete_snap(&snap.snap_id, "avery", false)
        .expect_err("must reject");
    assert_eq!(err.code(), ErrorCode::SnapNotToday);
}

#[test]
fn regenerate_reparses_text_but_keeps_explicit_override() {
    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let snap = svc
        .create_snap(CreateSnapRequest {
            final_rag: Some(Rag::Red),
            ..create_request("c1", "avery", "finished the exporter")
        })
        .expect("create");
    assert_eq!(snap.final_rag, Some(Rag::Red));

    let updated = svc
        .update_snap(UpdateSnapRequest {
            snap_id: snap.snap_id,
            author_id: "avery".to_string(),
            raw_text: Some("completed exporter and importer".to_string()),
            fields: None,
            final_rag: None,
            regenerate: true,
            elevated: false,
        })
        .expect("regenerate");

    assert!(updated.done.contains("completed exporter and importer"));
    assert_eq!(updated.suggested_rag, Some(Rag::Green));
    // The red override from creation survives regeneration.
    assert_eq!(updated.final_rag, Some(Rag::Red));
}

#[test]
fn delete_recomputes_card_rag_from_remaining_snaps() {
    let conn = store();
    standard_fixture(&conn);
    let clock = TickingClock::new(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let first = svc
        .create_snap(CreateSnapRequest {
            final_rag: Some(Rag::Green),
            fields: Some(SnapFields {
                done: "part one".to_string(),
                to_do: String::new(),
                blockers: String::new(),
            }),
            ..create_request("c1", "avery", "part one")
        })
        .expect("first snap");
    let second = svc
        .create_snap(CreateSnapRequest {
            final_rag: Some(Rag::Red),
            fields: Some(SnapFields {
                done: String::new(),
                to_do: String::new(),
                blockers: "stuck".to_string(),
            }),
            ..create_request("c1", "avery", "stuck")
        })
        .expect("second snap");

    let card = db::cards::get(&conn, "c1").expect("query").expect("card");
    assert_eq!(card.rag, Some(Rag::Red));

    svc.delete_snap(&second.snap_id, "avery", false)
        .expect("delete");

    let card = db::cards::get(&conn, "c1").expect("query").expect("card");
    assert_eq!(card.rag, Some(Rag::Green));
    assert_eq!(
        svc.snaps_for_card("c1").expect("snaps").len(),
        1,
        "only the first snap remains"
    );
    assert_eq!(svc.snap(&first.snap_id).expect("fetch").snap_id, first.snap_id);
}

#[test]
fn stale_card_forces_red_regardless_of_last_final_rag() {
    let conn = store();
    standard_fixture(&conn);
    let monday = FixedClock(date(2025, 1, 6));
    service(&conn, &monday)
        .create_snap(CreateSnapRequest {
            final_rag: Some(Rag::Green),
            ..create_request("c1", "avery", "finished everything")
        })
        .expect("create");

    // Eight days later, nothing new: the green snap no longer counts.
    let rag = recompute_card_rag(&conn, "c1", date(2025, 1, 14), 7).expect("recompute");
    assert_eq!(rag, Some(Rag::Red));

    let card = db::cards::get(&conn, "c1").expect("query").expect("card");
    assert_eq!(card.rag, Some(Rag::Red));
}

#[test]
fn recompute_boundary_day_counts_as_stale() {
    let conn = store();
    standard_fixture(&conn);
    let monday = FixedClock(date(2025, 1, 6));
    service(&conn, &monday)
        .create_snap(CreateSnapRequest {
            final_rag: Some(Rag::Green),
            ..create_request("c1", "avery", "finished everything")
        })
        .expect("create");

    // Exactly seven days old: outside the trailing window.
    assert_eq!(
        recompute_card_rag(&conn, "c1", date(2025, 1, 13), 7).expect("recompute"),
        Some(Rag::Red)
    );
    // Six days old: still fresh, latest final wins.
    assert_eq!(
        recompute_card_rag(&conn, "c1", date(2025, 1, 12), 7).expect("recompute"),
        Some(Rag::Green)
    );
}

#[test]
fn recompute_with_no_snaps_is_a_no_op() {
    let conn = store();
    standard_fixture(&conn);
    assert_eq!(
        recompute_card_rag(&conn, "c1", date(2025, 1, 6), 7).expect("recompute"),
        None
    );
    let card = db::cards::get(&conn, "c1").expect("query").expect("card");
    assert_eq!(card.rag, None);
}

#[test]
fn missing_final_rag_defaults_to_amber() {
    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    svc.create_snap(CreateSnapRequest {
        fields: Some(SnapFields {
            done: "progress".to_string(),
            to_do: String::new(),
            blockers: String::new(),
        }),
        ..create_request("c1", "avery", "progress")
    })
    .expect("create");

    // Manual fields, no suggestion, no override: final_rag is null and the
    // primary path maps that to amber.
    let card = db::cards::get(&conn, "c1").expect("query").expect("card");
    assert_eq!(card.rag, Some(Rag::Amber));
}
