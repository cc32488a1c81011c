//! Exactly-once locking protocol: daily and slot variants, auto-lock
//! no-op semantics, immutability after lock, and the administrative
//! unlock escape hatch.

mod common;

use common::{date, seed_card, seed_sprint, service, standard_fixture, store};
use huddle_core::clock::FixedClock;
use huddle_core::db;
use huddle_core::model::{Rag, SnapFields, SprintStatus};
use huddle_core::{CoreError, CreateSnapRequest, ErrorCode, UpdateSnapRequest};

fn snap_request(card_id: &str, done: &str, blockers: &str, rag: Rag) -> CreateSnapRequest {
    CreateSnapRequest {
        card_id: card_id.to_string(),
        author_id: "avery".to_string(),
        raw_text: format!("{done} {blockers}"),
        fields: Some(SnapFields {
            done: done.to_string(),
            to_do: String::new(),
            blockers: blockers.to_string(),
        }),
        final_rag: Some(rag),
        slot: None,
    }
}

#[test]
fn lock_day_freezes_snaps_and_embeds_synthesis() {
    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    // Raw text through the fallback: suggestion and final agree, so the
    // lock-time history row is not an override.
    let snap = svc
        .create_snap(CreateSnapRequest {
            card_id: "c1".to_string(),
            author_id: "avery".to_string(),
            raw_text: "shipped the login form".to_string(),
            fields: None,
            final_rag: None,
            slot: None,
        })
        .expect("create snap");

    let lock = svc
        .lock_day("s1", date(2025, 1, 6), "scrum-master")
        .expect("lock day");

    assert!(lock.is_day_level());
    assert_eq!(lock.locked_by.as_deref(), Some("scrum-master"));
    assert!(!lock.auto_locked);
    assert_eq!(lock.done_summary, "- [Card c1] shipped the login form");
    assert_eq!(lock.todo_summary, "None");
    assert_eq!(lock.blockers_summary, "None");

    let frozen = svc.snap(&snap.snap_id).expect("fetch snap");
    assert!(frozen.is_locked);

    // Lock time wrote one history row for the card.
    let history = svc.rag_history("c1").expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].rag_date, date(2025, 1, 6));
    assert_eq!(history[0].rag, Rag::Green);
    assert!(!history[0].overridden);
}

#[test]
fn second_lock_attempt_fails_with_validation() {
    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    svc.lock_day("s1", date(2025, 1, 6), "scrum-master")
        .expect("first lock succeeds");

    let err = svc
        .lock_day("s1", date(2025, 1, 6), "scrum-master")
        .expect_err("second lock must fail");
    assert_eq!(err.code(), ErrorCode::AlreadyLocked);
    assert!(matches!(err, CoreError::Validation { .. }));

    // The failure left no partial state: still exactly one lock row.
    let locks = db::locks::for_sprint(&conn, "s1").expect("locks");
    assert_eq!(locks.len(), 1);
}

#[test]
fn lock_rejects_dates_outside_the_sprint_window() {
    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let err = svc
        .lock_day("s1", date(2025, 2, 1), "scrum-master")
        .expect_err("must reject");
    assert_eq!(err.code(), ErrorCode::DateOutsideSprint);

    let err = svc
        .lock_day("missing", date(2025, 1, 6), "scrum-master")
        .expect_err("must reject");
    assert_eq!(err.code(), ErrorCode::SprintNotFound);
}

#[test]
fn no_mutation_after_lock_for_any_caller() {
    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let snap = svc
        .create_snap(snap_request("c1", "progress", "", Rag::Green))
        .expect("create snap");
    svc.lock_day("s1", date(2025, 1, 6), "scrum-master")
        .expect("lock");

    // Author, elevated, anyone: all rejected once the day is locked.
    for elevated in [false, true] {
        let err = svc
            .update_snap(UpdateSnapRequest {
                snap_id: snap.snap_id.clone(),
                author_id: "avery".to_string(),
                raw_text: Some("revision".to_string()),
                fields: None,
                final_rag: None,
                regenerate: false,
                elevated,
            })
            .expect_err("update after lock must fail");
        assert!(matches!(err, CoreError::Validation { .. }));

        let err = svc
            .delete_snap(&snap.snap_id, "avery", elevated)
            .expect_err("delete after lock must fail");
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    // New snaps for the locked day are rejected too.
    let err = svc
        .create_snap(snap_request("c1", "late", "", Rag::Green))
        .expect_err("create after lock must fail");
    assert_eq!(err.code(), ErrorCode::DayLocked);
}

#[test]
fn slot_locks_are_scoped_and_day_lock_dominates() {
    let conn = store();
    common::seed_project(&conn, "p1");
    seed_sprint(
        &conn,
        "s1",
        "p1",
        SprintStatus::Active,
        date(2025, 1, 6),
        date(2025, 1, 17),
        2,
    );
    seed_card(&conn, "c1", "s1", "p1", Some("Avery"), 16.0);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let morning = svc
        .create_snap(CreateSnapRequest {
            slot: Some(1),
            ..snap_request("c1", "morning progress", "", Rag::Green)
        })
        .expect("morning snap");
    let afternoon = svc
        .create_snap(CreateSnapRequest {
            slot: Some(2),
            ..snap_request("c1", "afternoon progress", "", Rag::Green)
        })
        .expect("afternoon snap");

    let lock = svc
        .lock_slot("s1", date(2025, 1, 6), 1, "scrum-master")
        .expect("lock slot 1");
    assert_eq!(lock.slot, Some(1));
    assert_eq!(lock.done_summary, "- [Card c1] morning progress");

    // Slot 1 frozen, slot 2 untouched.
    assert!(svc.snap(&morning.snap_id).expect("fetch").is_locked);
    assert!(!svc.snap(&afternoon.snap_id).expect("fetch").is_locked);
    assert!(svc.is_locked("s1", date(2025, 1, 6), Some(1)).expect("query"));
    assert!(!svc.is_locked("s1", date(2025, 1, 6), Some(2)).expect("query"));
    assert!(!svc.is_locked("s1", date(2025, 1, 6), None).expect("query"));

    // Same slot twice: exactly-once.
    let err = svc
        .lock_slot("s1", date(2025, 1, 6), 1, "scrum-master")
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::AlreadyLocked);

    // Out-of-range slot is rejected.
    let err = svc
        .lock_slot("s1", date(2025, 1, 6), 3, "scrum-master")
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::SlotInvalid);

    // Day lock still possible, and afterwards every slot reads locked.
    svc.lock_day("s1", date(2025, 1, 6), "scrum-master")
        .expect("day lock");
    assert!(svc.is_locked("s1", date(2025, 1, 6), Some(2)).expect("query"));
    assert!(svc.snap(&afternoon.snap_id).expect("fetch").is_locked);

    // With the day frozen, further slot locks report the day-level lock.
    let err = svc
        .lock_slot("s1", date(2025, 1, 6), 2, "scrum-master")
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::DayLocked);
}

#[test]
fn auto_lock_is_a_silent_no_op_on_every_validation_failure() {
    let conn = store();
    common::seed_project(&conn, "p1");
    seed_sprint(
        &conn,
        "s-closed",
        "p1",
        SprintStatus::Closed,
        date(2025, 1, 6),
        date(2025, 1, 17),
        1,
    );
    let (sprint, _) = {
        let sprint = seed_sprint(
            &conn,
            "s1",
            "p1",
            SprintStatus::Active,
            date(2025, 1, 6),
            date(2025, 1, 17),
            1,
        );
        let card = seed_card(&conn, "c1", "s1", "p1", None, 16.0);
        (sprint, card)
    };
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    // Missing sprint: swallowed.
    assert!(svc
        .auto_lock_day("missing", date(2025, 1, 6))
        .expect("no-op")
        .is_none());

    // Closed sprint: swallowed.
    assert!(svc
        .auto_lock_day("s-closed", date(2025, 1, 6))
        .expect("no-op")
        .is_none());

    // Healthy sprint: locks with the auto flag and no actor.
    let lock = svc
        .auto_lock_day(&sprint.sprint_id, date(2025, 1, 6))
        .expect("auto-lock")
        .expect("lock created");
    assert!(lock.auto_locked);
    assert_eq!(lock.locked_by, None);

    // Already locked: swallowed, still exactly one lock row.
    assert!(svc
        .auto_lock_day(&sprint.sprint_id, date(2025, 1, 6))
        .expect("no-op")
        .is_none());
    assert_eq!(db::locks::for_sprint(&conn, "s1").expect("locks").len(), 1);
}

#[test]
fn administrative_unlock_thaws_snaps_and_allows_relock() {
    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let snap = svc
        .create_snap(snap_request("c1", "progress", "", Rag::Green))
        .expect("create");
    svc.lock_day("s1", date(2025, 1, 6), "scrum-master")
        .expect("lock");
    assert!(svc.snap(&snap.snap_id).expect("fetch").is_locked);

    svc.unlock("s1", date(2025, 1, 6), None, "admin")
        .expect("unlock");
    assert!(!svc.snap(&snap.snap_id).expect("fetch").is_locked);
    assert!(!svc.is_locked("s1", date(2025, 1, 6), None).expect("query"));

    // Unlocking again has nothing to delete.
    let err = svc
        .unlock("s1", date(2025, 1, 6), None, "admin")
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::LockNotFound);

    // The exactly-once guard applies to the new epoch as well.
    svc.lock_day("s1", date(2025, 1, 6), "scrum-master")
        .expect("relock");
    let err = svc
        .lock_day("s1", date(2025, 1, 6), "scrum-master")
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::AlreadyLocked);
}

#[test]
fn empty_day_lock_uses_sentinel_text() {
    let conn = store();
    standard_fixture(&conn);
    let clock = FixedClock(date(2025, 1, 6));
    let svc = service(&conn, &clock);

    let lock = svc
        .lock_day("s1", date(2025, 1, 7), "scrum-master")
        .expect("lock an empty day");
    assert_eq!(lock.done_summary, "No updates recorded");
    assert_eq!(lock.todo_summary, "None");
    assert_eq!(lock.blockers_summary, "None");
}
