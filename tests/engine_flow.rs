use time::OffsetDateTime;
use uuid::Uuid;

use astba_backend::db::models::EnrollmentStatus;
use astba_backend::db::repositories::{EntityStore, MemoryStore};
use astba_backend::engine::{
    commit_attendance, evaluate, issue_certificate, load_attendance_snapshot, AttendanceMark,
    EngineError, FormationStatus, IssueOutcome, PairLocks,
};

struct Fixture {
    store: MemoryStore,
    training_id: Uuid,
    student_id: Uuid,
    // sessions[level][session] in (level_number, session_number) order
    sessions: Vec<Vec<Uuid>>,
}

/// Training with `levels` levels of `sessions_per_level` sessions each,
/// plus one enrolled student.
fn fixture(levels: i32, sessions_per_level: i32) -> Fixture {
    let store = MemoryStore::new();
    let training = store.add_training("Initiation");
    let student_id = Uuid::new_v4();
    store.add_enrollment(student_id, training.id);

    let mut sessions = Vec::new();
    for ln in 1..=levels {
        let level = store.add_level(training.id, ln, &format!("Niveau {}", ln));
        let mut level_sessions = Vec::new();
        for sn in 1..=sessions_per_level {
            let session = store.add_session(level.id, sn, &format!("Seance {}", sn));
            level_sessions.push(session.id);
        }
        sessions.push(level_sessions);
    }

    Fixture {
        store,
        training_id: training.id,
        student_id,
        sessions,
    }
}

fn present(student_id: Uuid, session_id: Uuid) -> AttendanceMark {
    AttendanceMark {
        student_id,
        session_id,
        present: true,
        note: None,
        comment: None,
    }
}

#[tokio::test]
async fn full_attendance_over_two_commits_completes_and_certifies() {
    let fx = fixture(2, 2);
    let locks = PairLocks::new();

    // First sheet: level 1 only.
    let marks: Vec<_> = fx.sessions[0]
        .iter()
        .map(|&s| present(fx.student_id, s))
        .collect();
    commit_attendance(&fx.store, &locks, &marks).await.unwrap();

    let enrollment = fx
        .store
        .enrollment(fx.student_id, fx.training_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.current_level, 2);
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    assert!(fx
        .store
        .certificate(fx.student_id, fx.training_id)
        .await
        .unwrap()
        .is_none());

    // Second sheet: level 2.
    let marks: Vec<_> = fx.sessions[1]
        .iter()
        .map(|&s| present(fx.student_id, s))
        .collect();
    let applied = commit_attendance(&fx.store, &locks, &marks).await.unwrap();
    assert_eq!(applied.len(), 2);

    let enrollment = fx
        .store
        .enrollment(fx.student_id, fx.training_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.current_level, 2);
    assert_eq!(enrollment.status, EnrollmentStatus::Completed);

    let certificate = fx
        .store
        .certificate(fx.student_id, fx.training_id)
        .await
        .unwrap()
        .expect("certificate must exist after completion");
    assert!(certificate.number.starts_with("ASTBA-"));

    // Re-submitting the same sheet must not mint a second certificate nor
    // change the existing number.
    commit_attendance(&fx.store, &locks, &marks).await.unwrap();
    let again = fx
        .store
        .certificate(fx.student_id, fx.training_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.id, certificate.id);
    assert_eq!(again.number, certificate.number);
}

#[tokio::test]
async fn partial_level_blocks_advancement() {
    let fx = fixture(3, 2);
    let locks = PairLocks::new();

    // Level 1 fully present, level 2 half marked.
    let mut marks: Vec<_> = fx.sessions[0]
        .iter()
        .map(|&s| present(fx.student_id, s))
        .collect();
    marks.push(present(fx.student_id, fx.sessions[1][0]));
    commit_attendance(&fx.store, &locks, &marks).await.unwrap();

    let enrollment = fx
        .store
        .enrollment(fx.student_id, fx.training_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.current_level, 2);
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
}

#[tokio::test]
async fn absence_keeps_the_stored_level_behind() {
    let fx = fixture(2, 2);
    let locks = PairLocks::new();

    let marks = vec![
        present(fx.student_id, fx.sessions[0][0]),
        AttendanceMark {
            student_id: fx.student_id,
            session_id: fx.sessions[0][1],
            present: false,
            note: Some(8.0),
            comment: Some("retard important".into()),
        },
    ];
    commit_attendance(&fx.store, &locks, &marks).await.unwrap();

    let enrollment = fx
        .store
        .enrollment(fx.student_id, fx.training_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.current_level, 1);
    assert_eq!(enrollment.status, EnrollmentStatus::Active);

    // The evaluator sees the level as failed but the training stays
    // in_progress while level 2 is unmarked.
    let snapshot = load_attendance_snapshot(&fx.store, fx.training_id, fx.student_id)
        .await
        .unwrap();
    let progress = evaluate(&snapshot);
    assert_eq!(progress.formation_status, FormationStatus::InProgress);
    assert_eq!(progress.absent_count, 1);
}

#[tokio::test]
async fn unknown_session_rejects_the_whole_batch_before_any_write() {
    let fx = fixture(1, 2);
    let locks = PairLocks::new();

    let marks = vec![
        present(fx.student_id, fx.sessions[0][0]),
        present(fx.student_id, Uuid::new_v4()),
    ];
    let err = commit_attendance(&fx.store, &locks, &marks)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownSession(_)));

    // Nothing was applied, not even the valid tuple.
    let records = fx
        .store
        .attendance_by_session(fx.sessions[0][0])
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn unenrolled_student_marks_still_apply() {
    let fx = fixture(1, 1);
    let locks = PairLocks::new();
    let stranger = Uuid::new_v4();

    let applied = commit_attendance(&fx.store, &locks, &[present(stranger, fx.sessions[0][0])])
        .await
        .unwrap();
    assert_eq!(applied.len(), 1);
    assert!(applied[0].present);
}

#[tokio::test]
async fn upsert_overwrites_the_existing_mark() {
    let fx = fixture(1, 1);
    let locks = PairLocks::new();
    let session_id = fx.sessions[0][0];

    commit_attendance(&fx.store, &locks, &[present(fx.student_id, session_id)])
        .await
        .unwrap();
    let correction = AttendanceMark {
        student_id: fx.student_id,
        session_id,
        present: false,
        note: None,
        comment: Some("marked by mistake".into()),
    };
    commit_attendance(&fx.store, &locks, &[correction])
        .await
        .unwrap();

    let records = fx.store.attendance_by_session(session_id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].present);
}

#[tokio::test]
async fn issuer_rejects_incomplete_training() {
    let fx = fixture(2, 2);

    commit_attendance(
        &fx.store,
        &PairLocks::new(),
        &[present(fx.student_id, fx.sessions[0][0])],
    )
    .await
    .unwrap();

    let snapshot = load_attendance_snapshot(&fx.store, fx.training_id, fx.student_id)
        .await
        .unwrap();
    let progress = evaluate(&snapshot);

    let err = issue_certificate(
        &fx.store,
        fx.student_id,
        fx.training_id,
        &progress,
        OffsetDateTime::now_utc(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::NotEligible { .. }));
    assert!(fx
        .store
        .certificate(fx.student_id, fx.training_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn issuer_is_idempotent_for_a_completed_pair() {
    let fx = fixture(1, 1);
    let locks = PairLocks::new();

    commit_attendance(&fx.store, &locks, &[present(fx.student_id, fx.sessions[0][0])])
        .await
        .unwrap();

    let snapshot = load_attendance_snapshot(&fx.store, fx.training_id, fx.student_id)
        .await
        .unwrap();
    let progress = evaluate(&snapshot);
    assert!(progress.eligible);

    // The commit already minted the certificate; a direct issuance request
    // must come back as AlreadyIssued with the same number.
    let outcome = issue_certificate(
        &fx.store,
        fx.student_id,
        fx.training_id,
        &progress,
        OffsetDateTime::now_utc(),
    )
    .await
    .unwrap();
    let existing = fx
        .store
        .certificate(fx.student_id, fx.training_id)
        .await
        .unwrap()
        .unwrap();
    match outcome {
        IssueOutcome::AlreadyIssued(c) => assert_eq!(c.number, existing.number),
        IssueOutcome::Issued(_) => panic!("expected AlreadyIssued"),
    }
}

#[tokio::test]
async fn heterogeneous_sheet_touches_every_pair() {
    // Two students on one sheet; each pair is recomputed independently.
    let fx = fixture(1, 1);
    let other_student = Uuid::new_v4();
    fx.store.add_enrollment(other_student, fx.training_id);
    let locks = PairLocks::new();

    let marks = vec![
        present(fx.student_id, fx.sessions[0][0]),
        AttendanceMark {
            student_id: other_student,
            session_id: fx.sessions[0][0],
            present: false,
            note: None,
            comment: None,
        },
    ];
    commit_attendance(&fx.store, &locks, &marks).await.unwrap();

    let first = fx
        .store
        .enrollment(fx.student_id, fx.training_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.status, EnrollmentStatus::Completed);
    assert!(fx
        .store
        .certificate(fx.student_id, fx.training_id)
        .await
        .unwrap()
        .is_some());

    let second = fx
        .store
        .enrollment(other_student, fx.training_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.status, EnrollmentStatus::Active);
    assert!(fx
        .store
        .certificate(other_student, fx.training_id)
        .await
        .unwrap()
        .is_none());
}
