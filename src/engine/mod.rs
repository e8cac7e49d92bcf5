//! Training progression and certification engine.
//!
//! The evaluator and the advancement calculator are pure functions over
//! attendance snapshots; the certificate issuer and the bulk commit
//! coordinator are the only parts that touch the store.

pub mod advancement;
pub mod certificate;
pub mod commit;
pub mod progress;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repositories::EntityStore;
use crate::db::DatabaseError;

pub use advancement::{advance, Advancement};
pub use certificate::{issue_certificate, IssueOutcome};
pub use commit::{commit_attendance, AttendanceMark, PairLocks};
pub use progress::{evaluate, FormationStatus, LevelProgress, LevelStatus, TrainingProgress};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown session {0}")]
    UnknownSession(Uuid),

    #[error("level {0} not found")]
    LevelNotFound(Uuid),

    #[error("no enrollment for student {student_id} in training {training_id}")]
    EnrollmentNotFound { student_id: Uuid, training_id: Uuid },

    #[error("student {student_id} is not eligible for a certificate in training {training_id}")]
    NotEligible { student_id: Uuid, training_id: Uuid },

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// One session's attendance state for one student. A missing attendance
/// record is `Pending`, never `Absent`; the distinction decides whether a
/// level can be judged at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMark {
    Present,
    Absent,
    Pending,
}

/// Attendance snapshot of one level for one student, sessions in
/// `session_number` order.
#[derive(Debug, Clone)]
pub struct LevelAttendance {
    pub level_number: i32,
    pub marks: Vec<SessionMark>,
}

/// Fetch the attendance snapshot for one (training, student) pair.
///
/// Levels come back in `level_number` order and sessions in
/// `session_number` order, so downstream evaluation is deterministic for a
/// given set of records.
pub async fn load_attendance_snapshot(
    store: &dyn EntityStore,
    training_id: Uuid,
    student_id: Uuid,
) -> Result<Vec<LevelAttendance>, EngineError> {
    let levels = store.levels_by_training(training_id).await?;
    let mut snapshot = Vec::with_capacity(levels.len());

    for level in levels {
        let sessions = store.sessions_by_level(level.id).await?;
        let mut marks = Vec::with_capacity(sessions.len());
        for session in sessions {
            let records = store.attendance_by_session(session.id).await?;
            let mark = records
                .iter()
                .find(|r| r.student_id == student_id)
                .map(|r| if r.present { SessionMark::Present } else { SessionMark::Absent })
                .unwrap_or(SessionMark::Pending);
            marks.push(mark);
        }
        snapshot.push(LevelAttendance {
            level_number: level.level_number,
            marks,
        });
    }

    Ok(snapshot)
}
