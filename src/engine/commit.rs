//! Bulk Attendance Commit Coordinator: the one write path for attendance.
//!
//! Upserts a sheet of marks, then re-runs evaluation, certificate issuance
//! and level advancement for every (student, training) pair the sheet
//! touched.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::models::{AttendanceRecord, AttendanceUpsert, EnrollmentPatch, EnrollmentStatus};
use crate::db::repositories::EntityStore;
use crate::db::DatabaseError;

use super::{
    advancement, certificate, load_attendance_snapshot, progress, EngineError, FormationStatus,
};

/// One tuple of a marking pass, typically one row of a session sheet.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AttendanceMark {
    pub student_id: Uuid,
    pub session_id: Uuid,
    pub present: bool,
    #[validate(range(min = 0.0, max = 20.0))]
    pub note: Option<f64>,
    pub comment: Option<String>,
}

/// Per-(student, training) mutexes serializing the recomputation stage, so
/// two concurrent submissions touching the same pair cannot both pass the
/// issuer's existence check.
#[derive(Default)]
pub struct PairLocks {
    inner: Mutex<HashMap<(Uuid, Uuid), Arc<Mutex<()>>>>,
}

impl PairLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn acquire(&self, student_id: Uuid, training_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry((student_id, training_id))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Commit one marking pass.
///
/// Every `session_id` is resolved to its training before anything is
/// written; an unknown session fails the whole batch up front, so a bad
/// submission never applies partially. Upserts are idempotent, which makes
/// retrying a failed batch safe.
pub async fn commit_attendance(
    store: &dyn EntityStore,
    locks: &PairLocks,
    marks: &[AttendanceMark],
) -> Result<Vec<AttendanceRecord>, EngineError> {
    let session_training = resolve_sessions(store, marks).await?;

    let mut applied = Vec::with_capacity(marks.len());
    for mark in marks {
        let record = store
            .upsert_attendance(&AttendanceUpsert {
                student_id: mark.student_id,
                session_id: mark.session_id,
                present: mark.present,
                note: mark.note,
                comment: mark.comment.clone(),
            })
            .await?;
        applied.push(record);
    }

    let mut pairs: Vec<(Uuid, Uuid)> = marks
        .iter()
        .map(|m| (m.student_id, session_training[&m.session_id]))
        .collect();
    pairs.sort();
    pairs.dedup();

    for (student_id, training_id) in pairs {
        let _guard = locks.acquire(student_id, training_id).await;
        match recompute_pair(store, student_id, training_id).await {
            Ok(()) => {}
            // A pair whose backing entities vanished is skipped; the rest
            // of the batch still lands.
            Err(EngineError::EnrollmentNotFound { .. }) | Err(EngineError::Store(DatabaseError::NotFound)) => {
                warn!(%student_id, %training_id, "skipping pair without enrollment");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(applied)
}

async fn resolve_sessions(
    store: &dyn EntityStore,
    marks: &[AttendanceMark],
) -> Result<HashMap<Uuid, Uuid>, EngineError> {
    let mut session_training = HashMap::new();
    for mark in marks {
        if session_training.contains_key(&mark.session_id) {
            continue;
        }
        let session = store
            .session(mark.session_id)
            .await?
            .ok_or(EngineError::UnknownSession(mark.session_id))?;
        let level = store
            .level(session.level_id)
            .await?
            .ok_or(EngineError::LevelNotFound(session.level_id))?;
        session_training.insert(mark.session_id, level.training_id);
    }
    Ok(session_training)
}

/// Evaluator → issuer → advancement for one pair, in that order.
async fn recompute_pair(
    store: &dyn EntityStore,
    student_id: Uuid,
    training_id: Uuid,
) -> Result<(), EngineError> {
    store
        .enrollment(student_id, training_id)
        .await?
        .ok_or(EngineError::EnrollmentNotFound { student_id, training_id })?;

    let snapshot = load_attendance_snapshot(store, training_id, student_id).await?;
    let progress = progress::evaluate(&snapshot);

    if progress.formation_status == FormationStatus::Completed {
        certificate::issue_certificate(
            store,
            student_id,
            training_id,
            &progress,
            OffsetDateTime::now_utc(),
        )
        .await?;
    }

    let advancement = advancement::advance(&snapshot);
    let status = if advancement.completed {
        EnrollmentStatus::Completed
    } else {
        EnrollmentStatus::Active
    };
    store
        .update_enrollment(
            student_id,
            training_id,
            &EnrollmentPatch {
                current_level: Some(advancement.next_level),
                status: Some(status),
            },
        )
        .await?;

    info!(
        %student_id,
        %training_id,
        next_level = advancement.next_level,
        completed = advancement.completed,
        "enrollment recomputed"
    );

    Ok(())
}
