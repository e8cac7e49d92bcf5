use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{
    AttendanceRecord, AttendanceUpsert, Certificate, Enrollment, EnrollmentPatch,
    EnrollmentStatus, Level, NewCertificate, Session, SessionStatus, Training, TrainingStatus,
};
use crate::db::DatabaseError;

use super::EntityStore;

/// In-memory entity store. Backs the engine's unit and integration tests
/// and local demos; semantics match `PgStore`, including the uniqueness of
/// (student, session) attendance and (student, training) certificates.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    trainings: HashMap<Uuid, Training>,
    levels: HashMap<Uuid, Level>,
    sessions: HashMap<Uuid, Session>,
    enrollments: HashMap<Uuid, Enrollment>,
    attendance: HashMap<(Uuid, Uuid), AttendanceRecord>,
    certificates: HashMap<(Uuid, Uuid), Certificate>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_training(&self, name: &str) -> Training {
        let now = OffsetDateTime::now_utc();
        let training = Training {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: TrainingStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let mut inner = self.inner.write().unwrap();
        inner.trainings.insert(training.id, training.clone());
        training
    }

    pub fn add_level(&self, training_id: Uuid, level_number: i32, name: &str) -> Level {
        let level = Level {
            id: Uuid::new_v4(),
            training_id,
            level_number,
            name: name.to_string(),
        };
        let mut inner = self.inner.write().unwrap();
        inner.levels.insert(level.id, level.clone());
        level
    }

    pub fn add_session(&self, level_id: Uuid, session_number: i32, title: &str) -> Session {
        let session = Session {
            id: Uuid::new_v4(),
            level_id,
            session_number,
            title: title.to_string(),
            scheduled_on: None,
            status: SessionStatus::Pending,
        };
        let mut inner = self.inner.write().unwrap();
        inner.sessions.insert(session.id, session.clone());
        session
    }

    pub fn add_enrollment(&self, student_id: Uuid, training_id: Uuid) -> Enrollment {
        let now = OffsetDateTime::now_utc();
        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            student_id,
            training_id,
            current_level: 1,
            status: EnrollmentStatus::Active,
            enrolled_at: now,
            updated_at: now,
        };
        let mut inner = self.inner.write().unwrap();
        inner.enrollments.insert(enrollment.id, enrollment.clone());
        enrollment
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn training(&self, training_id: Uuid) -> Result<Option<Training>, DatabaseError> {
        Ok(self.inner.read().unwrap().trainings.get(&training_id).cloned())
    }

    async fn levels_by_training(&self, training_id: Uuid) -> Result<Vec<Level>, DatabaseError> {
        let inner = self.inner.read().unwrap();
        let mut levels: Vec<Level> = inner
            .levels
            .values()
            .filter(|l| l.training_id == training_id)
            .cloned()
            .collect();
        levels.sort_by_key(|l| l.level_number);
        Ok(levels)
    }

    async fn level(&self, level_id: Uuid) -> Result<Option<Level>, DatabaseError> {
        Ok(self.inner.read().unwrap().levels.get(&level_id).cloned())
    }

    async fn session(&self, session_id: Uuid) -> Result<Option<Session>, DatabaseError> {
        Ok(self.inner.read().unwrap().sessions.get(&session_id).cloned())
    }

    async fn sessions_by_level(&self, level_id: Uuid) -> Result<Vec<Session>, DatabaseError> {
        let inner = self.inner.read().unwrap();
        let mut sessions: Vec<Session> = inner
            .sessions
            .values()
            .filter(|s| s.level_id == level_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.session_number);
        Ok(sessions)
    }

    async fn attendance_by_session(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<AttendanceRecord>, DatabaseError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .attendance
            .values()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn upsert_attendance(
        &self,
        data: &AttendanceUpsert,
    ) -> Result<AttendanceRecord, DatabaseError> {
        let mut inner = self.inner.write().unwrap();
        if !inner.sessions.contains_key(&data.session_id) {
            return Err(DatabaseError::NotFound);
        }
        let key = (data.student_id, data.session_id);
        let id = inner.attendance.get(&key).map(|r| r.id).unwrap_or_else(Uuid::new_v4);
        let record = AttendanceRecord {
            id,
            student_id: data.student_id,
            session_id: data.session_id,
            present: data.present,
            note: data.note,
            comment: data.comment.clone(),
            marked_at: OffsetDateTime::now_utc(),
        };
        inner.attendance.insert(key, record.clone());
        Ok(record)
    }

    async fn enrollment(
        &self,
        student_id: Uuid,
        training_id: Uuid,
    ) -> Result<Option<Enrollment>, DatabaseError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .enrollments
            .values()
            .find(|e| e.student_id == student_id && e.training_id == training_id)
            .cloned())
    }

    async fn update_enrollment(
        &self,
        student_id: Uuid,
        training_id: Uuid,
        patch: &EnrollmentPatch,
    ) -> Result<Option<Enrollment>, DatabaseError> {
        let mut inner = self.inner.write().unwrap();
        let enrollment = inner
            .enrollments
            .values_mut()
            .find(|e| e.student_id == student_id && e.training_id == training_id);
        let Some(enrollment) = enrollment else {
            return Ok(None);
        };
        if let Some(level) = patch.current_level {
            enrollment.current_level = level;
        }
        if let Some(status) = &patch.status {
            enrollment.status = status.clone();
        }
        enrollment.updated_at = OffsetDateTime::now_utc();
        Ok(Some(enrollment.clone()))
    }

    async fn certificate(
        &self,
        student_id: Uuid,
        training_id: Uuid,
    ) -> Result<Option<Certificate>, DatabaseError> {
        let inner = self.inner.read().unwrap();
        Ok(inner.certificates.get(&(student_id, training_id)).cloned())
    }

    async fn create_certificate(
        &self,
        data: &NewCertificate,
    ) -> Result<Certificate, DatabaseError> {
        let mut inner = self.inner.write().unwrap();
        let key = (data.student_id, data.training_id);
        if inner.certificates.contains_key(&key) {
            return Err(DatabaseError::Duplicate);
        }
        let certificate = Certificate {
            id: Uuid::new_v4(),
            student_id: data.student_id,
            training_id: data.training_id,
            number: data.number.clone(),
            issued_at: data.issued_at,
        };
        inner.certificates.insert(key, certificate.clone());
        Ok(certificate)
    }
}
