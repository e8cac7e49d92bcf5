use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{
    AttendanceRecord, AttendanceUpsert, Certificate, Enrollment, EnrollmentPatch, Level,
    NewCertificate, Session, Training,
};
use crate::db::DatabaseError;

use super::EntityStore;

/// Postgres-backed entity store.
///
/// Uses runtime-checked queries; the schema lives in `migrations/`. The
/// unique indexes on (student_id, session_id) and (student_id, training_id)
/// back the upsert and the certificate uniqueness invariant respectively.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn training(&self, training_id: Uuid) -> Result<Option<Training>, DatabaseError> {
        let training = sqlx::query_as::<_, Training>(
            "SELECT id, name, status, created_at, updated_at FROM trainings WHERE id = $1",
        )
        .bind(training_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(training)
    }

    async fn levels_by_training(&self, training_id: Uuid) -> Result<Vec<Level>, DatabaseError> {
        let levels = sqlx::query_as::<_, Level>(
            "SELECT id, training_id, level_number, name FROM levels \
             WHERE training_id = $1 ORDER BY level_number",
        )
        .bind(training_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(levels)
    }

    async fn level(&self, level_id: Uuid) -> Result<Option<Level>, DatabaseError> {
        let level = sqlx::query_as::<_, Level>(
            "SELECT id, training_id, level_number, name FROM levels WHERE id = $1",
        )
        .bind(level_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(level)
    }

    async fn session(&self, session_id: Uuid) -> Result<Option<Session>, DatabaseError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, level_id, session_number, title, scheduled_on, status \
             FROM sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn sessions_by_level(&self, level_id: Uuid) -> Result<Vec<Session>, DatabaseError> {
        let sessions = sqlx::query_as::<_, Session>(
            "SELECT id, level_id, session_number, title, scheduled_on, status \
             FROM sessions WHERE level_id = $1 ORDER BY session_number",
        )
        .bind(level_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn attendance_by_session(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<AttendanceRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT id, student_id, session_id, present, note, comment, marked_at \
             FROM attendance_records WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn upsert_attendance(
        &self,
        data: &AttendanceUpsert,
    ) -> Result<AttendanceRecord, DatabaseError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            "INSERT INTO attendance_records (student_id, session_id, present, note, comment) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (student_id, session_id) DO UPDATE \
             SET present = EXCLUDED.present, note = EXCLUDED.note, \
                 comment = EXCLUDED.comment, marked_at = NOW() \
             RETURNING id, student_id, session_id, present, note, comment, marked_at",
        )
        .bind(data.student_id)
        .bind(data.session_id)
        .bind(data.present)
        .bind(data.note)
        .bind(data.comment.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn enrollment(
        &self,
        student_id: Uuid,
        training_id: Uuid,
    ) -> Result<Option<Enrollment>, DatabaseError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT id, student_id, training_id, current_level, status, enrolled_at, updated_at \
             FROM enrollments WHERE student_id = $1 AND training_id = $2",
        )
        .bind(student_id)
        .bind(training_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn update_enrollment(
        &self,
        student_id: Uuid,
        training_id: Uuid,
        patch: &EnrollmentPatch,
    ) -> Result<Option<Enrollment>, DatabaseError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "UPDATE enrollments \
             SET current_level = COALESCE($1, current_level), \
                 status = COALESCE($2, status), \
                 updated_at = NOW() \
             WHERE student_id = $3 AND training_id = $4 \
             RETURNING id, student_id, training_id, current_level, status, enrolled_at, updated_at",
        )
        .bind(patch.current_level)
        .bind(patch.status.clone())
        .bind(student_id)
        .bind(training_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn certificate(
        &self,
        student_id: Uuid,
        training_id: Uuid,
    ) -> Result<Option<Certificate>, DatabaseError> {
        let certificate = sqlx::query_as::<_, Certificate>(
            "SELECT id, student_id, training_id, number, issued_at \
             FROM certificates WHERE student_id = $1 AND training_id = $2",
        )
        .bind(student_id)
        .bind(training_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(certificate)
    }

    async fn create_certificate(
        &self,
        data: &NewCertificate,
    ) -> Result<Certificate, DatabaseError> {
        let certificate = sqlx::query_as::<_, Certificate>(
            "INSERT INTO certificates (student_id, training_id, number, issued_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, student_id, training_id, number, issued_at",
        )
        .bind(data.student_id)
        .bind(data.training_id)
        .bind(&data.number)
        .bind(data.issued_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => DatabaseError::Duplicate,
            _ => DatabaseError::Sqlx(e),
        })?;
        Ok(certificate)
    }
}
