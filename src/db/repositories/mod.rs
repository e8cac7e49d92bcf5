mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use super::models::{
    AttendanceRecord, AttendanceUpsert, Certificate, Enrollment, EnrollmentPatch, Level,
    NewCertificate, Session, Training,
};
use super::DatabaseError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Read/write access to the entities the progression engine works over.
///
/// The engine depends on this interface only; whether records live in
/// Postgres, a document store or memory is an adapter concern. Adapters
/// offer read-after-write consistency within a single request and nothing
/// stronger; the engine is written to tolerate re-invocation (see the
/// coordinator and the issuer's existence check).
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn training(&self, training_id: Uuid) -> Result<Option<Training>, DatabaseError>;

    async fn levels_by_training(&self, training_id: Uuid) -> Result<Vec<Level>, DatabaseError>;

    async fn level(&self, level_id: Uuid) -> Result<Option<Level>, DatabaseError>;

    async fn session(&self, session_id: Uuid) -> Result<Option<Session>, DatabaseError>;

    async fn sessions_by_level(&self, level_id: Uuid) -> Result<Vec<Session>, DatabaseError>;

    async fn attendance_by_session(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<AttendanceRecord>, DatabaseError>;

    /// Create or overwrite the attendance record keyed by
    /// (student_id, session_id). Overwrites refresh `marked_at`.
    async fn upsert_attendance(
        &self,
        data: &AttendanceUpsert,
    ) -> Result<AttendanceRecord, DatabaseError>;

    async fn enrollment(
        &self,
        student_id: Uuid,
        training_id: Uuid,
    ) -> Result<Option<Enrollment>, DatabaseError>;

    async fn update_enrollment(
        &self,
        student_id: Uuid,
        training_id: Uuid,
        patch: &EnrollmentPatch,
    ) -> Result<Option<Enrollment>, DatabaseError>;

    async fn certificate(
        &self,
        student_id: Uuid,
        training_id: Uuid,
    ) -> Result<Option<Certificate>, DatabaseError>;

    async fn create_certificate(
        &self,
        data: &NewCertificate,
    ) -> Result<Certificate, DatabaseError>;
}
