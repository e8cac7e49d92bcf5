use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::Validate;

/// One attendance mark, at most one per (student, session). The absence of
/// a record for a pair means "not yet marked", which is not the same thing
/// as `present: false`; the engine keeps the two apart as a tri-state.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub session_id: Uuid,
    pub present: bool,
    pub note: Option<f64>,
    pub comment: Option<String>,
    pub marked_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AttendanceUpsert {
    pub student_id: Uuid,
    pub session_id: Uuid,
    pub present: bool,
    #[validate(range(min = 0.0, max = 20.0))]
    pub note: Option<f64>,
    pub comment: Option<String>,
}
