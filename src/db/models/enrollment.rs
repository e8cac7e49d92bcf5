use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Cancelled,
}

/// Links one student to one training. `current_level` is the only persisted
/// computed value in the model; it is overwritten after every attendance
/// commit that touches this enrollment's training.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub training_id: Uuid,
    pub current_level: i32,
    pub status: EnrollmentStatus,
    pub enrolled_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EnrollmentPatch {
    #[validate(range(min = 1))]
    pub current_level: Option<i32>,
    pub status: Option<EnrollmentStatus>,
}
