use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;

/// At most one certificate per (student, training). Certificates are minted
/// once by the issuer and never updated or deleted.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Certificate {
    pub id: Uuid,
    pub student_id: Uuid,
    pub training_id: Uuid,
    pub number: String,
    pub issued_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCertificate {
    pub student_id: Uuid,
    pub training_id: Uuid,
    pub number: String,
    pub issued_at: OffsetDateTime,
}
