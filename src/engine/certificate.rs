//! Certificate Issuer: at most one certificate per (student, training),
//! idempotent through the existence check, rejected outright when the
//! training is not completed.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{Certificate, NewCertificate};
use crate::db::repositories::EntityStore;

use super::{EngineError, FormationStatus, TrainingProgress};

/// Outcome of an issuance request. `AlreadyIssued` lets callers tell a
/// repeated request apart from a fresh mint without breaking idempotence.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IssueOutcome {
    Issued(Certificate),
    AlreadyIssued(Certificate),
}

impl IssueOutcome {
    pub fn certificate(&self) -> &Certificate {
        match self {
            IssueOutcome::Issued(c) | IssueOutcome::AlreadyIssued(c) => c,
        }
    }
}

/// Certificate number derived from the issue date and the two identifiers,
/// so re-issuing on the same day is reproducible.
pub fn certificate_number(issued_at: OffsetDateTime, student_id: Uuid, training_id: Uuid) -> String {
    let date = issued_at.date();
    format!(
        "ASTBA-{}-{:02}{:02}-{}{}",
        date.year(),
        u8::from(date.month()),
        date.day(),
        uuid_suffix(student_id),
        uuid_suffix(training_id),
    )
}

fn uuid_suffix(id: Uuid) -> String {
    let simple = id.simple().to_string();
    simple[simple.len() - 3..].to_string()
}

/// Issue the certificate for a completed (student, training) pair.
///
/// Requires the caller's freshly evaluated progress; anything short of
/// `completed` is rejected so no speculative certificate can exist. A pair
/// that already holds a certificate gets it back unchanged.
pub async fn issue_certificate(
    store: &dyn EntityStore,
    student_id: Uuid,
    training_id: Uuid,
    progress: &TrainingProgress,
    issued_at: OffsetDateTime,
) -> Result<IssueOutcome, EngineError> {
    if progress.formation_status != FormationStatus::Completed {
        return Err(EngineError::NotEligible { student_id, training_id });
    }

    if let Some(existing) = store.certificate(student_id, training_id).await? {
        return Ok(IssueOutcome::AlreadyIssued(existing));
    }

    let certificate = store
        .create_certificate(&NewCertificate {
            student_id,
            training_id,
            number: certificate_number(issued_at, student_id, training_id),
            issued_at,
        })
        .await?;

    tracing::info!(
        %student_id,
        %training_id,
        number = %certificate.number,
        "certificate issued"
    );

    Ok(IssueOutcome::Issued(certificate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn number_encodes_date_and_id_suffixes() {
        let student = Uuid::parse_str("00000000-0000-0000-0000-000000000abc").unwrap();
        let training = Uuid::parse_str("00000000-0000-0000-0000-000000000def").unwrap();
        let number = certificate_number(datetime!(2026-03-07 10:00 UTC), student, training);
        assert_eq!(number, "ASTBA-2026-0307-abcdef");
    }

    #[test]
    fn number_is_deterministic_for_same_day_and_pair() {
        let student = Uuid::new_v4();
        let training = Uuid::new_v4();
        let morning = datetime!(2026-01-15 08:00 UTC);
        let evening = datetime!(2026-01-15 20:30 UTC);
        assert_eq!(
            certificate_number(morning, student, training),
            certificate_number(evening, student, training),
        );
    }
}
