use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::engine::{
    evaluate, issue_certificate, load_attendance_snapshot, IssueOutcome, TrainingProgress,
};
use crate::error::{AppError, AppResult};

/// Evaluated standing of one student in one training.
pub async fn get_progress(
    State(state): State<AppState>,
    Path((training_id, student_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<TrainingProgress>> {
    let store = state.store.as_ref();
    if store.training(training_id).await?.is_none() {
        return Err(AppError::NotFound(format!("training {}", training_id)));
    }

    let snapshot = load_attendance_snapshot(store, training_id, student_id).await?;
    Ok(Json(evaluate(&snapshot)))
}

pub async fn get_certificate(
    State(state): State<AppState>,
    Path((training_id, student_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let certificate = state
        .store
        .certificate(student_id, training_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "no certificate for student {} in training {}",
                student_id, training_id
            ))
        })?;
    Ok(Json(certificate))
}

/// Direct issuance path. Re-evaluates progress first, so a certificate can
/// never be minted for a training that is not completed.
pub async fn issue(
    State(state): State<AppState>,
    Path((training_id, student_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let store = state.store.as_ref();
    if store.training(training_id).await?.is_none() {
        return Err(AppError::NotFound(format!("training {}", training_id)));
    }

    let snapshot = load_attendance_snapshot(store, training_id, student_id).await?;
    let progress = evaluate(&snapshot);

    let outcome =
        issue_certificate(store, student_id, training_id, &progress, OffsetDateTime::now_utc())
            .await?;

    let status = match &outcome {
        IssueOutcome::Issued(_) => StatusCode::CREATED,
        IssueOutcome::AlreadyIssued(_) => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}
