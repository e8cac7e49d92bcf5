use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app_state::AppState;
use crate::db::models::AttendanceRecord;
use crate::engine::{commit_attendance, AttendanceMark};
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct BulkAttendanceRequest {
    #[validate(length(min = 1))]
    #[validate(nested)]
    pub records: Vec<AttendanceMark>,
}

#[derive(Debug, Serialize)]
pub struct BulkAttendanceResponse {
    pub applied: Vec<AttendanceRecord>,
}

/// Commit one sheet of attendance marks. Returns the post-upsert records;
/// progression and certificates are recomputed as a side effect.
pub async fn commit(
    State(state): State<AppState>,
    Json(payload): Json<BulkAttendanceRequest>,
) -> AppResult<Json<BulkAttendanceResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let applied = commit_attendance(state.store.as_ref(), &state.pair_locks, &payload.records).await?;

    Ok(Json(BulkAttendanceResponse { applied }))
}
