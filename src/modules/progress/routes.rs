use axum::{routing::get, Router};

use super::handlers::{get_certificate, get_progress, issue};
use crate::app_state::AppState;

pub fn progress_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/trainings/:training_id/students/:student_id/progress",
            get(get_progress),
        )
        .route(
            "/trainings/:training_id/students/:student_id/certificate",
            get(get_certificate).post(issue),
        )
}
