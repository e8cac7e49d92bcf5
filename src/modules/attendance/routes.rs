use axum::{routing::post, Router};

use super::handlers::commit;
use crate::app_state::AppState;

pub fn attendance_routes() -> Router<AppState> {
    Router::new().route("/attendance", post(commit))
}
