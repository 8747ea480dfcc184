use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let last_run = state.runner.last_outcome().await.map(|o| o.ran_at);

    Json(json!({
        "status": "healthy",
        "pipeline_id": state.config.forecast_pipeline_id,
        "last_run": last_run,
    }))
}
