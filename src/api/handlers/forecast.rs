use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::errors::AppError;
use crate::AppState;

/// POST /api/run: Run today's forecast and report the single outcome.
pub async fn run(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let outcome = state.runner.run_now().await?;

    tracing::info!(
        date = %outcome.date,
        record_id = %outcome.record_id,
        action = %outcome.action,
        "Forecast run triggered via API"
    );

    Ok(Json(json!({
        "success": true,
        "message": outcome.message(),
        "outcome": outcome,
    })))
}

/// GET /api/forecast/last: Outcome of the most recent successful run.
pub async fn last(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .runner
        .last_outcome()
        .await
        .ok_or_else(|| AppError::NotFound("no forecast run has completed yet".into()))?;

    Ok(Json(outcome))
}
