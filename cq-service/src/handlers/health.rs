use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

use crate::startup::AppState;

pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.db.health_check().await?;
    Ok(Json(json!({
        "status": "ok",
        "service": "cq-service",
        "version": env!("CARGO_PKG_VERSION")
    })))
}
