use crate::AppState;
use axum::{extract::State, Json};
use serde_json::Value;
use service_core::error::AppError;

/// Country list for the product form, cached server side.
pub async fn countries(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.countries.get().await?))
}
