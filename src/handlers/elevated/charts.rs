use axum::{extract::State, Json};

use crate::database::models::ChartWithOwner;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/charts - every chart with its owner's username and email
pub async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<ChartWithOwner>>, ApiError> {
    Ok(Json(state.store.charts_with_owners().await?))
}
