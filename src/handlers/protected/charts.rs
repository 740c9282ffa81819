use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::api::format::parse_record_id;
use crate::api::schemas::ChartRequest;
use crate::api::ApiJson;
use crate::database::models::Chart;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// POST /api/charts/save - store a chart owned by the caller
pub async fn save(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(body): ApiJson<ChartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chart = body.into_new_chart(current.id)?;
    let chart = state.store.insert_chart(chart).await?;

    tracing::info!("User {} saved chart {}", current.id, chart.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Chart saved", "chart": chart })),
    ))
}

/// GET /api/charts/history - the caller's charts, newest first
pub async fn history(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<Chart>>, ApiError> {
    Ok(Json(state.store.charts_by_owner(current.id).await?))
}

/// DELETE /api/charts/delete/:id - owners remove their own charts, admins any
pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let not_found = || ApiError::not_found("Chart not found");

    let id = parse_record_id(&id).ok_or_else(not_found)?;
    let chart = state.store.find_chart(id).await?.ok_or_else(not_found)?;

    if chart.created_by != current.id && !current.is_admin {
        return Err(ApiError::forbidden("Access denied. Chart belongs to another user."));
    }

    if state.store.delete_chart(id).await? == 0 {
        return Err(not_found());
    }

    tracing::info!("User {} deleted chart {}", current.id, id);
    Ok(Json(json!({ "message": "Chart deleted successfully" })))
}
