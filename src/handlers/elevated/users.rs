use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::api::format::parse_record_id;
use crate::api::schemas::UserUpdateRequest;
use crate::api::ValidJson;
use crate::auth::password::hash_password;
use crate::database::models::{UpdateOutcome, UserChanges, UserProfile};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/admin/users - all users without credentials
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let users = state.store.list_users().await?;
    if users.is_empty() {
        return Err(ApiError::not_found("No Users Found"));
    }
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

/// GET /api/admin/users/:id - `{data: null}` when nothing matches
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let user = match parse_record_id(&id) {
        Some(id) => state.store.find_user(id).await?.map(UserProfile::from),
        None => None,
    };
    Ok(Json(json!({ "data": user })))
}

/// PATCH /api/admin/users/update/:id
///
/// Responds with the raw match/modify counts rather than the updated user.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UserUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let Some(id) = parse_record_id(&id) else {
        return Ok(Json(json!({ "updatedData": UpdateOutcome::unmatched() })));
    };

    let password = body.password.as_deref().map(hash_password).transpose()?;
    let changes = UserChanges {
        username: body.username,
        email: body.email,
        phone: body.phone,
        password,
    };

    let outcome = state.store.update_user(id, &changes).await?;
    if outcome.modified_count > 0 {
        tracing::info!("Updated user {}", id);
    }
    Ok(Json(json!({ "updatedData": outcome })))
}

/// DELETE /api/admin/users/delete/:id - succeeds whether or not the user existed
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    if let Some(id) = parse_record_id(&id) {
        let removed = state.store.delete_user(id).await?;
        tracing::info!("Deleted {} user(s) with id {}", removed, id);
    }
    Ok(Json(json!({ "message": "User Deleted Successfully" })))
}
