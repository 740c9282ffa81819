use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::middleware::CurrentUser;

/// GET /api/auth/user - profile of the token's owner
pub async fn user(Extension(current): Extension<CurrentUser>) -> Json<Value> {
    Json(json!({ "userData": current.profile }))
}
