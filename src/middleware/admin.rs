use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::CurrentUser;
use crate::error::ApiError;

/// Runs after [`require_user`](super::require_user); lets only admins through
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<CurrentUser>()
        .map(|user| user.is_admin)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized. Token missing."))?;

    if !is_admin {
        return Err(ApiError::forbidden("Access denied. User is not an admin."));
    }

    Ok(next.run(request).await)
}
