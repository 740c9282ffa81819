use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::state::AppState;

/// Caller resolved from the bearer token, attached to request extensions
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub is_admin: bool,
    pub profile: UserProfile,
}

/// Bearer authentication: verify the token, then load the user it names.
///
/// The user is looked up by the token's email claim, so a token stops
/// resolving once that user's email changes.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Unauthorized. Token missing."))?;

    let claims = state.tokens.verify(&token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::from(e)
    })?;

    let user = state
        .store
        .find_user_by_email(&claims.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unauthorized. User not found."))?;

    let current = CurrentUser {
        id: user.id,
        is_admin: user.is_admin,
        profile: UserProfile::from(user),
    };
    request.extensions_mut().insert(current);

    Ok(next.run(request).await)
}

/// Token from the Authorization header with any "Bearer" prefix removed;
/// `None` when the header is absent, unreadable or blank
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = raw.trim();
    let token = token.strip_prefix("Bearer").unwrap_or(token).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
