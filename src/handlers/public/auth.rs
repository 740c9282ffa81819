use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::api::schemas::{LoginRequest, RegisterRequest};
use crate::api::ValidJson;
use crate::auth::password::{hash_password, verify_password};
use crate::database::models::NewUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Body returned by both register and login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub message: &'static str,
    pub token: String,
    pub user_id: String,
}

/// POST /api/auth/register - create an account and sign the caller in
///
/// The duplicate-email check and the insert are two separate store calls,
/// so two concurrent registrations with one email can both succeed.
pub async fn register(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.store.find_user_by_email(&body.email).await?.is_some() {
        return Err(ApiError::conflict("Email already exists"));
    }

    let password = hash_password(&body.password)?;
    let user = state
        .store
        .insert_user(NewUser {
            username: body.username,
            email: body.email,
            phone: body.phone,
            password,
        })
        .await?;

    tracing::info!("Registered user {}", user.id);

    let token = state.tokens.issue(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            message: "successful",
            token,
            user_id: user.id.to_string(),
        }),
    ))
}

/// POST /api/auth/login - exchange email and password for a token
pub async fn login(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .store
        .find_user_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid Credentials"))?;

    if !verify_password(&body.password, &user.password) {
        tracing::debug!("Password mismatch for user {}", user.id);
        return Err(ApiError::unauthorized("Invalid Email or Password"));
    }

    let token = state.tokens.issue(&user)?;
    Ok(Json(TokenResponse {
        message: "Login successful",
        token,
        user_id: user.id.to_string(),
    }))
}
