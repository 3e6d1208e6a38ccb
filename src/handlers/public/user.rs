// handlers/public/user.rs - POST /api/user/create, POST /api/user/token

use axum::extract::State;
use serde::Serialize;

use crate::api::ApiJson;
use crate::app::AppState;
use crate::auth;
use crate::database::models::{NewUser, UserProfile};
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::{CredentialsPayload, SignupPayload};

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/user/create - Register a new account
///
/// Input: `{"email": "...", "password": "...", "name": "..."}` (name optional).
/// Returns 201 with `{email, name}`; the password hash is never returned.
pub async fn create_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupPayload>,
) -> ApiResult<UserProfile> {
    let signup = payload.validate(state.config.security.min_password_length)?;
    let password_hash = auth::hash_password(&signup.password)?;

    let user = state
        .store
        .create_user(NewUser {
            email: signup.email,
            name: signup.name,
            password_hash,
        })
        .await?;

    tracing::info!("Registered user {}", user.id);
    Ok(ApiResponse::created(UserProfile::from(&user)))
}

/// POST /api/user/token - Exchange credentials for an opaque token
///
/// Every successful call issues a new token; earlier tokens stay valid until
/// they expire or are revoked.
pub async fn token_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CredentialsPayload>,
) -> ApiResult<TokenResponse> {
    let (email, password) = payload.validate()?;
    let token = auth::issue_token(state.store.as_ref(), &state.config.security, &email, &password).await?;
    Ok(ApiResponse::success(TokenResponse { token }))
}
