use axum::extract::{Extension, State};

use crate::api::ApiJson;
use crate::app::AppState;
use crate::auth::{self, Caller};
use crate::database::models::{UserChanges, UserProfile};
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::ProfilePayload;

/// GET /api/user/me - The authenticated user's own profile
pub async fn me_get(Extension(caller): Extension<Caller>) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(UserProfile::from(caller.user())))
}

/// PATCH /api/user/me - Update name and/or password of the authenticated user
pub async fn me_patch(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(payload): ApiJson<ProfilePayload>,
) -> ApiResult<UserProfile> {
    let update = payload.validate(state.config.security.min_password_length)?;

    let changes = UserChanges {
        name: update.name,
        password_hash: update.password.as_deref().map(auth::hash_password).transpose()?,
    };
    if changes.is_empty() {
        return Ok(ApiResponse::success(UserProfile::from(caller.user())));
    }

    let user = state.store.update_user(&caller, changes).await?;
    Ok(ApiResponse::success(UserProfile::from(&user)))
}

/// DELETE /api/user/token - Revoke the token used for this request
pub async fn token_delete(State(state): State<AppState>, Extension(caller): Extension<Caller>) -> ApiResult<()> {
    if state.store.revoke_token(&caller).await? {
        tracing::info!("Revoked token for user {}", caller.id());
    }
    Ok(ApiResponse::no_content())
}
