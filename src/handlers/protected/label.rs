// Ingredients and tags share one implementation parameterized by LabelKind

use axum::extract::{Extension, State};

use crate::api::{ApiJson, ApiQuery};
use crate::app::AppState;
use crate::auth::Caller;
use crate::database::models::{Label, LabelKind};
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::{LabelPayload, LabelQuery};

async fn list(state: &AppState, caller: &Caller, kind: LabelKind, query: &LabelQuery) -> ApiResult<Vec<Label>> {
    let assigned_only = query.assigned_only()?;
    let labels = state.store.list_labels(caller, kind, assigned_only).await?;
    Ok(ApiResponse::success(labels))
}

async fn create(state: &AppState, caller: &Caller, kind: LabelKind, payload: LabelPayload) -> ApiResult<Label> {
    let name = payload.validate()?;
    let label = state.store.create_label(caller, kind, &name).await?;
    tracing::debug!("Created {} {} for user {}", kind, label.id, caller.id());
    Ok(ApiResponse::created(label))
}

/// GET /api/recipe/ingredients[?assigned_only=1]
pub async fn ingredients_get(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(query): ApiQuery<LabelQuery>,
) -> ApiResult<Vec<Label>> {
    list(&state, &caller, LabelKind::Ingredient, &query).await
}

/// POST /api/recipe/ingredients
pub async fn ingredients_post(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(payload): ApiJson<LabelPayload>,
) -> ApiResult<Label> {
    create(&state, &caller, LabelKind::Ingredient, payload).await
}

/// GET /api/recipe/tags[?assigned_only=1]
pub async fn tags_get(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(query): ApiQuery<LabelQuery>,
) -> ApiResult<Vec<Label>> {
    list(&state, &caller, LabelKind::Tag, &query).await
}

/// POST /api/recipe/tags
pub async fn tags_post(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(payload): ApiJson<LabelPayload>,
) -> ApiResult<Label> {
    create(&state, &caller, LabelKind::Tag, payload).await
}
