use axum::extract::{Extension, State};

use crate::api::{ApiJson, ApiQuery};
use crate::app::AppState;
use crate::auth::Caller;
use crate::database::models::Recipe;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::{RecipePayload, RecipeQuery};

/// GET /api/recipe/recipes[?ingredients=1,2][&tags=3]
///
/// With both filters a recipe must reference one of the listed ingredients
/// and one of the listed tags.
pub async fn recipes_get(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiQuery(query): ApiQuery<RecipeQuery>,
) -> ApiResult<Vec<Recipe>> {
    let filter = query.filter()?;
    let recipes = state.store.list_recipes(&caller, &filter).await?;
    Ok(ApiResponse::success(recipes))
}

/// POST /api/recipe/recipes
///
/// Input:
/// ```json
/// {
///   "name": "Chili",          // required
///   "time_minutes": 30,       // default 0
///   "price": "5.50",          // default 0.00
///   "link": "https://...",    // optional
///   "ingredients": [1, 2],    // ids owned by the caller
///   "tags": [3]
/// }
/// ```
pub async fn recipes_post(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> ApiResult<Recipe> {
    let recipe = payload.validate()?;
    let recipe = state.store.create_recipe(&caller, recipe).await?;
    Ok(ApiResponse::created(recipe))
}
