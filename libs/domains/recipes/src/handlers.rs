use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_helpers::{
    ErrorResponse, ValidatedJson,
    errors::responses::{
        BadRequestResponse, InternalServerErrorResponse, ServiceUnavailableResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::RecipeResult;
use crate::models::{
    GetRecipesRequest, GetRecipesResponse, PreferenceCombination, PreferencesResponse,
    RankedRecipe, Recipe,
};
use crate::repository::RecipeStore;
use crate::service::RetrievalService;

pub const TAG: &str = "recipes";

/// OpenAPI documentation for the recipe retrieval API
#[derive(OpenApi)]
#[openapi(
    paths(get_recipes, list_preferences),
    components(
        schemas(
            GetRecipesRequest,
            GetRecipesResponse,
            RankedRecipe,
            Recipe,
            PreferencesResponse,
            PreferenceCombination,
            ErrorResponse
        ),
        responses(
            BadRequestResponse,
            InternalServerErrorResponse,
            ServiceUnavailableResponse
        )
    ),
    tags(
        (name = TAG, description = "Recipe retrieval by query and dietary preferences")
    )
)]
pub struct ApiDoc;

/// Routes relative to the `/api` prefix.
pub fn router<S: RecipeStore + 'static>(service: RetrievalService<S>) -> Router {
    Router::new()
        .route("/get-recipes", post(get_recipes))
        .route("/preferences", get(list_preferences))
        .with_state(Arc::new(service))
}

/// Retrieve recipes similar to a query within one dietary-preference combination
///
/// The preference tags select the index built for exactly that set; tag
/// order and case do not matter.
#[utoipa::path(
    post,
    path = "/api/get-recipes",
    tag = TAG,
    request_body = GetRecipesRequest,
    responses(
        (status = 200, description = "Recipes, nearest first. May be empty", body = GetRecipesResponse),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn get_recipes<S: RecipeStore>(
    State(service): State<Arc<RetrievalService<S>>>,
    ValidatedJson(request): ValidatedJson<GetRecipesRequest>,
) -> RecipeResult<Json<GetRecipesResponse>> {
    let response = service.get_recipes(request).await?;
    Ok(Json(response))
}

/// List the preference combinations that have a built index
#[utoipa::path(
    get,
    path = "/api/preferences",
    tag = TAG,
    responses(
        (status = 200, description = "Available combinations, sorted by key", body = PreferencesResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_preferences<S: RecipeStore>(
    State(service): State<Arc<RetrievalService<S>>>,
) -> RecipeResult<Json<PreferencesResponse>> {
    Ok(Json(service.list_preferences().await?))
}
