pub mod create;
pub mod delete;
mod form;
pub mod get;
pub mod update;

use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/recipes endpoints. The detail view is
/// public; create, update, and delete require an authenticated user.
/// Image uploads need more room than axum's 2 MB default body limit.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/recipes", post(create::create_recipe))
        .route(
            "/api/recipes/{id}",
            get(get::get_recipe)
                .put(update::update_recipe)
                .delete(delete::delete_recipe),
        )
        .layer(DefaultBodyLimit::max(form::MAX_UPLOAD_BYTES))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_recipe,
        get::get_recipe,
        update::update_recipe,
        delete::delete_recipe,
    ),
    components(schemas(
        create::CreateRecipeRequest,
        create::CreateRecipeResponse,
        get::RecipeResponse,
        get::CategoryRef,
        update::UpdateRecipeRequest,
    ))
)]
pub struct ApiDoc;
