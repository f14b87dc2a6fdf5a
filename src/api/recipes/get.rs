use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::{categories, recipe_categories, recipes, users};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub title: String,
    pub instructions: String,
    /// Stored image filename, served under /media
    pub image: Option<String>,
    pub author: String,
    pub category: Option<CategoryRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let (recipe, author): (Recipe, String) = match recipes::table
        .inner_join(users::table)
        .filter(recipes::id.eq(id))
        .select((Recipe::as_select(), users::username))
        .first(&mut conn)
    {
        Ok(r) => r,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Recipe not found".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    // A recipe has at most one category link
    let category: Option<(Uuid, String)> = match recipe_categories::table
        .inner_join(categories::table)
        .filter(recipe_categories::recipe_id.eq(recipe.id))
        .select((categories::id, categories::name))
        .first(&mut conn)
        .optional()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to fetch category: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch category".to_string(),
                }),
            )
                .into_response();
        }
    };

    let response = RecipeResponse {
        id: recipe.id,
        title: recipe.title,
        instructions: recipe.instructions,
        image: recipe.image,
        author,
        category: category.map(|(id, name)| CategoryRef { id, name }),
        created_at: recipe.created_at,
        updated_at: recipe.updated_at,
    };

    (StatusCode::OK, Json(response)).into_response()
}
