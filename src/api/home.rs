use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Category;
use crate::schema::{categories, recipe_categories, recipes};
use crate::AppState;
use axum::routing::get;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// How many of the newest recipe-category links the home view shows
const RECENT_COUNT: i64 = 5;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/home", get(home))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
}

/// One entry in the "latest recipes" strip: a recipe-category link plus
/// enough of the recipe to render a card.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecentRecipe {
    pub recipe_id: Uuid,
    pub title: String,
    /// Stored image filename, served under /media
    pub image: Option<String>,
    pub category_id: Uuid,
    pub category_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HomeResponse {
    pub categories: Vec<CategorySummary>,
    pub recent: Vec<RecentRecipe>,
}

#[utoipa::path(
    get,
    path = "/api/home",
    tag = "home",
    responses(
        (status = 200, description = "All categories and the five most recent recipes", body = HomeResponse)
    )
)]
pub async fn home(State(pool): State<Arc<DbPool>>) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let all_categories: Vec<Category> = match categories::table
        .order(categories::name.asc())
        .select(Category::as_select())
        .load(&mut conn)
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load categories: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to load categories".to_string(),
                }),
            )
                .into_response();
        }
    };

    // Newest-first by relationship id, matching insertion order
    type RecentRow = (Uuid, String, Option<String>, Uuid, String, DateTime<Utc>);
    let recent_rows: Vec<RecentRow> = match recipe_categories::table
        .inner_join(recipes::table)
        .inner_join(categories::table)
        .order(recipe_categories::id.desc())
        .limit(RECENT_COUNT)
        .select((
            recipes::id,
            recipes::title,
            recipes::image,
            categories::id,
            categories::name,
            recipes::created_at,
        ))
        .load(&mut conn)
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to load recent recipes: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to load recent recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    let response = HomeResponse {
        categories: all_categories
            .into_iter()
            .map(|c| CategorySummary {
                id: c.id,
                name: c.name,
            })
            .collect(),
        recent: recent_rows
            .into_iter()
            .map(
                |(recipe_id, title, image, category_id, category_name, created_at)| RecentRecipe {
                    recipe_id,
                    title,
                    image,
                    category_id,
                    category_name,
                    created_at,
                },
            )
            .collect(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

#[derive(OpenApi)]
#[openapi(
    paths(home),
    components(schemas(HomeResponse, CategorySummary, RecentRecipe))
)]
pub struct ApiDoc;
