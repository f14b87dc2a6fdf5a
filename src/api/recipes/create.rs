use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::media::{MediaError, MediaStore};
use crate::models::{NewRecipe, NewRecipeCategory};
use crate::schema::{categories, recipe_categories, recipes};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::form;

/// Multipart form shape, for the OpenAPI document only
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub instructions: String,
    pub category_id: Uuid,
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateRecipeResponse {
    pub id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body(content_type = "multipart/form-data", content = CreateRecipeRequest),
    responses(
        (status = 201, description = "Recipe created successfully", body = CreateRecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(media): State<Arc<MediaStore>>,
    multipart: Multipart,
) -> impl IntoResponse {
    let form = match form::collect(multipart).await {
        Ok(f) => f,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response(),
    };

    // Validate everything before touching storage, so a rejected submission
    // leaves no partial writes behind
    let fields = match form::validate_new(form) {
        Ok(f) => f,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response(),
    };

    let mut conn = get_conn!(pool);

    // Unknown category is a validation failure, not a server error
    let category_exists: Result<Uuid, _> = categories::table
        .find(fields.category_id)
        .select(categories::id)
        .first(&mut conn);
    match category_exists {
        Ok(_) => {}
        Err(diesel::NotFound) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Unknown category".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to look up category: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to look up category".to_string(),
                }),
            )
                .into_response();
        }
    }

    let stored_image = match media.save(&fields.image.file_name, &fields.image.data) {
        Ok(name) => name,
        Err(e @ (MediaError::MissingExtension(_) | MediaError::UnsupportedExtension(_))) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to store image: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to store image".to_string(),
                }),
            )
                .into_response();
        }
    };

    // Recipe row and its single category link commit together
    let result: Result<Uuid, diesel::result::Error> = conn.transaction(|conn| {
        let new_recipe = NewRecipe {
            user_id: user.id,
            title: &fields.title,
            instructions: &fields.instructions,
            image: Some(&stored_image),
        };

        let recipe_id: Uuid = diesel::insert_into(recipes::table)
            .values(&new_recipe)
            .returning(recipes::id)
            .get_result(conn)?;

        diesel::insert_into(recipe_categories::table)
            .values(&NewRecipeCategory {
                recipe_id,
                category_id: fields.category_id,
            })
            .execute(conn)?;

        Ok(recipe_id)
    });

    match result {
        Ok(recipe_id) => (
            StatusCode::CREATED,
            Json(CreateRecipeResponse { id: recipe_id }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to create recipe: {}", e);
            // The rows never landed, so the image file must not outlive them
            if let Err(e) = media.remove(&stored_image) {
                tracing::warn!("Failed to clean up image {}: {}", stored_image, e);
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
