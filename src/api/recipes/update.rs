use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::media::{MediaError, MediaStore};
use crate::models::{NewRecipeCategory, Recipe, RecipeCategory};
use crate::schema::{categories, recipe_categories, recipes};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::form;

/// Multipart form shape, for the OpenAPI document only. Every part is
/// optional; omitted parts leave the stored value untouched.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub instructions: Option<String>,
    pub category_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

/// The category the edit should end up pointing at: the submitted one if
/// present, otherwise whatever the recipe was linked to before.
fn resolve_category(submitted: Option<Uuid>, previous: Option<Uuid>) -> Option<Uuid> {
    submitted.or(previous)
}

/// Submitted text replaces the stored value after trimming, matching what
/// creation persists; an omitted part keeps the stored value exactly.
fn merge_text(submitted: Option<String>, current: &str) -> String {
    submitted
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| current.to_string())
}

#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body(content_type = "multipart/form-data", content = UpdateRecipeRequest),
    responses(
        (status = 200, description = "Recipe updated successfully"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Only the author may edit", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(media): State<Arc<MediaStore>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> impl IntoResponse {
    let form = match form::collect(multipart).await {
        Ok(f) => f,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response(),
    };

    if let Some(ref title) = form.title {
        if title.trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Title cannot be empty".to_string(),
                }),
            )
                .into_response();
        }
    }

    if let Some(ref instructions) = form.instructions {
        if instructions.trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Instructions cannot be empty".to_string(),
                }),
            )
                .into_response();
        }
    }

    let mut conn = get_conn!(pool);

    let recipe: Recipe = match recipes::table
        .find(id)
        .select(Recipe::as_select())
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

    // Ownership is an explicit rule: only the author may edit
    if recipe.user_id != user.id {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Only the author may edit this recipe".to_string(),
            }),
        )
            .into_response();
    }

    if let Some(category_id) = form.category_id {
        let found: Result<Uuid, _> = categories::table
            .find(category_id)
            .select(categories::id)
            .first(&mut conn);
        match found {
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
    }

    // Recall the existing link so an edit without a category part keeps it
    let existing_link: Option<RecipeCategory> = match recipe_categories::table
        .filter(recipe_categories::recipe_id.eq(recipe.id))
        .select(RecipeCategory::as_select())
        .first(&mut conn)
        .optional()
    {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to fetch category link: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch category link".to_string(),
                }),
            )
                .into_response();
        }
    };

    // A new upload gets the same timestamp rename as creation; without one
    // the stored filename is left exactly as it was
    let new_image = match form.image {
        Some(upload) => match media.save(&upload.file_name, &upload.data) {
            Ok(name) => Some(name),
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
        },
        None => None,
    };

    let title = merge_text(form.title, &recipe.title);
    let instructions = merge_text(form.instructions, &recipe.instructions);
    let image = new_image.clone().or_else(|| recipe.image.clone());
    let target_category = resolve_category(
        form.category_id,
        existing_link.as_ref().map(|l| l.category_id),
    );

    // The author column is never touched: editing does not reassign ownership
    let result: Result<(), diesel::result::Error> = conn.transaction(|conn| {
        diesel::update(recipes::table.find(recipe.id))
            .set((
                recipes::title.eq(&title),
                recipes::instructions.eq(&instructions),
                recipes::image.eq(image.as_deref()),
                recipes::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;

        match (&existing_link, target_category) {
            (Some(link), Some(category_id)) => {
                diesel::update(recipe_categories::table.find(link.id))
                    .set(recipe_categories::category_id.eq(category_id))
                    .execute(conn)?;
            }
            (None, Some(category_id)) => {
                diesel::insert_into(recipe_categories::table)
                    .values(&NewRecipeCategory {
                        recipe_id: recipe.id,
                        category_id,
                    })
                    .execute(conn)?;
            }
            (_, None) => {}
        }

        Ok(())
    });

    match result {
        Ok(()) => {
            // The replaced file is unreferenced once the new row is committed
            if new_image.is_some() {
                if let Some(old) = recipe.image {
                    if let Err(e) = media.remove(&old) {
                        tracing::warn!("Failed to remove replaced image {}: {}", old, e);
                    }
                }
            }
            StatusCode::OK.into_response()
        }
        Err(e) => {
            tracing::error!("Failed to update recipe: {}", e);
            if let Some(name) = new_image {
                if let Err(e) = media.remove(&name) {
                    tracing::warn!("Failed to clean up image {}: {}", name, e);
                }
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submitted_category_wins() {
        let submitted = Uuid::new_v4();
        let previous = Uuid::new_v4();
        assert_eq!(
            resolve_category(Some(submitted), Some(previous)),
            Some(submitted)
        );
    }

    #[test]
    fn test_omitted_category_keeps_previous() {
        let previous = Uuid::new_v4();
        assert_eq!(resolve_category(None, Some(previous)), Some(previous));
    }

    #[test]
    fn test_no_category_anywhere() {
        assert_eq!(resolve_category(None, None), None);
    }

    #[test]
    fn test_submitted_text_is_trimmed() {
        assert_eq!(merge_text(Some("  Soup  ".to_string()), "Old"), "Soup");
    }

    #[test]
    fn test_omitted_text_keeps_stored_value() {
        assert_eq!(merge_text(None, "  as stored  "), "  as stored  ");
    }
}
