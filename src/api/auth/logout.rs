use crate::api::ErrorResponse;
use crate::auth::delete_session;
use crate::db::DbPool;
use crate::get_conn;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Session destroyed (idempotent; succeeds with or without a valid token)")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(State(pool): State<Arc<DbPool>>, headers: HeaderMap) -> impl IntoResponse {
    // No error path: a missing or unknown token still logs you out
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "));

    if let Some(token) = token {
        let mut conn = get_conn!(pool);
        if let Err(e) = delete_session(&mut conn, token) {
            tracing::error!("Failed to delete session: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to delete session".to_string(),
                }),
            )
                .into_response();
        }
    }

    StatusCode::NO_CONTENT.into_response()
}
