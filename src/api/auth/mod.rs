pub mod login;
pub mod logout;
pub mod signup;

use crate::AppState;
use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/auth endpoints (no auth required)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup::signup))
        .route("/api/auth/login", post(login::login))
        .route("/api/auth/logout", post(logout::logout))
}

#[derive(OpenApi)]
#[openapi(
    paths(login::login, logout::logout, signup::signup),
    components(schemas(
        login::LoginRequest,
        login::LoginResponse,
        signup::SignupRequest,
        signup::SignupResponse,
    ))
)]
pub struct ApiDoc;
