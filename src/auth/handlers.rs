use axum::{extract::State, http::StatusCode, routing::post, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, LoginUser, RegisterRequest, RegisterResponse},
        services::{self, LoginOutcome, RegisterOutcome},
    },
    error::ApiError,
    extract::Json,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let res = match services::register(&state, payload).await? {
        RegisterOutcome::Created(user) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                success: true,
                message: "User registration successful".into(),
                user: Some(user.into()),
            }),
        ),
        RegisterOutcome::AlreadyRegistered => (
            StatusCode::OK,
            Json(RegisterResponse {
                success: true,
                message: "User already registered. Please log in.".into(),
                user: None,
            }),
        ),
    };
    Ok(res)
}

/// A wrong password is reported as `success: false` with status 200.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let res = match services::login(&state, payload).await? {
        LoginOutcome::Success { user, token } => LoginResponse {
            success: true,
            message: "Login Successfully".into(),
            user: Some(LoginUser {
                name: user.name,
                email: user.email,
                role: user.role,
                user_id: user.id,
            }),
            token: Some(token),
        },
        LoginOutcome::WrongPassword => LoginResponse {
            success: false,
            message: "Invalid Password".into(),
            user: None,
            token: None,
        },
    };
    Ok(Json(res))
}
