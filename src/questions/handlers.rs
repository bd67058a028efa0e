use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, patch, put},
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        ApproveRequest, ApproveResponse, CreateQuestionRequest, CreatedQuestionResponse,
        QuestionView, UpdateQuestionRequest, UpdatedQuestionResponse,
    },
    services,
};
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{Json, Path},
    shared::{IncludeQuery, MessageResponse},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/questions", get(list_approved).post(create_question))
        .route("/questions/pending", get(list_pending))
        .route("/questions/pending/:user_id", get(list_pending_for_user))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/questions/approve/:id", patch(approve_question))
        .route("/questions/update/:question_id", put(update_question))
        .route("/questions/:id", delete(delete_question))
}

#[instrument(skip(state))]
pub async fn list_approved(
    State(state): State<AppState>,
    Query(include): Query<IncludeQuery>,
) -> Result<Json<Vec<QuestionView>>, ApiError> {
    Ok(Json(services::list_approved(&state, include.author()).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_question(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<CreatedQuestionResponse>), ApiError> {
    let q = services::create_question(&state, &user, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedQuestionResponse {
            success: true,
            message: "Question submitted for approval".into(),
            data: q,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_pending(
    State(state): State<AppState>,
    user: AuthUser,
    Query(include): Query<IncludeQuery>,
) -> Result<Json<Vec<QuestionView>>, ApiError> {
    Ok(Json(services::list_pending(&state, &user, include.author()).await?))
}

#[instrument(skip(state))]
pub async fn list_pending_for_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    Query(include): Query<IncludeQuery>,
) -> Result<Json<Vec<QuestionView>>, ApiError> {
    Ok(Json(
        services::list_pending_for_user(&state, &user, user_id, include.author()).await?,
    ))
}

#[instrument(skip(state, payload))]
pub async fn approve_question(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveRequest>,
) -> Result<Json<ApproveResponse>, ApiError> {
    let approved = payload.is_approved.unwrap_or(true);
    let question = services::approve_question(&state, &user, id, approved).await?;
    let message = if approved { "Question approved" } else { "Question rejected" };
    Ok(Json(ApproveResponse {
        message: message.into(),
        question,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_question(
    State(state): State<AppState>,
    user: AuthUser,
    Path(question_id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<Json<UpdatedQuestionResponse>, ApiError> {
    let question = services::update_question(&state, &user, question_id, payload.question).await?;
    Ok(Json(UpdatedQuestionResponse {
        success: true,
        message: "Question updated successfully.".into(),
        question,
    }))
}

#[instrument(skip(state))]
pub async fn delete_question(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    services::delete_question(&state, &user, id).await?;
    Ok(Json(MessageResponse::ok("Question deleted")))
}
