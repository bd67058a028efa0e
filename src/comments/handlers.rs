use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CommentListResponse, CommentResponse, CreateCommentRequest, UpdateCommentRequest},
    services,
};
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{Json, Path},
    shared::{IncludeQuery, MessageResponse},
    state::AppState,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/questions/createComment", post(create_comment))
        .route("/questions/updateComment/:comment_id", put(update_comment))
        .route("/questions/deleteComment/:comment_id", delete(delete_comment))
        .route("/questions/comments/:question_id", get(list_comments))
}

#[instrument(skip(state, payload))]
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let comment = services::create_comment(&state, &user, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            success: true,
            message: "Comment added successfully".into(),
            comment,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    let comment = services::update_comment(&state, &user, comment_id, payload.content).await?;
    Ok(Json(CommentResponse {
        success: true,
        message: "Comment updated successfully".into(),
        comment,
    }))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    services::delete_comment(&state, &user, comment_id).await?;
    Ok(Json(MessageResponse::ok("Comment deleted successfully")))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Query(include): Query<IncludeQuery>,
) -> Result<Json<CommentListResponse>, ApiError> {
    let comments = services::list_by_question(&state, question_id, include.author()).await?;
    Ok(Json(CommentListResponse {
        success: true,
        comments,
    }))
}
