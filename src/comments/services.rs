use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CommentView, CreateCommentRequest},
    repo_types::Comment,
};
use crate::{
    auth::AuthUser,
    error::ApiError,
    shared::{load_authors, non_blank},
    state::AppState,
};

async fn find_comment(st: &AppState, id: Uuid, context: &str) -> Result<Comment, ApiError> {
    st.comments
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::internal(context, e))?
        .ok_or_else(|| ApiError::not_found("Comment not found"))
}

/// The question id is not checked against the question store.
pub async fn create_comment(
    st: &AppState,
    caller: &AuthUser,
    req: CreateCommentRequest,
) -> Result<Comment, ApiError> {
    let content = non_blank(req.content, "Content is required")?;
    let question_id = req
        .question_id
        .ok_or_else(|| ApiError::validation("questionId is required"))?;
    let c = st
        .comments
        .create(caller.user_id, question_id, &content)
        .await
        .map_err(|e| ApiError::internal("Failed to add comment", e))?;
    info!(comment_id = %c.id, %question_id, user_id = %caller.user_id, "comment added");
    Ok(c)
}

/// Only the author may edit; admins included.
pub async fn update_comment(
    st: &AppState,
    caller: &AuthUser,
    id: Uuid,
    content: Option<String>,
) -> Result<Comment, ApiError> {
    let existing = find_comment(st, id, "Failed to update comment").await?;
    if existing.user_id != caller.user_id {
        warn!(user_id = %caller.user_id, comment_id = %id, "edit of foreign comment rejected");
        return Err(ApiError::forbidden("You can only edit your own comments"));
    }
    let content = non_blank(content, "Content is required")?;
    let c = st
        .comments
        .update_content(id, &content)
        .await
        .map_err(|e| ApiError::internal("Failed to update comment", e))?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    info!(comment_id = %id, user_id = %caller.user_id, "comment updated");
    Ok(c)
}

pub async fn delete_comment(st: &AppState, caller: &AuthUser, id: Uuid) -> Result<(), ApiError> {
    let existing = find_comment(st, id, "Error deleting comment").await?;
    if !caller.may_modify(existing.user_id) {
        warn!(user_id = %caller.user_id, comment_id = %id, "delete of foreign comment rejected");
        return Err(ApiError::forbidden("You can only delete your own comments"));
    }
    let deleted = st
        .comments
        .delete(id)
        .await
        .map_err(|e| ApiError::internal("Error deleting comment", e))?;
    if !deleted {
        return Err(ApiError::not_found("Comment not found"));
    }
    info!(comment_id = %id, user_id = %caller.user_id, "comment deleted");
    Ok(())
}

/// Newest first. No comments is an empty list, not an error.
pub async fn list_by_question(
    st: &AppState,
    question_id: Uuid,
    include_author: bool,
) -> Result<Vec<CommentView>, ApiError> {
    let rows = st
        .comments
        .list_by_question(question_id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch comments", e))?;
    if !include_author {
        return Ok(rows.into_iter().map(CommentView::from).collect());
    }
    let authors = load_authors(st, rows.iter().map(|c| c.user_id)).await?;
    Ok(rows
        .into_iter()
        .map(|c| CommentView {
            author: authors.get(&c.user_id).cloned(),
            comment: c,
        })
        .collect())
}
