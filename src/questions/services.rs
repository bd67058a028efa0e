use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateQuestionRequest, QuestionView},
    repo_types::Question,
};
use crate::{
    auth::AuthUser,
    error::ApiError,
    shared::{load_authors, non_blank},
    state::AppState,
};

async fn into_views(
    st: &AppState,
    questions: Vec<Question>,
    include_author: bool,
) -> Result<Vec<QuestionView>, ApiError> {
    if !include_author {
        return Ok(questions.into_iter().map(QuestionView::from).collect());
    }
    let authors = load_authors(st, questions.iter().map(|q| q.user_id)).await?;
    Ok(questions
        .into_iter()
        .map(|q| QuestionView {
            author: authors.get(&q.user_id).cloned(),
            question: q,
        })
        .collect())
}

async fn find_question(st: &AppState, id: Uuid, context: &str) -> Result<Question, ApiError> {
    st.questions
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::internal(context, e))?
        .ok_or_else(|| ApiError::not_found("Question not found"))
}

pub async fn create_question(
    st: &AppState,
    caller: &AuthUser,
    req: CreateQuestionRequest,
) -> Result<Question, ApiError> {
    let text = non_blank(req.question, "Question text is required.")?;
    let tag = non_blank(req.tag, "Tag is required.")?;
    let q = st
        .questions
        .create(caller.user_id, &text, &tag)
        .await
        .map_err(|e| ApiError::internal("Error adding question", e))?;
    info!(question_id = %q.id, user_id = %caller.user_id, tag = %q.tag, "question submitted for approval");
    Ok(q)
}

pub async fn list_approved(st: &AppState, include_author: bool) -> Result<Vec<QuestionView>, ApiError> {
    let rows = st
        .questions
        .list_by_approval(true)
        .await
        .map_err(|e| ApiError::internal("Error fetching approved questions", e))?;
    into_views(st, rows, include_author).await
}

/// Every unapproved question in the system; admins only.
pub async fn list_pending(
    st: &AppState,
    caller: &AuthUser,
    include_author: bool,
) -> Result<Vec<QuestionView>, ApiError> {
    if !caller.is_admin() {
        warn!(user_id = %caller.user_id, "non-admin asked for the pending queue");
        return Err(ApiError::forbidden("Admin access required"));
    }
    let rows = st
        .questions
        .list_by_approval(false)
        .await
        .map_err(|e| ApiError::internal("Error fetching pending questions", e))?;
    into_views(st, rows, include_author).await
}

/// A user's own pending questions. An empty queue is reported as not found.
pub async fn list_pending_for_user(
    st: &AppState,
    caller: &AuthUser,
    user_id: Uuid,
    include_author: bool,
) -> Result<Vec<QuestionView>, ApiError> {
    if !caller.may_modify(user_id) {
        return Err(ApiError::forbidden("You can only view your own pending questions"));
    }
    let rows = st
        .questions
        .list_pending_by_user(user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch pending questions.", e))?;
    if rows.is_empty() {
        return Err(ApiError::not_found("No pending questions found."));
    }
    into_views(st, rows, include_author).await
}

pub async fn approve_question(
    st: &AppState,
    caller: &AuthUser,
    id: Uuid,
    approved: bool,
) -> Result<Question, ApiError> {
    if !caller.is_admin() {
        warn!(user_id = %caller.user_id, question_id = %id, "non-admin approval attempt");
        return Err(ApiError::forbidden("Admin access required"));
    }
    let q = st
        .questions
        .set_approved(id, approved)
        .await
        .map_err(|e| ApiError::internal("Error approving question", e))?
        .ok_or_else(|| ApiError::not_found("Question not found"))?;
    info!(question_id = %id, approved, admin_id = %caller.user_id, "question moderated");
    Ok(q)
}

pub async fn update_question(
    st: &AppState,
    caller: &AuthUser,
    id: Uuid,
    text: Option<String>,
) -> Result<Question, ApiError> {
    let text = non_blank(text, "Question text is required.")?;
    let existing = find_question(st, id, "Server error.").await?;
    if !caller.may_modify(existing.user_id) {
        warn!(user_id = %caller.user_id, question_id = %id, "edit of foreign question rejected");
        return Err(ApiError::forbidden("You can only edit your own questions"));
    }
    let q = st
        .questions
        .update_text(id, &text)
        .await
        .map_err(|e| ApiError::internal("Server error.", e))?
        .ok_or_else(|| ApiError::not_found("Question not found."))?;
    info!(question_id = %id, user_id = %caller.user_id, "question updated");
    Ok(q)
}

pub async fn delete_question(st: &AppState, caller: &AuthUser, id: Uuid) -> Result<(), ApiError> {
    let existing = find_question(st, id, "Error deleting question").await?;
    if !caller.may_modify(existing.user_id) {
        warn!(user_id = %caller.user_id, question_id = %id, "delete of foreign question rejected");
        return Err(ApiError::forbidden("You can only delete your own questions"));
    }
    let deleted = st
        .questions
        .delete(id)
        .await
        .map_err(|e| ApiError::internal("Error deleting question", e))?;
    if !deleted {
        return Err(ApiError::not_found("Question not found"));
    }
    info!(question_id = %id, user_id = %caller.user_id, "question deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use axum::http::StatusCode;

    fn user() -> AuthUser {
        AuthUser { user_id: Uuid::new_v4(), role: Role::User }
    }

    fn admin() -> AuthUser {
        AuthUser { user_id: Uuid::new_v4(), role: Role::Admin }
    }

    fn ask(text: &str, tag: &str) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question: Some(text.into()),
            tag: Some(tag.into()),
        }
    }

    #[tokio::test]
    async fn new_question_is_pending_and_hidden_from_feed() {
        let st = AppState::fake();
        let a = user();
        let q = create_question(&st, &a, ask("What is 2+2?", "math")).await.unwrap();
        assert!(!q.is_approved);
        assert_eq!(q.user_id, a.user_id);
        assert!(list_approved(&st, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_requires_text_and_tag() {
        let st = AppState::fake();
        let err = create_question(&st, &user(), ask("   ", "math")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let err = create_question(&st, &user(), ask("why?", "")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn text_is_stored_exactly_as_sent() {
        let st = AppState::fake();
        let a = user();
        let q = create_question(&st, &a, ask("  indented?\n", " rust ")).await.unwrap();
        assert_eq!(q.question, "  indented?\n");
        assert_eq!(q.tag, " rust ");

        let q = update_question(&st, &a, q.id, Some("  spaced  ".into())).await.unwrap();
        assert_eq!(q.question, "  spaced  ");
        let err = update_question(&st, &a, q.id, Some("\t ".into())).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn approval_moves_question_between_lists() {
        let st = AppState::fake();
        let a = user();
        let q = create_question(&st, &a, ask("Is P = NP?", "cs")).await.unwrap();

        let pending = list_pending_for_user(&st, &a, a.user_id, false).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].question.id, q.id);

        let approved = approve_question(&st, &admin(), q.id, true).await.unwrap();
        assert!(approved.is_approved);

        let err = list_pending_for_user(&st, &a, a.user_id, false).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let feed = list_approved(&st, false).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].question.id, q.id);
    }

    #[tokio::test]
    async fn rejecting_keeps_question_out_of_feed() {
        let st = AppState::fake();
        let q = create_question(&st, &user(), ask("spam", "misc")).await.unwrap();
        let q = approve_question(&st, &admin(), q.id, false).await.unwrap();
        assert!(!q.is_approved);
        assert!(list_approved(&st, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn moderation_is_admin_only() {
        let st = AppState::fake();
        let a = user();
        let q = create_question(&st, &a, ask("q", "t")).await.unwrap();
        let err = approve_question(&st, &a, q.id, true).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let err = list_pending(&st, &a, false).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(list_pending(&st, &admin(), false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn approve_unknown_is_not_found() {
        let st = AppState::fake();
        let err = approve_question(&st, &admin(), Uuid::new_v4(), true).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn other_users_pending_queue_is_private() {
        let st = AppState::fake();
        let a = user();
        create_question(&st, &a, ask("q", "t")).await.unwrap();
        let err = list_pending_for_user(&st, &user(), a.user_id, false).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            list_pending_for_user(&st, &admin(), a.user_id, false).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn update_and_delete_are_owner_or_admin() {
        let st = AppState::fake();
        let a = user();
        let q = create_question(&st, &a, ask("old", "t")).await.unwrap();

        let err = update_question(&st, &user(), q.id, Some("hijack".into())).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let updated = update_question(&st, &a, q.id, Some("new".into())).await.unwrap();
        assert_eq!(updated.question, "new");

        let err = update_question(&st, &a, q.id, Some("".into())).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = delete_question(&st, &user(), q.id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        delete_question(&st, &admin(), q.id).await.unwrap();
        let err = delete_question(&st, &a, q.id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(st.questions.find_by_id(q.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_unknown_is_not_found() {
        let st = AppState::fake();
        let err = update_question(&st, &user(), Uuid::new_v4(), Some("x".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
