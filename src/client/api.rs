//! HTTP access to the forum API.
//!
//! Views talk to the server through [`ForumApi`] so they can be driven by a
//! fake in tests; [`HttpForumClient`] is the reqwest implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::auth::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::comments::{
    dto::{CommentListResponse, CommentResponse, CommentView},
    repo_types::Comment,
};
use crate::questions::{
    dto::{ApproveResponse, CreatedQuestionResponse, QuestionView, UpdatedQuestionResponse},
    repo_types::Question,
};
use crate::shared::MessageResponse;

/// Default base URL, including the `/api` prefix.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    NotAllowed(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }
}

#[async_trait]
pub trait ForumApi: Send + Sync {
    async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, ClientError>;
    /// A wrong password is a successful call with `success == false`.
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ClientError>;

    async fn approved_questions(&self) -> Result<Vec<QuestionView>, ClientError>;
    async fn pending_questions(&self, token: &str) -> Result<Vec<QuestionView>, ClientError>;
    async fn user_pending_questions(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> Result<Vec<QuestionView>, ClientError>;
    async fn create_question(
        &self,
        token: &str,
        question: &str,
        tag: &str,
    ) -> Result<Question, ClientError>;
    async fn update_question(
        &self,
        token: &str,
        id: Uuid,
        question: &str,
    ) -> Result<Question, ClientError>;
    async fn delete_question(&self, token: &str, id: Uuid) -> Result<String, ClientError>;
    async fn approve_question(
        &self,
        token: &str,
        id: Uuid,
        approved: bool,
    ) -> Result<Question, ClientError>;

    async fn comments(&self, question_id: Uuid) -> Result<Vec<CommentView>, ClientError>;
    async fn create_comment(
        &self,
        token: &str,
        question_id: Uuid,
        content: &str,
    ) -> Result<Comment, ClientError>;
    async fn update_comment(
        &self,
        token: &str,
        id: Uuid,
        content: &str,
    ) -> Result<Comment, ClientError>;
    async fn delete_comment(&self, token: &str, id: Uuid) -> Result<String, ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpForumClient {
    client: Client,
    base_url: String,
}

impl HttpForumClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request; non-2xx responses become [`ClientError::Api`]
    /// carrying the server's `message`.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let res = req.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res.json::<T>().await?);
        }
        let message = res
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| status.to_string());
        debug!(status = status.as_u16(), %message, "api error");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl Default for HttpForumClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[async_trait]
impl ForumApi for HttpForumClient {
    #[instrument(skip_all)]
    async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
        self.send(self.client.post(self.url("/auth/register")).json(req))
            .await
    }

    #[instrument(skip_all)]
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ClientError> {
        self.send(self.client.post(self.url("/auth/login")).json(req))
            .await
    }

    async fn approved_questions(&self) -> Result<Vec<QuestionView>, ClientError> {
        self.send(
            self.client
                .get(self.url("/questions"))
                .query(&[("include", "author")]),
        )
        .await
    }

    async fn pending_questions(&self, token: &str) -> Result<Vec<QuestionView>, ClientError> {
        self.send(
            self.client
                .get(self.url("/questions/pending"))
                .query(&[("include", "author")])
                .bearer_auth(token),
        )
        .await
    }

    async fn user_pending_questions(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> Result<Vec<QuestionView>, ClientError> {
        self.send(
            self.client
                .get(self.url(&format!("/questions/pending/{user_id}")))
                .query(&[("include", "author")])
                .bearer_auth(token),
        )
        .await
    }

    async fn create_question(
        &self,
        token: &str,
        question: &str,
        tag: &str,
    ) -> Result<Question, ClientError> {
        let res: CreatedQuestionResponse = self
            .send(
                self.client
                    .post(self.url("/questions"))
                    .bearer_auth(token)
                    .json(&json!({ "Question": question, "tag": tag })),
            )
            .await?;
        Ok(res.data)
    }

    async fn update_question(
        &self,
        token: &str,
        id: Uuid,
        question: &str,
    ) -> Result<Question, ClientError> {
        let res: UpdatedQuestionResponse = self
            .send(
                self.client
                    .put(self.url(&format!("/questions/update/{id}")))
                    .bearer_auth(token)
                    .json(&json!({ "Question": question })),
            )
            .await?;
        Ok(res.question)
    }

    async fn delete_question(&self, token: &str, id: Uuid) -> Result<String, ClientError> {
        let res: MessageResponse = self
            .send(
                self.client
                    .delete(self.url(&format!("/questions/{id}")))
                    .bearer_auth(token),
            )
            .await?;
        Ok(res.message)
    }

    async fn approve_question(
        &self,
        token: &str,
        id: Uuid,
        approved: bool,
    ) -> Result<Question, ClientError> {
        let res: ApproveResponse = self
            .send(
                self.client
                    .patch(self.url(&format!("/questions/approve/{id}")))
                    .bearer_auth(token)
                    .json(&json!({ "isApproved": approved })),
            )
            .await?;
        Ok(res.question)
    }

    async fn comments(&self, question_id: Uuid) -> Result<Vec<CommentView>, ClientError> {
        let res: CommentListResponse = self
            .send(
                self.client
                    .get(self.url(&format!("/questions/comments/{question_id}")))
                    .query(&[("include", "author")]),
            )
            .await?;
        Ok(res.comments)
    }

    async fn create_comment(
        &self,
        token: &str,
        question_id: Uuid,
        content: &str,
    ) -> Result<Comment, ClientError> {
        let res: CommentResponse = self
            .send(
                self.client
                    .post(self.url("/questions/createComment"))
                    .bearer_auth(token)
                    .json(&json!({ "questionId": question_id, "content": content })),
            )
            .await?;
        Ok(res.comment)
    }

    async fn update_comment(
        &self,
        token: &str,
        id: Uuid,
        content: &str,
    ) -> Result<Comment, ClientError> {
        let res: CommentResponse = self
            .send(
                self.client
                    .put(self.url(&format!("/questions/updateComment/{id}")))
                    .bearer_auth(token)
                    .json(&json!({ "content": content })),
            )
            .await?;
        Ok(res.comment)
    }

    async fn delete_comment(&self, token: &str, id: Uuid) -> Result<String, ClientError> {
        let res: MessageResponse = self
            .send(
                self.client
                    .delete(self.url(&format!("/questions/deleteComment/{id}")))
                    .bearer_auth(token),
            )
            .await?;
        Ok(res.message)
    }
}
