use serde::{Deserialize, Serialize};

use super::repo_types::Question;
use crate::shared::AuthorSummary;

/// POST /questions body: `{ "Question": "...", "tag": "..." }`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateQuestionRequest {
    #[serde(rename = "Question", alias = "question", default)]
    pub question: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

/// PUT /questions/update/:questionId body.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateQuestionRequest {
    #[serde(rename = "Question", alias = "question", default)]
    pub question: Option<String>,
}

/// PATCH /questions/approve/:id body. A missing flag approves.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ApproveRequest {
    #[serde(rename = "isApproved", default)]
    pub is_approved: Option<bool>,
}

/// A question as listed, optionally with its owner expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionView {
    #[serde(flatten)]
    pub question: Question,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorSummary>,
}

impl From<Question> for QuestionView {
    fn from(question: Question) -> Self {
        Self {
            question,
            author: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedQuestionResponse {
    pub success: bool,
    pub message: String,
    pub data: Question,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveResponse {
    pub message: String,
    pub question: Question,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedQuestionResponse {
    pub success: bool,
    pub message: String,
    pub question: Question,
}
