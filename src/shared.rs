//! Response pieces shared by the question and comment endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{auth::repo_types::User, error::ApiError, state::AppState};

/// `{ success, message }` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// User-written text is stored as sent; only missing or all-blank text is
/// rejected.
pub fn non_blank(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::validation(message))
}

/// `?include=author` on list endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct IncludeQuery {
    #[serde(default)]
    pub include: Option<String>,
}

impl IncludeQuery {
    pub fn author(&self) -> bool {
        self.include
            .as_deref()
            .map(|v| v.split(',').any(|part| part.trim() == "author"))
            .unwrap_or(false)
    }
}

/// The expanded owner of a question or comment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for AuthorSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        }
    }
}

/// Looks up the authors for `ids` in one store call.
pub async fn load_authors(
    st: &AppState,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, AuthorSummary>, ApiError> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    let users = st
        .users
        .find_many(&ids)
        .await
        .map_err(|e| ApiError::internal("Error loading authors", e))?;
    Ok(users.iter().map(|u| (u.id, AuthorSummary::from(u))).collect())
}
