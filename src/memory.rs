//! In-memory implementation of the three stores, used by the test suite and
//! when the server starts without `DATABASE_URL`.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
    comments::{repo::CommentRepo, repo_types::Comment},
    questions::{repo::QuestionRepo, repo_types::Question},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    questions: Vec<Question>,
    comments: Vec<Comment>,
}

/// Rows are kept in insertion order; listings walk them newest first.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(rows: impl DoubleEndedIterator<Item = T>) -> Vec<T> {
    rows.rev().collect()
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.inner.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let t = self.inner.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<User>> {
        let t = self.inner.read().await;
        Ok(t.users.iter().filter(|u| ids.contains(&u.id)).cloned().collect())
    }

    async fn create(&self, user: NewUser<'_>) -> anyhow::Result<User> {
        let mut t = self.inner.write().await;
        if t.users.iter().any(|u| u.email == user.email) {
            anyhow::bail!("duplicate key value violates unique constraint \"users_email_idx\"");
        }
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: Uuid::new_v4(),
            name: user.name.to_string(),
            email: user.email.to_string(),
            password_hash: user.password_hash.to_string(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        t.users.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl QuestionRepo for MemoryStore {
    async fn create(&self, user_id: Uuid, question: &str, tag: &str) -> anyhow::Result<Question> {
        let now = OffsetDateTime::now_utc();
        let row = Question {
            id: Uuid::new_v4(),
            user_id,
            question: question.to_string(),
            tag: tag.to_string(),
            is_approved: false,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.questions.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Question>> {
        let t = self.inner.read().await;
        Ok(t.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn list_by_approval(&self, approved: bool) -> anyhow::Result<Vec<Question>> {
        let t = self.inner.read().await;
        Ok(newest_first(
            t.questions.iter().filter(|q| q.is_approved == approved).cloned(),
        ))
    }

    async fn list_pending_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Question>> {
        let t = self.inner.read().await;
        Ok(newest_first(
            t.questions
                .iter()
                .filter(|q| q.user_id == user_id && !q.is_approved)
                .cloned(),
        ))
    }

    async fn set_approved(&self, id: Uuid, approved: bool) -> anyhow::Result<Option<Question>> {
        let mut t = self.inner.write().await;
        Ok(t.questions.iter_mut().find(|q| q.id == id).map(|q| {
            q.is_approved = approved;
            q.updated_at = OffsetDateTime::now_utc();
            q.clone()
        }))
    }

    async fn update_text(&self, id: Uuid, question: &str) -> anyhow::Result<Option<Question>> {
        let mut t = self.inner.write().await;
        Ok(t.questions.iter_mut().find(|q| q.id == id).map(|q| {
            q.question = question.to_string();
            q.updated_at = OffsetDateTime::now_utc();
            q.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.inner.write().await;
        let before = t.questions.len();
        t.questions.retain(|q| q.id != id);
        if t.questions.len() == before {
            return Ok(false);
        }
        t.comments.retain(|c| c.question_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CommentRepo for MemoryStore {
    async fn create(&self, user_id: Uuid, question_id: Uuid, content: &str) -> anyhow::Result<Comment> {
        let now = OffsetDateTime::now_utc();
        let row = Comment {
            id: Uuid::new_v4(),
            user_id,
            question_id,
            content: content.to_string(),
            likes: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.comments.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let t = self.inner.read().await;
        Ok(t.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn update_content(&self, id: Uuid, content: &str) -> anyhow::Result<Option<Comment>> {
        let mut t = self.inner.write().await;
        Ok(t.comments.iter_mut().find(|c| c.id == id).map(|c| {
            c.content = content.to_string();
            c.updated_at = OffsetDateTime::now_utc();
            c.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.inner.write().await;
        let before = t.comments.len();
        t.comments.retain(|c| c.id != id);
        Ok(t.comments.len() != before)
    }

    async fn list_by_question(&self, question_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let t = self.inner.read().await;
        Ok(newest_first(
            t.comments.iter().filter(|c| c.question_id == question_id).cloned(),
        ))
    }
}
