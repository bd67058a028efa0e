use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Question;

/// Question store.
#[async_trait]
pub trait QuestionRepo: Send + Sync {
    async fn create(&self, user_id: Uuid, question: &str, tag: &str) -> anyhow::Result<Question>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Question>>;
    /// Questions with the given approval flag, newest first.
    async fn list_by_approval(&self, approved: bool) -> anyhow::Result<Vec<Question>>;
    /// Unapproved questions owned by `user_id`, newest first.
    async fn list_pending_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Question>>;
    async fn set_approved(&self, id: Uuid, approved: bool) -> anyhow::Result<Option<Question>>;
    async fn update_text(&self, id: Uuid, question: &str) -> anyhow::Result<Option<Question>>;
    /// Deletes the question and its comments. `false` if the id is unknown.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgQuestionRepo {
    db: PgPool,
}

impl PgQuestionRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QuestionRepo for PgQuestionRepo {
    async fn create(&self, user_id: Uuid, question: &str, tag: &str) -> anyhow::Result<Question> {
        let row = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (user_id, question, tag)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, question, tag, is_approved, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(question)
        .bind(tag)
        .fetch_one(&self.db)
        .await
        .context("insert question")?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Question>> {
        let row = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, user_id, question, tag, is_approved, created_at, updated_at
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get question")?;
        Ok(row)
    }

    async fn list_by_approval(&self, approved: bool) -> anyhow::Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, user_id, question, tag, is_approved, created_at, updated_at
            FROM questions
            WHERE is_approved = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(approved)
        .fetch_all(&self.db)
        .await
        .context("list questions by approval")?;
        Ok(rows)
    }

    async fn list_pending_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, user_id, question, tag, is_approved, created_at, updated_at
            FROM questions
            WHERE user_id = $1 AND is_approved = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list pending questions by user")?;
        Ok(rows)
    }

    async fn set_approved(&self, id: Uuid, approved: bool) -> anyhow::Result<Option<Question>> {
        let row = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
               SET is_approved = $2, updated_at = now()
             WHERE id = $1
            RETURNING id, user_id, question, tag, is_approved, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.db)
        .await
        .context("set question approval")?;
        Ok(row)
    }

    async fn update_text(&self, id: Uuid, question: &str) -> anyhow::Result<Option<Question>> {
        let row = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
               SET question = $2, updated_at = now()
             WHERE id = $1
            RETURNING id, user_id, question, tag, is_approved, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(question)
        .fetch_optional(&self.db)
        .await
        .context("update question text")?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        sqlx::query("DELETE FROM comments WHERE question_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete question comments")?;
        let res = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete question")?;
        tx.commit().await.context("commit tx")?;
        Ok(res.rows_affected() > 0)
    }
}
