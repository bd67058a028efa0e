use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Comment;

/// Comment store.
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn create(&self, user_id: Uuid, question_id: Uuid, content: &str) -> anyhow::Result<Comment>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    async fn update_content(&self, id: Uuid, content: &str) -> anyhow::Result<Option<Comment>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Comments on a question, newest first.
    async fn list_by_question(&self, question_id: Uuid) -> anyhow::Result<Vec<Comment>>;
}

#[derive(Clone)]
pub struct PgCommentRepo {
    db: PgPool,
}

impl PgCommentRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepo for PgCommentRepo {
    async fn create(&self, user_id: Uuid, question_id: Uuid, content: &str) -> anyhow::Result<Comment> {
        let row = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (user_id, question_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, question_id, content, likes, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .bind(content)
        .fetch_one(&self.db)
        .await
        .context("insert comment")?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, user_id, question_id, content, likes, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get comment")?;
        Ok(row)
    }

    async fn update_content(&self, id: Uuid, content: &str) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
               SET content = $2, updated_at = now()
             WHERE id = $1
            RETURNING id, user_id, question_id, content, likes, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.db)
        .await
        .context("update comment")?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete comment")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_by_question(&self, question_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, user_id, question_id, content, likes, created_at, updated_at
            FROM comments
            WHERE question_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.db)
        .await
        .context("list comments by question")?;
        Ok(rows)
    }
}
