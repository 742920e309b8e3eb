use super::{is_foreign_key_violation, CommentRepository, PgStore};
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentCard, NewComment};
use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

#[async_trait]
impl CommentRepository for PgStore {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, post_id, author_id, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, author_id, text, created
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if !is_foreign_key_violation(&err) {
                return AppError::from(err);
            }
            let constraint = err
                .as_database_error()
                .and_then(|db| db.constraint())
                .unwrap_or_default();
            if constraint == "comments_post_id_fkey" {
                AppError::not_found(format!("post {}", comment.post_id))
            } else {
                AppError::not_found(format!("user {}", comment.author_id))
            }
        })?;

        tx.commit().await?;

        Ok(created)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentCard>> {
        let comments = sqlx::query_as::<_, CommentCard>(
            r#"
            SELECT c.id, c.post_id, c.author_id, c.text, c.created,
                   u.username AS author_username
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn count_comments(&self, post_id: Uuid) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.get("count");
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
