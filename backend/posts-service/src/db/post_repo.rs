use super::{is_foreign_key_violation, to_i64, PgStore, PostRepository};
use crate::error::{AppError, Result};
use crate::models::{NewPost, Post, PostCard, PostFilter};
use crate::validation::unknown_group;
use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;
use validator::ValidationErrors;

const POST_COLUMNS: &str = "id, text, pub_date, author_id, group_id";

const CARD_SELECT: &str = r#"
    SELECT p.id, p.text, p.pub_date, p.author_id, p.group_id,
           u.username AS author_username,
           g.slug AS group_slug,
           g.title AS group_title
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN groups g ON g.id = p.group_id
"#;

/// Bind values for the `WHERE` clause shared by count and list queries.
fn filter_binds(filter: PostFilter) -> (Option<Uuid>, Option<Uuid>) {
    match filter {
        PostFilter::All => (None, None),
        PostFilter::Group(group_id) => (Some(group_id), None),
        PostFilter::Author(author_id) => (None, Some(author_id)),
    }
}

/// A group or author deleted between validation and write surfaces as an FK
/// violation; name the one that vanished.
fn reference_vanished(err: sqlx::Error) -> AppError {
    if !is_foreign_key_violation(&err) {
        return AppError::from(err);
    }

    let constraint = err
        .as_database_error()
        .and_then(|db| db.constraint())
        .unwrap_or_default();
    if constraint == "posts_group_id_fkey" {
        let mut errors = ValidationErrors::new();
        errors.add("group", unknown_group());
        AppError::Validation(errors)
    } else {
        AppError::not_found("author")
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (id, text, author_id, group_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&post.text)
        .bind(post.author_id)
        .bind(post.group_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(reference_vanished)?;

        tx.commit().await?;

        Ok(created)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_post_card(&self, id: Uuid) -> Result<Option<PostCard>> {
        let card = sqlx::query_as::<_, PostCard>(&format!("{CARD_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(card)
    }

    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        text: &str,
        group_id: Option<Uuid>,
    ) -> Result<Option<Post>> {
        // Ownership is re-checked in the same statement that writes.
        let updated = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET text = $3, group_id = $4
            WHERE id = $1 AND author_id = $2
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(author_id)
        .bind(text)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(reference_vanished)?;

        Ok(updated)
    }

    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> Result<bool> {
        // comments.post_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<usize> {
        let (group_id, author_id) = filter_binds(filter);

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM posts
            WHERE ($1::uuid IS NULL OR group_id = $1)
              AND ($2::uuid IS NULL OR author_id = $2)
            "#,
        )
        .bind(group_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.get("count");
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<PostCard>> {
        let (group_id, author_id) = filter_binds(filter);

        let posts = sqlx::query_as::<_, PostCard>(&format!(
            r#"
            {CARD_SELECT}
            WHERE ($1::uuid IS NULL OR p.group_id = $1)
              AND ($2::uuid IS NULL OR p.author_id = $2)
            ORDER BY p.pub_date DESC, p.id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(group_id)
        .bind(author_id)
        .bind(limit.map(to_i64))
        .bind(to_i64(offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}
