use super::{GroupRepository, PgStore};
use crate::error::{AppError, Result};
use crate::models::{Group, NewGroup};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
impl GroupRepository for PgStore {
    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let created = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (id, title, description, slug)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, slug
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&group.title)
        .bind(&group.description)
        .bind(&group.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match AppError::from(err) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("group slug '{}' is already taken", group.slug))
            }
            other => other,
        })?;

        Ok(created)
    }

    async fn find_group_by_id(&self, id: Uuid) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, description, slug FROM groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, description, slug FROM groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, description, slug FROM groups ORDER BY title ASC, slug ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn delete_group(&self, id: Uuid) -> Result<bool> {
        // posts.group_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
