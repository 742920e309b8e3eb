/// Group service - creating, listing and removing groups
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{Group, NewGroup};
use crate::validation::GroupForm;
use std::sync::Arc;

#[derive(Clone)]
pub struct GroupService {
    store: Arc<dyn Store>,
}

impl GroupService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a group. A slug already in use is a `Conflict`.
    pub async fn create_group(&self, form: &GroupForm) -> Result<Group> {
        let clean = form.clean()?;

        if self.store.find_group_by_slug(&clean.slug).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "group slug '{}' is already taken",
                clean.slug
            )));
        }

        // A concurrent insert of the same slug still fails on the unique index.
        let group = self
            .store
            .create_group(NewGroup {
                title: clean.title,
                description: clean.description,
                slug: clean.slug,
            })
            .await?;

        tracing::info!(group_id = %group.id, slug = %group.slug, "group created");
        Ok(group)
    }

    /// Delete a group by slug. Its posts stay, without a group.
    pub async fn delete_group(&self, slug: &str) -> Result<()> {
        let group = self
            .store
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found(format!("group '{slug}'")))?;

        if !self.store.delete_group(group.id).await? {
            return Err(AppError::not_found(format!("group '{slug}'")));
        }

        tracing::info!(group_id = %group.id, %slug, "group deleted");
        Ok(())
    }

    pub async fn get_group(&self, slug: &str) -> Result<Option<Group>> {
        self.store.find_group_by_slug(slug).await
    }

    /// All groups ordered by title.
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        self.store.list_groups().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn form(title: &str, slug: &str) -> GroupForm {
        GroupForm {
            title: title.into(),
            description: String::new(),
            slug: slug.into(),
        }
    }

    #[tokio::test]
    async fn groups_list_by_title() {
        let service = GroupService::new(Arc::new(MemoryStore::new()));
        service.create_group(&form("Dogs", "dogs")).await.unwrap();
        service.create_group(&form("Cats", "cats")).await.unwrap();

        let titles: Vec<String> = service
            .list_groups()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.to_string())
            .collect();
        assert_eq!(titles, vec!["Cats", "Dogs"]);
    }

    #[tokio::test]
    async fn deleting_unknown_group_is_not_found() {
        let service = GroupService::new(Arc::new(MemoryStore::new()));
        let err = service.delete_group("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn invalid_slug_is_rejected() {
        let service = GroupService::new(Arc::new(MemoryStore::new()));
        let err = service
            .create_group(&form("Cats", "no spaces"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
