/// Database access layer
///
/// Repository traits return plain records; callers ask for related entities
/// explicitly (`PostCard`, `CommentCard`) instead of relying on lazy loads.
///
/// - `PgStore`: PostgreSQL implementation (one file per entity)
/// - `MemoryStore`: in-process implementation with the same semantics
use crate::error::Result;
use crate::models::{
    Comment, CommentCard, Group, NewComment, NewGroup, NewPost, Post, PostCard, PostFilter, User,
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub mod comment_repo;
pub mod group_repo;
pub mod memory;
pub mod post_repo;
pub mod user_repo;

pub use memory::MemoryStore;

/// Read access to the externally managed user identities.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Insert a group. A taken slug is reported as `AppError::Conflict`.
    async fn create_group(&self, group: NewGroup) -> Result<Group>;

    async fn find_group_by_id(&self, id: Uuid) -> Result<Option<Group>>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// All groups ordered by title.
    async fn list_groups(&self) -> Result<Vec<Group>>;

    /// Delete a group; posts that referenced it lose their group.
    async fn delete_group(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post stamped with the current time. A group that vanished
    /// since validation is reported as a validation error on `group`.
    async fn create_post(&self, post: NewPost) -> Result<Post>;

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;

    async fn find_post_card(&self, id: Uuid) -> Result<Option<PostCard>>;

    /// Replace text and group of a post owned by `author_id`.
    /// Returns `None` when no such post is owned by that author.
    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        text: &str,
        group_id: Option<Uuid>,
    ) -> Result<Option<Post>>;

    /// Delete a post owned by `author_id` together with its comments.
    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> Result<bool>;

    async fn count_posts(&self, filter: PostFilter) -> Result<usize>;

    /// Posts newest-first. `limit = None` returns everything after `offset`.
    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<PostCard>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment stamped with the current time. A post that vanished
    /// since it was loaded is reported as `AppError::NotFound`.
    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;

    /// Comments of one post, oldest first.
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentCard>>;

    async fn count_comments(&self, post_id: Uuid) -> Result<usize>;
}

/// Everything the services need from persistence.
pub trait Store: UserRepository + GroupRepository + PostRepository + CommentRepository {}

impl<T> Store for T where T: UserRepository + GroupRepository + PostRepository + CommentRepository {}

/// PostgreSQL-backed store. Each write is a single statement or transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations completed successfully");
        Ok(())
    }
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23503")
        .unwrap_or(false)
}

pub(crate) fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
