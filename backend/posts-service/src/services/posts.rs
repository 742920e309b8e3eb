/// Post service - publishing, author-only edits, and listings
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::check_post_ownership;
use crate::models::{CommentCard, Group, NewPost, Post, PostCard, PostFilter, User};
use crate::pagination::{Page, Paginator};
use crate::validation::{unknown_group, CleanPost, PostForm};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::ValidationErrors;

/// Everything the post detail page shows.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostCard,
    /// Oldest first
    pub comments: Vec<CommentCard>,
    pub comment_count: usize,
}

/// An author's posts, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorListing {
    pub author: User,
    pub posts: Vec<PostCard>,
    pub count: usize,
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn Store>,
}

impl PostService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Publish a post for `author_id`.
    pub async fn create_post(&self, author_id: Uuid, form: &PostForm) -> Result<Post> {
        let clean = self.clean(form).await?;

        let post = self
            .store
            .create_post(NewPost {
                author_id,
                text: clean.text,
                group_id: clean.group_id,
            })
            .await?;

        metrics::POSTS_CREATED_TOTAL.inc();
        tracing::info!(
            post_id = %post.id,
            author = %author_id,
            group = ?post.group_id,
            "post created"
        );

        Ok(post)
    }

    /// Replace text and group of a post. Only its author may do this.
    ///
    /// Checks run in order: the post must exist, the requester must be the
    /// author, then the form must validate.
    pub async fn edit_post(
        &self,
        requester_id: Uuid,
        post_id: Uuid,
        form: &PostForm,
    ) -> Result<Post> {
        let result = self.try_edit(requester_id, post_id, form).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(AppError::NotFound(_)) => "not_found",
            Err(AppError::Forbidden(_)) => "forbidden",
            Err(AppError::Validation(_)) => "invalid",
            Err(_) => "error",
        };
        metrics::record_edit(outcome);

        result
    }

    async fn try_edit(&self, requester_id: Uuid, post_id: Uuid, form: &PostForm) -> Result<Post> {
        let post = self.require_post(post_id).await?;

        if let Err(err) = check_post_ownership(requester_id, &post) {
            tracing::warn!(%post_id, requester = %requester_id, "edit rejected: not the author");
            return Err(err);
        }

        let clean = self.clean(form).await?;

        // Ownership is enforced again by the store's guarded update.
        let updated = self
            .store
            .update_post(post_id, requester_id, &clean.text, clean.group_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {post_id}")))?;

        tracing::info!(
            post_id = %updated.id,
            author = %updated.author_id,
            group = ?updated.group_id,
            "post edited"
        );

        Ok(updated)
    }

    /// Delete a post and its comments. Only its author may do this.
    pub async fn delete_post(&self, requester_id: Uuid, post_id: Uuid) -> Result<()> {
        let post = self.require_post(post_id).await?;
        check_post_ownership(requester_id, &post)?;

        if !self.store.delete_post(post_id, requester_id).await? {
            return Err(AppError::not_found(format!("post {post_id}")));
        }

        tracing::info!(%post_id, author = %requester_id, "post deleted");
        Ok(())
    }

    pub async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        self.store.find_post(post_id).await
    }

    /// Post card with its comments, for the detail page.
    pub async fn get_post(&self, post_id: Uuid) -> Result<PostDetail> {
        let post = self
            .store
            .find_post_card(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {post_id}")))?;
        let comments = self.store.list_comments(post_id).await?;
        let comment_count = comments.len();

        Ok(PostDetail {
            post,
            comments,
            comment_count,
        })
    }

    /// Group and all of its posts, newest first.
    pub async fn list_by_group(&self, slug: &str) -> Result<(Group, Vec<PostCard>)> {
        let group = self.require_group(slug).await?;
        let posts = self
            .store
            .list_posts(PostFilter::Group(group.id), None, 0)
            .await?;
        Ok((group, posts))
    }

    /// Author and all of their posts, newest first.
    pub async fn list_by_author(&self, username: &str) -> Result<AuthorListing> {
        let author = self.require_author(username).await?;
        let posts = self
            .store
            .list_posts(PostFilter::Author(author.id), None, 0)
            .await?;
        let count = posts.len();

        Ok(AuthorListing {
            author,
            posts,
            count,
        })
    }

    /// One page of the global feed.
    pub async fn feed_page(&self, page: Option<&str>, per_page: usize) -> Result<Page<PostCard>> {
        self.paged(PostFilter::All, page, per_page).await
    }

    /// Group and one page of its posts.
    pub async fn group_page(
        &self,
        slug: &str,
        page: Option<&str>,
        per_page: usize,
    ) -> Result<(Group, Page<PostCard>)> {
        let group = self.require_group(slug).await?;
        let posts = self.paged(PostFilter::Group(group.id), page, per_page).await?;
        Ok((group, posts))
    }

    /// Author and one page of their posts. `Page::count` is the author's total.
    pub async fn author_page(
        &self,
        username: &str,
        page: Option<&str>,
        per_page: usize,
    ) -> Result<(User, Page<PostCard>)> {
        let author = self.require_author(username).await?;
        let posts = self
            .paged(PostFilter::Author(author.id), page, per_page)
            .await?;
        Ok((author, posts))
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        self.store.list_groups().await
    }

    async fn paged(
        &self,
        filter: PostFilter,
        page: Option<&str>,
        per_page: usize,
    ) -> Result<Page<PostCard>> {
        let paginator = Paginator::new(self.store.count_posts(filter).await?, per_page);
        let window = paginator.window(page);
        let items = self
            .store
            .list_posts(filter, Some(window.limit), window.offset)
            .await?;

        tracing::debug!(
            ?filter,
            page = window.number,
            num_pages = window.num_pages,
            "listing page served"
        );
        Ok(paginator.page(window, items))
    }

    /// Form checks plus the group lookup they cannot do on their own.
    async fn clean(&self, form: &PostForm) -> Result<CleanPost> {
        let clean = form.clean().map_err(|errors| {
            tracing::debug!(%errors, "post form rejected");
            AppError::Validation(errors)
        })?;

        if let Some(group_id) = clean.group_id {
            if self.store.find_group_by_id(group_id).await?.is_none() {
                tracing::debug!(%group_id, "post form names unknown group");
                let mut errors = ValidationErrors::new();
                errors.add("group", unknown_group());
                return Err(AppError::Validation(errors));
            }
        }

        Ok(clean)
    }

    async fn require_post(&self, post_id: Uuid) -> Result<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {post_id}")))
    }

    async fn require_group(&self, slug: &str) -> Result<Group> {
        self.store
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found(format!("group '{slug}'")))
    }

    async fn require_author(&self, username: &str) -> Result<User> {
        self.store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user '{username}'")))
    }
}
