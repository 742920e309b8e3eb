//! In-process store with the same semantics as the PostgreSQL schema.
//!
//! Every operation holds the lock for its whole duration, so writes are
//! atomic and readers never see a partially applied change.

use super::{CommentRepository, GroupRepository, PostRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentCard, Group, NewComment, NewGroup, NewPost, Post, PostCard, PostFilter, User,
};
use crate::validation::unknown_group;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;
use validator::ValidationErrors;

#[derive(Default)]
struct State {
    users: Vec<User>,
    groups: Vec<Group>,
    /// Insertion order; listings walk it backwards.
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user identity, standing in for the external auth subsystem.
    /// Returns the existing user when the username is already known.
    pub fn insert_user(&self, username: &str) -> Result<User> {
        let mut state = self.write()?;
        if let Some(user) = state.users.iter().find(|u| u.username == username) {
            return Ok(user.clone());
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    /// Remove a user together with their posts and comments.
    pub fn delete_user(&self, id: Uuid) -> Result<bool> {
        let mut state = self.write()?;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Ok(false);
        }

        let removed_posts: Vec<Uuid> = state
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        state.posts.retain(|p| p.author_id != id);
        state
            .comments
            .retain(|c| c.author_id != id && !removed_posts.contains(&c.post_id));
        Ok(true)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }
}

impl State {
    fn card(&self, post: &Post) -> PostCard {
        let author_username = self
            .users
            .iter()
            .find(|u| u.id == post.author_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        let group = post
            .group_id
            .and_then(|gid| self.groups.iter().find(|g| g.id == gid));

        PostCard {
            post: post.clone(),
            author_username,
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
        }
    }

    /// Posts matching `filter`, newest first; ties keep the later insert first.
    fn matching(&self, filter: PostFilter) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .iter()
            .rev()
            .filter(|p| match filter {
                PostFilter::All => true,
                PostFilter::Group(group_id) => p.group_id == Some(group_id),
                PostFilter::Author(author_id) => p.author_id == author_id,
            })
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
        posts
    }

    fn group_exists(&self, group_id: Option<Uuid>) -> bool {
        group_id.map_or(true, |gid| self.groups.iter().any(|g| g.id == gid))
    }
}

fn unknown_group_error() -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add("group", unknown_group());
    AppError::Validation(errors)
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut state = self.write()?;
        if state.groups.iter().any(|g| g.slug == group.slug) {
            return Err(AppError::Conflict(format!(
                "group slug '{}' is already taken",
                group.slug
            )));
        }

        let created = Group {
            id: Uuid::new_v4(),
            title: group.title,
            description: group.description,
            slug: group.slug,
        };
        state.groups.push(created.clone());
        Ok(created)
    }

    async fn find_group_by_id(&self, id: Uuid) -> Result<Option<Group>> {
        Ok(self.read()?.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        Ok(self.read()?.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let mut groups = self.read()?.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.slug.cmp(&b.slug)));
        Ok(groups)
    }

    async fn delete_group(&self, id: Uuid) -> Result<bool> {
        let mut state = self.write()?;
        let before = state.groups.len();
        state.groups.retain(|g| g.id != id);
        if state.groups.len() == before {
            return Ok(false);
        }

        for post in state.posts.iter_mut().filter(|p| p.group_id == Some(id)) {
            post.group_id = None;
        }
        Ok(true)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut state = self.write()?;
        if !state.users.iter().any(|u| u.id == post.author_id) {
            return Err(AppError::not_found(format!("user {}", post.author_id)));
        }
        if !state.group_exists(post.group_id) {
            return Err(unknown_group_error());
        }

        let created = Post {
            id: Uuid::new_v4(),
            text: post.text,
            pub_date: Utc::now(),
            author_id: post.author_id,
            group_id: post.group_id,
        };
        state.posts.push(created.clone());
        Ok(created)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.read()?.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_post_card(&self, id: Uuid) -> Result<Option<PostCard>> {
        let state = self.read()?;
        Ok(state
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| state.card(p)))
    }

    async fn update_post(
        &self,
        id: Uuid,
        author_id: Uuid,
        text: &str,
        group_id: Option<Uuid>,
    ) -> Result<Option<Post>> {
        let mut state = self.write()?;
        if !state.group_exists(group_id) {
            return Err(unknown_group_error());
        }

        let Some(post) = state
            .posts
            .iter_mut()
            .find(|p| p.id == id && p.author_id == author_id)
        else {
            return Ok(None);
        };

        post.text = text.to_string();
        post.group_id = group_id;
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> Result<bool> {
        let mut state = self.write()?;
        let before = state.posts.len();
        state
            .posts
            .retain(|p| !(p.id == id && p.author_id == author_id));
        if state.posts.len() == before {
            return Ok(false);
        }

        state.comments.retain(|c| c.post_id != id);
        Ok(true)
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<usize> {
        Ok(self.read()?.matching(filter).len())
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<PostCard>> {
        let state = self.read()?;
        Ok(state
            .matching(filter)
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .map(|p| state.card(p))
            .collect())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut state = self.write()?;
        if !state.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(AppError::not_found(format!("post {}", comment.post_id)));
        }
        if !state.users.iter().any(|u| u.id == comment.author_id) {
            return Err(AppError::not_found(format!("user {}", comment.author_id)));
        }

        let created = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created: Utc::now(),
        };
        state.comments.push(created.clone());
        Ok(created)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentCard>> {
        let state = self.read()?;
        let mut comments: Vec<CommentCard> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| CommentCard {
                comment: c.clone(),
                author_username: state
                    .users
                    .iter()
                    .find(|u| u.id == c.author_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
            })
            .collect();
        // stable: equal timestamps keep insertion order
        comments.sort_by(|a, b| a.comment.created.cmp(&b.comment.created));
        Ok(comments)
    }

    async fn count_comments(&self, post_id: Uuid) -> Result<usize> {
        Ok(self
            .read()?
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .count())
    }
}
