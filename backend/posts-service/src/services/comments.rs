/// Comment service - append-only comments on posts
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{Comment, CommentCard, NewComment};
use crate::validation::CommentForm;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn Store>,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Attach a comment by `author_id` to a post.
    ///
    /// A missing post is reported before the text is looked at.
    pub async fn add_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        form: &CommentForm,
    ) -> Result<Comment> {
        let result = self.try_add(author_id, post_id, form).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(AppError::NotFound(_)) => "not_found",
            Err(AppError::Validation(_)) => "invalid",
            Err(_) => "error",
        };
        metrics::record_comment(outcome);

        result
    }

    async fn try_add(&self, author_id: Uuid, post_id: Uuid, form: &CommentForm) -> Result<Comment> {
        if self.store.find_post(post_id).await?.is_none() {
            return Err(AppError::not_found(format!("post {post_id}")));
        }

        let text = form.clean()?;

        // The store re-checks the post inside the insert.
        let comment = self
            .store
            .create_comment(NewComment {
                post_id,
                author_id,
                text,
            })
            .await?;

        tracing::info!(
            comment_id = %comment.id,
            %post_id,
            author = %author_id,
            "comment added"
        );

        Ok(comment)
    }

    /// Comments of a post, oldest first.
    pub async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<CommentCard>> {
        self.store.list_comments(post_id).await
    }

    pub async fn count_for_post(&self, post_id: Uuid) -> Result<usize> {
        self.store.count_comments(post_id).await
    }
}
