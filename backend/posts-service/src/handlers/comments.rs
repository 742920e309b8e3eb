/// Comment handlers - HTTP endpoints for comment operations
use super::{post_url, redirect, AppState};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::validation::CommentForm;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// Add a comment and return to the post.
///
/// An invalid comment is dropped without feedback; the redirect is the same.
pub async fn add_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();

    match state.comments().add_comment(user.id, post_id, &form).await {
        Ok(_) => {}
        Err(AppError::Validation(errors)) => {
            tracing::debug!(%post_id, author = %user.id, %errors, "discarding invalid comment");
        }
        Err(err) => return Err(err),
    }

    Ok(redirect(&post_url(post_id)))
}
