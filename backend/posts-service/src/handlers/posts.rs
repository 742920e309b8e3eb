/// Post handlers - listings, detail, and the post form
use super::{post_url, profile_url, redirect, AppState, PageQuery};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{CommentCard, Group, PostCard, User};
use crate::pagination::Page;
use crate::validation::{CommentForm, PostForm};
use actix_web::{web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;
use validator::ValidationErrors;

#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub page_obj: Page<PostCard>,
}

#[derive(Debug, Serialize)]
pub struct GroupContext {
    pub group: Group,
    pub page_obj: Page<PostCard>,
}

#[derive(Debug, Serialize)]
pub struct ProfileContext {
    pub author: User,
    pub page_obj: Page<PostCard>,
    pub posts_count: usize,
}

#[derive(Debug, Serialize)]
pub struct PostDetailContext {
    pub post: PostCard,
    pub comments: Vec<CommentCard>,
    pub comment_count: usize,
    pub form: CommentForm,
    /// Whether the viewer may open the edit form
    pub can_edit: bool,
}

/// Context of the create/edit form page.
#[derive(Debug, Serialize)]
pub struct PostFormContext {
    pub form: PostForm,
    pub errors: Option<ValidationErrors>,
    pub is_edit: bool,
    pub post_id: Option<Uuid>,
    pub groups: Vec<Group>,
}

/// Global feed
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page_obj = state
        .posts()
        .feed_page(query.page.as_deref(), state.items_per_page)
        .await?;

    Ok(HttpResponse::Ok().json(IndexContext { page_obj }))
}

/// Posts of one group
pub async fn group_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (group, page_obj) = state
        .posts()
        .group_page(&slug, query.page.as_deref(), state.items_per_page)
        .await?;

    Ok(HttpResponse::Ok().json(GroupContext { group, page_obj }))
}

/// Posts of one author
pub async fn profile(
    state: web::Data<AppState>,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (author, page_obj) = state
        .posts()
        .author_page(&username, query.page.as_deref(), state.items_per_page)
        .await?;
    let posts_count = page_obj.count;

    Ok(HttpResponse::Ok().json(ProfileContext {
        author,
        page_obj,
        posts_count,
    }))
}

/// One post with its comments
pub async fn post_detail(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    viewer: Option<CurrentUser>,
) -> Result<HttpResponse> {
    let detail = state.posts().get_post(*post_id).await?;
    let can_edit = viewer.is_some_and(|user| user.id == detail.post.post.author_id);

    Ok(HttpResponse::Ok().json(PostDetailContext {
        post: detail.post,
        comments: detail.comments,
        comment_count: detail.comment_count,
        form: CommentForm::default(),
        can_edit,
    }))
}

/// Empty post form
pub async fn create_post_form(
    state: web::Data<AppState>,
    _user: CurrentUser,
) -> Result<HttpResponse> {
    render_form(&state, PostForm::default(), None, None).await
}

/// Publish a post, then show the author's profile
pub async fn create_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    form: web::Form<PostForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();

    match state.posts().create_post(user.id, &form).await {
        Ok(_) => Ok(redirect(&profile_url(&user.username))),
        Err(AppError::Validation(errors)) => render_form(&state, form, Some(errors), None).await,
        Err(err) => Err(err),
    }
}

/// Edit form pre-filled with the post; non-authors are sent to the post
pub async fn edit_post_form(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let post = state
        .posts()
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {post_id}")))?;

    if post.author_id != user.id {
        return Ok(redirect(&post_url(post_id)));
    }

    let form = PostForm::new(post.text, post.group_id);
    render_form(&state, form, None, Some(post_id)).await
}

/// Apply an edit; non-authors are sent to the post unchanged
pub async fn edit_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let form = form.into_inner();

    match state.posts().edit_post(user.id, post_id, &form).await {
        Ok(_) | Err(AppError::Forbidden(_)) => Ok(redirect(&post_url(post_id))),
        Err(AppError::Validation(errors)) => {
            render_form(&state, form, Some(errors), Some(post_id)).await
        }
        Err(err) => Err(err),
    }
}

/// Delete a post; non-authors are sent to the post unchanged
pub async fn delete_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();

    match state.posts().delete_post(user.id, post_id).await {
        Ok(()) => Ok(redirect(&profile_url(&user.username))),
        Err(AppError::Forbidden(_)) => Ok(redirect(&post_url(post_id))),
        Err(err) => Err(err),
    }
}

async fn render_form(
    state: &AppState,
    form: PostForm,
    errors: Option<ValidationErrors>,
    post_id: Option<Uuid>,
) -> Result<HttpResponse> {
    let groups = state.posts().list_groups().await?;

    Ok(HttpResponse::Ok().json(PostFormContext {
        form,
        errors,
        is_edit: post_id.is_some(),
        post_id,
        groups,
    }))
}
