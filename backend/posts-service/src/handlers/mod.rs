/// HTTP handlers for posts-service
///
/// This module contains handlers for:
/// - Posts: feed, group and profile listings, detail, create, edit, delete
/// - Comments: adding a comment to a post
///
/// Pages respond with JSON context documents: the data a template would
/// receive. Redirects and status codes are those of the HTML site.
pub mod comments;
pub mod posts;

use crate::db::Store;
use crate::services::{CommentService, GroupService, PostService};
use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

// Re-export handler functions at module level
pub use comments::add_comment;
pub use posts::{
    create_post, create_post_form, delete_post, edit_post, edit_post_form, group_posts, index,
    post_detail, profile,
};

/// Shared request context, registered as `web::Data<AppState>`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub items_per_page: usize,
    pub login_url: String,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, items_per_page: usize, login_url: impl Into<String>) -> Self {
        Self {
            store,
            items_per_page,
            login_url: login_url.into(),
        }
    }

    pub fn posts(&self) -> PostService {
        PostService::new(self.store.clone())
    }

    pub fn comments(&self) -> CommentService {
        CommentService::new(self.store.clone())
    }

    pub fn groups(&self) -> GroupService {
        GroupService::new(self.store.clone())
    }
}

/// `?page=` as sent by the client; parsed leniently by the paginator.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Register the site routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/group/{slug}/", web::get().to(group_posts))
        .route("/profile/{username}/", web::get().to(profile))
        .route("/create/", web::get().to(create_post_form))
        .route("/create/", web::post().to(create_post))
        .route("/posts/{post_id}/", web::get().to(post_detail))
        .route("/posts/{post_id}/edit/", web::get().to(edit_post_form))
        .route("/posts/{post_id}/edit/", web::post().to(edit_post))
        .route("/posts/{post_id}/comment/", web::post().to(add_comment))
        .route("/posts/{post_id}/delete/", web::post().to(delete_post));
}

pub fn post_url(post_id: Uuid) -> String {
    format!("/posts/{post_id}/")
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}
