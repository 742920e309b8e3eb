//! Shared fixtures for integration tests
//!
//! Builds in-memory stores, signs identity tokens the way the auth
//! subsystem does, and seeds posts.

#![allow(dead_code)]

use actix_web::web;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use posts_service::db::{GroupRepository, MemoryStore, PostRepository};
use posts_service::handlers::AppState;
use posts_service::middleware::Claims;
use posts_service::models::{Group, NewGroup, NewPost, Post, User};
use std::sync::Arc;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const LOGIN_URL: &str = "/auth/login/";

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub fn app_state(store: Arc<MemoryStore>, items_per_page: usize) -> web::Data<AppState> {
    web::Data::new(AppState::new(store, items_per_page, LOGIN_URL))
}

/// HS256 token for `user`, valid for an hour.
pub fn token_for(user: &User) -> String {
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("sign test token")
}

pub fn bearer(user: &User) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(user)))
}

pub async fn create_group(store: &MemoryStore, title: &str, slug: &str) -> Group {
    store
        .create_group(NewGroup {
            title: title.to_string(),
            description: format!("All about {title}"),
            slug: slug.to_string(),
        })
        .await
        .expect("create test group")
}

/// Insert `count` posts by `author`; the last one inserted is the newest.
pub async fn seed_posts(
    store: &MemoryStore,
    author: &User,
    count: usize,
    group_id: Option<Uuid>,
) -> Vec<Post> {
    let mut posts = Vec::with_capacity(count);
    for n in 0..count {
        let post = store
            .create_post(NewPost {
                author_id: author.id,
                text: format!("Test post number {n}"),
                group_id,
            })
            .await
            .expect("seed test post");
        posts.push(post);
    }
    posts
}
