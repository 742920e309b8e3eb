//! Integration Tests: HTTP flows
//!
//! Drives the routes through `actix_web::test` with the session middleware
//! and an in-memory store.
//!
//! Coverage:
//! - Listing pages and their context documents
//! - Login redirects for anonymous users
//! - Create, edit, delete and comment form submissions

mod common;

use actix_web::{http::header, http::StatusCode, test, App};
use common::{app_state, bearer, create_group, memory_store, seed_posts, token_for};
use posts_service::db::{CommentRepository, MemoryStore, PostRepository};
use posts_service::handlers;
use posts_service::middleware::{SessionAuthMiddleware, ACCESS_TOKEN_COOKIE};
use posts_service::models::PostFilter;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

macro_rules! init_app {
    ($store:expr, $per_page:expr) => {
        test::init_service(
            App::new()
                .app_data(app_state($store.clone(), $per_page))
                .wrap(SessionAuthMiddleware::new(common::TEST_SECRET))
                .configure(handlers::configure),
        )
        .await
    };
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn newest_post_id(store: &Arc<MemoryStore>) -> Uuid {
    store.list_posts(PostFilter::All, Some(1), 0).await.unwrap()[0]
        .post
        .id
}

#[actix_web::test]
async fn index_serves_first_page_of_feed() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    seed_posts(&store, &author, 13, None).await;
    let app = init_app!(store, 10);

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["page_obj"]["number"], 1);
    assert_eq!(body["page_obj"]["items"].as_array().unwrap().len(), 10);
    assert_eq!(body["page_obj"]["has_next"], true);
    assert_eq!(body["page_obj"]["items"][0]["author_username"], "auth");

    let req = test::TestRequest::get().uri("/?page=2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page_obj"]["items"].as_array().unwrap().len(), 3);

    let req = test::TestRequest::get().uri("/?page=abc").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page_obj"]["number"], 1);
}

#[actix_web::test]
async fn group_page_shows_group_and_posts() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    let group = create_group(&store, "Test group", "test-slug").await;
    seed_posts(&store, &author, 2, Some(group.id)).await;
    seed_posts(&store, &author, 1, None).await;
    let app = init_app!(store, 10);

    let req = test::TestRequest::get().uri("/group/test-slug/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["group"]["title"], "Test group");
    assert_eq!(body["page_obj"]["count"], 2);

    let req = test::TestRequest::get().uri("/group/missing/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn profile_reports_posts_count() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    seed_posts(&store, &author, 12, None).await;
    let app = init_app!(store, 10);

    let req = test::TestRequest::get().uri("/profile/auth/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["author"]["username"], "auth");
    assert_eq!(body["posts_count"], 12);
    assert_eq!(body["page_obj"]["items"].as_array().unwrap().len(), 10);

    let req = test::TestRequest::get().uri("/profile/nobody/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn post_detail_shows_comments_and_edit_flag() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    let reader = store.insert_user("reader").unwrap();
    let post = seed_posts(&store, &author, 1, None).await.remove(0);
    let app = init_app!(store, 10);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header(bearer(&reader))
        .set_form(&[("text", "Nice post")])
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post.id))
        .insert_header(bearer(&author))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["post"]["text"], "Test post number 0");
    assert_eq!(body["comment_count"], 1);
    assert_eq!(body["comments"][0]["text"], "Nice post");
    assert_eq!(body["comments"][0]["author_username"], "reader");
    assert_eq!(body["can_edit"], true);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["can_edit"], false);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", Uuid::new_v4()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/posts/not-a-uuid/").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn anonymous_user_is_sent_to_login() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    let post = seed_posts(&store, &author, 1, None).await.remove(0);
    let app = init_app!(store, 10);

    let req = test::TestRequest::get().uri("/create/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=%2Fcreate%2F");

    let edit_url = format!("/posts/{}/edit/", post.id);
    let req = test::TestRequest::get().uri(&edit_url).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        format!("/auth/login/?next=%2Fposts%2F{}%2Fedit%2F", post.id)
    );

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .set_form(&[("text", "anonymous")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/?next="));
    assert_eq!(store.count_comments(post.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn invalid_token_is_treated_as_anonymous() {
    let store = memory_store();
    let app = init_app!(store, 10);

    let req = test::TestRequest::get()
        .uri("/create/")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/"));
}

#[actix_web::test]
async fn create_form_lists_groups() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    create_group(&store, "Test group", "test-slug").await;
    let app = init_app!(store, 10);

    let req = test::TestRequest::get()
        .uri("/create/")
        .insert_header(bearer(&author))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["is_edit"], false);
    assert_eq!(body["groups"][0]["slug"], "test-slug");
    assert!(body["errors"].is_null());
}

#[actix_web::test]
async fn create_post_redirects_to_profile() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    let group = create_group(&store, "Test group", "test-slug").await;
    let app = init_app!(store, 10);

    let group_id = group.id.to_string();
    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(bearer(&author))
        .set_form(&[("text", "Test text"), ("group", group_id.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");
    let cards = store.list_posts(PostFilter::All, None, 0).await.unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].post.text, "Test text");
    assert_eq!(cards[0].post.author_id, author.id);
    assert_eq!(cards[0].post.group_id, Some(group.id));
}

#[actix_web::test]
async fn create_with_cookie_token() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    let app = init_app!(store, 10);

    let req = test::TestRequest::post()
        .uri("/create/")
        .cookie(actix_web::cookie::Cookie::new(
            ACCESS_TOKEN_COOKIE,
            token_for(&author),
        ))
        .set_form(&[("text", "From cookie"), ("group", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");
    assert_eq!(store.count_posts(PostFilter::All).await.unwrap(), 1);
}

#[actix_web::test]
async fn invalid_create_rerenders_form() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    let app = init_app!(store, 10);

    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(bearer(&author))
        .set_form(&[("text", "   "), ("group", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(!body["errors"]["text"].is_null());
    assert_eq!(body["form"]["text"], "   ");
    assert_eq!(store.count_posts(PostFilter::All).await.unwrap(), 0);
}

#[actix_web::test]
async fn non_author_edit_redirects_to_post() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    let intruder = store.insert_user("not_author").unwrap();
    let post = seed_posts(&store, &author, 1, None).await.remove(0);
    let app = init_app!(store, 10);
    let edit_url = format!("/posts/{}/edit/", post.id);

    let req = test::TestRequest::get()
        .uri(&edit_url)
        .insert_header(bearer(&intruder))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let req = test::TestRequest::post()
        .uri(&edit_url)
        .insert_header(bearer(&intruder))
        .set_form(&[("text", "Hacked"), ("group", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let stored = store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, post.text);
}

#[actix_web::test]
async fn author_edit_flow() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    let post = seed_posts(&store, &author, 1, None).await.remove(0);
    let app = init_app!(store, 10);
    let edit_url = format!("/posts/{}/edit/", post.id);

    let req = test::TestRequest::get()
        .uri(&edit_url)
        .insert_header(bearer(&author))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["is_edit"], true);
    assert_eq!(body["form"]["text"], post.text);

    let req = test::TestRequest::post()
        .uri(&edit_url)
        .insert_header(bearer(&author))
        .set_form(&[("text", ""), ("group", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri(&edit_url)
        .insert_header(bearer(&author))
        .set_form(&[("text", "Edited text"), ("group", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let stored = store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Edited text");
    assert_eq!(stored.pub_date, post.pub_date);
}

#[actix_web::test]
async fn invalid_comment_is_dropped_silently() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    let post = seed_posts(&store, &author, 1, None).await.remove(0);
    let app = init_app!(store, 10);
    let comment_url = format!("/posts/{}/comment/", post.id);

    let req = test::TestRequest::post()
        .uri(&comment_url)
        .insert_header(bearer(&author))
        .set_form(&[("text", "  ")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(store.count_comments(post.id).await.unwrap(), 0);

    let req = test::TestRequest::post()
        .uri(&comment_url)
        .insert_header(bearer(&author))
        .set_form(&[("text", "Real comment")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(store.count_comments(post.id).await.unwrap(), 1);
}

#[actix_web::test]
async fn comment_on_missing_post_is_404() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    let app = init_app!(store, 10);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", Uuid::new_v4()))
        .insert_header(bearer(&author))
        .set_form(&[("text", "Lost")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_is_author_only() {
    let store = memory_store();
    let author = store.insert_user("auth").unwrap();
    let intruder = store.insert_user("not_author").unwrap();
    seed_posts(&store, &author, 1, None).await;
    let post_id = newest_post_id(&store).await;
    let app = init_app!(store, 10);
    let delete_url = format!("/posts/{post_id}/delete/");

    let req = test::TestRequest::post()
        .uri(&delete_url)
        .insert_header(bearer(&intruder))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{post_id}/"));
    assert!(store.find_post(post_id).await.unwrap().is_some());

    let req = test::TestRequest::post()
        .uri(&delete_url)
        .insert_header(bearer(&author))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");
    assert!(store.find_post(post_id).await.unwrap().is_none());
}
