//! Router-level tests. They build the full axum router over in-memory adapters and
//! drive it with `oneshot`.

use api_lib::adapters::memory::{MemoryCache, MemoryStore};
use api_lib::config::Config;
use api_lib::web::{router, state::AppState};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

fn test_config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DB_HOST", "localhost"),
        ("DB_USER", "books"),
        ("DB_NAME", "bookshelf"),
        ("REDIS_HOST", "localhost"),
        ("REDIS_PORT", "6379"),
        ("JWT_SECRET", "test-secret"),
    ]);
    Config::from_lookup(|k| vars.get(k).map(|v| v.to_string())).expect("test config")
}

fn app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        Arc::new(test_config()),
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(MemoryCache::new()),
    );
    (router(Arc::new(state)), store)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (status, set_cookie, json)
}

/// Registers and logs in, returning the `Authorization=<token>` pair for the Cookie header.
async fn login_as(app: &Router, username: &str) -> String {
    let creds = json!({ "username": username, "password": "password123" });
    let (status, _, _) = send(app, Method::POST, "/api/v1/users", None, Some(creds.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, set_cookie, _) =
        send(app, Method::POST, "/api/v1/users/login", None, Some(creds)).await;
    assert_eq!(status, StatusCode::OK);
    set_cookie
        .expect("login sets a cookie")
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn become_author(app: &Router, cookie: &str) {
    let profile = json!({ "first_name": "George", "last_name": "Orwell", "birth_date": "1903-06-25" });
    let (status, _, _) =
        send(app, Method::POST, "/api/v1/authors", Some(cookie), Some(profile)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn health_endpoint_answers() {
    let (app, _) = app();
    let (status, _, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "ok" }));
}

#[tokio::test]
async fn register_returns_user_without_password() {
    let (app, _) = app();
    let creds = json!({ "username": "reader", "password": "password123" });
    let (status, _, body) = send(&app, Method::POST, "/api/v1/users", None, Some(creds)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["username"], "reader");
    assert_eq!(body["data"]["is_author"], false);
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
async fn invalid_registration_is_bad_request() {
    let (app, _) = app();
    let creds = json!({ "username": "abc", "password": "password123" });
    let (status, _, body) = send(&app, Method::POST, "/api/v1/users", None, Some(creds)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "error");
    assert!(body["error"].as_str().unwrap().contains("username"));
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (app, _) = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_sets_http_only_session_cookie() {
    let (app, _) = app();
    let creds = json!({ "username": "reader", "password": "password123" });
    send(&app, Method::POST, "/api/v1/users", None, Some(creds.clone())).await;
    let (status, set_cookie, body) =
        send(&app, Method::POST, "/api/v1/users/login", None, Some(creds)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "reader");
    let cookie = set_cookie.unwrap();
    assert!(cookie.starts_with("Authorization="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=86400"));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let (app, _) = app();
    let creds = json!({ "username": "reader", "password": "password123" });
    send(&app, Method::POST, "/api/v1/users", None, Some(creds)).await;
    let wrong = json!({ "username": "reader", "password": "password999" });
    let (status, set_cookie, _) =
        send(&app, Method::POST, "/api/v1/users/login", None, Some(wrong)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(set_cookie.is_none());
}

#[tokio::test]
async fn protected_routes_require_session() {
    let (app, _) = app();
    let (status, _, _) = send(&app, Method::GET, "/api/v1/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _, _) = send(
        &app,
        Method::GET,
        "/api/v1/users",
        Some("Authorization=garbage"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logged_in_user_lists_users_with_totals() {
    let (app, _) = app();
    let cookie = login_as(&app, "reader").await;
    let (status, _, body) =
        send(&app, Method::GET, "/api/v1/users?l=0&p=0", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["limit"], 10);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["total_rows"], 1);
    assert_eq!(body["data"]["total_pages"], 1);
}

#[tokio::test]
async fn non_numeric_pagination_is_bad_request() {
    let (app, _) = app();
    let (status, _, _) = send(&app, Method::GET, "/api/v1/books?l=ten", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_numeric_id_is_bad_request() {
    let (app, _) = app();
    let (status, _, _) = send(&app, Method::GET, "/api/v1/books/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn book_lifecycle_for_owner() {
    let (app, _) = app();
    let cookie = login_as(&app, "orwell").await;
    become_author(&app, &cookie).await;

    let book = json!({ "title": "Animal Farm", "content": "All animals are equal." });
    let (status, _, body) =
        send(&app, Method::POST, "/api/v1/books", Some(&cookie), Some(book)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();

    let uri = format!("/api/v1/books/{}", id);
    let (status, _, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Animal Farm");

    let change = json!({ "title": "Animal Farm: A Fairy Story" });
    let (status, _, body) = send(&app, Method::PUT, &uri, Some(&cookie), Some(change)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Animal Farm: A Fairy Story");

    let (status, _, _) = send(&app, Method::DELETE, &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn reader_without_profile_cannot_publish() {
    let (app, _) = app();
    let cookie = login_as(&app, "reader").await;
    let book = json!({ "title": "Animal Farm", "content": "All animals are equal." });
    let (status, _, _) = send(&app, Method::POST, "/api/v1/books", Some(&cookie), Some(book)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn other_author_cannot_edit_book() {
    let (app, _) = app();
    let owner = login_as(&app, "orwell").await;
    become_author(&app, &owner).await;
    let book = json!({ "title": "Animal Farm", "content": "All animals are equal." });
    let (_, _, body) = send(&app, Method::POST, "/api/v1/books", Some(&owner), Some(book)).await;
    let uri = format!("/api/v1/books/{}", body["data"]["id"]);

    let intruder = login_as(&app, "huxley").await;
    become_author(&app, &intruder).await;
    let change = json!({ "title": "Brave New Farm" });
    let (status, _, _) = send(&app, Method::PUT, &uri, Some(&intruder), Some(change)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _, _) = send(&app, Method::DELETE, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, _, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(body["data"]["title"], "Animal Farm");
}

#[tokio::test]
async fn other_author_is_forbidden_before_body_validation() {
    let (app, _) = app();
    let owner = login_as(&app, "orwell").await;
    become_author(&app, &owner).await;
    let book = json!({ "title": "Animal Farm", "content": "All animals are equal." });
    let (_, _, body) = send(&app, Method::POST, "/api/v1/books", Some(&owner), Some(book)).await;
    let uri = format!("/api/v1/books/{}", body["data"]["id"]);

    let intruder = login_as(&app, "huxley").await;
    become_author(&app, &intruder).await;
    for change in [json!({}), json!({ "title": "ab" }), json!({ "content": "short" })] {
        let (status, _, _) = send(&app, Method::PUT, &uri, Some(&intruder), Some(change)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn self_delete_clears_cookie_and_cascades() {
    let (app, _) = app();
    let cookie = login_as(&app, "orwell").await;
    become_author(&app, &cookie).await;
    let (_, _, me) = send(&app, Method::GET, "/api/v1/users?l=1", Some(&cookie), None).await;
    let my_id = me["data"]["rows"][0]["id"].as_i64().unwrap();

    let (status, set_cookie, _) =
        send(&app, Method::DELETE, "/api/v1/users", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(set_cookie.unwrap().contains("Max-Age=0"));

    let (status, _, _) = send(&app, Method::GET, "/api/v1/users", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let uri = format!("/api/v1/authors/{}", my_id);
    let (status, _, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logout_expires_cookie() {
    let (app, _) = app();
    let (status, set_cookie, _) = send(&app, Method::POST, "/api/v1/users/logout", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let cookie = set_cookie.unwrap();
    assert!(cookie.starts_with("Authorization="));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn repeated_listing_hits_store_once() {
    let (app, store) = app();
    for _ in 0..2 {
        let (status, _, body) = send(&app, Method::GET, "/api/v1/books?l=5&p=1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_rows"], 0);
    }
    assert_eq!(store.list_calls(), 1);
}
