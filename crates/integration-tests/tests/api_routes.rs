//! Router tests for the Lumina API.
//!
//! Requests go through the full middleware stack with `oneshot`. The pool
//! never connects, so these cover everything decided before the first
//! query: authentication, role and ownership checks, request parsing,
//! headers and static uploads.
//!
//! Run with: cargo test -p lumina-integration-tests --test api_routes

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use lumina_core::UserRole;
use lumina_integration_tests::{TEST_ORIGIN, bearer_token, test_app};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

fn app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    (test_app(dir.path()), dir)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_as(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_is_ok() {
    let (app, _dir) = app();
    let response = send(app, get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let (app, _dir) = app();
    let response = send(app, get("/health/ready")).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// Authentication & Authorization
// ============================================================================

#[tokio::test]
async fn test_admin_routes_require_a_token() {
    let (app, _dir) = app();
    let response = send(app, get("/users")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Authentication required");
}

#[tokio::test]
async fn test_admin_routes_reject_customers() {
    let (app, _dir) = app();
    let token = bearer_token(3, UserRole::User);
    let response = send(app, get_as("/users", &token)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["message"],
        "Administrator access required"
    );
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let (app, _dir) = app();
    let response = send(app, get_as("/cart/3", "not-a-jwt")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_product_writes_require_admin() {
    let (app, _dir) = app();
    let token = bearer_token(3, UserRole::User);
    let response = send(
        app,
        post_json("/products", Some(&token), r#"{"name":"Lamp","price":10}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Cart & Order Ownership
// ============================================================================

#[tokio::test]
async fn test_cart_of_another_user_is_forbidden() {
    let (app, _dir) = app();
    let token = bearer_token(3, UserRole::User);

    let response = send(app.clone(), get_as("/cart/4", &token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(app.clone(), get_as("/cart/4/summary", &token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        app,
        post_json("/cart/add", Some(&token), r#"{"usuarioId":4,"productoId":1}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cart_requires_a_token() {
    let (app, _dir) = app();
    let response = send(app, post_json("/cart", None, "{}")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_orders_for_another_user_are_forbidden() {
    let (app, _dir) = app();
    let token = bearer_token(3, UserRole::User);
    let response = send(
        app,
        post_json(
            "/orders",
            Some(&token),
            r#"{"user_id":4,"product_ids":[1,2]}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_order_without_products_is_rejected() {
    let (app, _dir) = app();
    let token = bearer_token(3, UserRole::User);
    let response = send(
        app,
        post_json("/orders", Some(&token), r#"{"product_ids":[]}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "product_ids must not be empty"
    );
}

// ============================================================================
// Request Parsing
// ============================================================================

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let (app, _dir) = app();
    let response = send(app, post_json("/users/login", None, "{\"email\":")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_non_numeric_id_is_a_bad_request() {
    let (app, _dir) = app();
    let response = send(app, get("/products/abc")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("invalid id")
    );
}

#[tokio::test]
async fn test_register_validates_before_touching_the_database() {
    let (app, _dir) = app();

    let response = send(
        app.clone(),
        post_json(
            "/users/register",
            None,
            &json!({"name": "Ana", "email": "ana@lumina.test", "password": "short"}).to_string(),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "password must be at least 8 characters"
    );

    let response = send(
        app.clone(),
        post_json(
            "/users/register",
            None,
            &json!({"nombre": "Ana", "email": "not-an-email", "password": "long-enough"})
                .to_string(),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Invalid email address");

    let response = send(
        app,
        post_json(
            "/users/register",
            None,
            r#"{"email":"ana@lumina.test","password":"long-enough"}"#,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "name is required");
}

// ============================================================================
// Headers
// ============================================================================

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let (app, _dir) = app();
    let response = send(app, get("/health")).await;
    let headers = response.headers();

    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(headers["cross-origin-resource-policy"], "same-origin");
    assert_eq!(headers["cache-control"], "no-store");
}

#[tokio::test]
async fn test_request_id_is_generated_or_echoed() {
    let (app, _dir) = app();

    let response = send(app.clone(), get("/health")).await;
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "edge-7f3a")
        .body(Body::empty())
        .unwrap();
    let response = send(app.clone(), request).await;
    assert_eq!(response.headers()["x-request-id"], "edge-7f3a");

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "x".repeat(200))
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;
    assert_eq!(response.headers()["x-request-id"].len(), 36);
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let (app, _dir) = app();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/products")
        .header(header::ORIGIN, TEST_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = send(app.clone(), request).await;
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        TEST_ORIGIN
    );

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;
    assert!(
        !response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn test_uploaded_images_are_served_cross_origin() {
    let (app, dir) = app();
    std::fs::write(dir.path().join("cover.png"), b"png-bytes").unwrap();

    let response = send(app.clone(), get("/uploads/products/cover.png")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["cross-origin-resource-policy"],
        "cross-origin"
    );
    assert!(!response.headers().contains_key(header::CACHE_CONTROL));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"png-bytes");

    let response = send(app, get("/uploads/products/missing.png")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

const BOUNDARY: &str = "lumina-test-boundary";

/// Multipart product form: text fields, then `(field, file name)` file parts.
fn product_form(
    method: Method,
    uri: &str,
    token: &str,
    text: &[(&str, &str)],
    files: &[(&str, &str)],
) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in text {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    for (name, file_name) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\nimage-bytes\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

fn stored_files(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).map_or(0, Iterator::count)
}

#[tokio::test]
async fn test_failed_product_create_discards_uploads() {
    let (app, dir) = app();
    let token = bearer_token(1, UserRole::Admin);
    let request = product_form(
        Method::POST,
        "/products",
        &token,
        &[("name", "Anillo"), ("price", "120.00")],
        &[("cover_image", "cover.png"), ("gallery", "side.jpg")],
    );

    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stored_files(&dir), 0);
}

#[tokio::test]
async fn test_product_update_checks_product_before_storing_uploads() {
    let (app, dir) = app();
    let token = bearer_token(1, UserRole::Admin);
    let request = product_form(
        Method::PUT,
        "/products/1",
        &token,
        &[("name", "Anillo")],
        &[("cover_image", "cover.png")],
    );

    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stored_files(&dir), 0);
}

#[tokio::test]
async fn test_rejected_gallery_discards_stored_cover() {
    let (app, dir) = app();
    let token = bearer_token(1, UserRole::Admin);
    let request = product_form(
        Method::POST,
        "/products",
        &token,
        &[("name", "Anillo"), ("price", "120.00")],
        &[
            ("cover_image", "cover.png"),
            ("gallery", "ok.jpg"),
            ("gallery", "payload.exe"),
        ],
    );

    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stored_files(&dir), 0);
}

#[tokio::test]
async fn test_unstorable_price_is_rejected_before_uploads() {
    let (app, dir) = app();
    let token = bearer_token(1, UserRole::Admin);
    let request = product_form(
        Method::POST,
        "/products",
        &token,
        &[("name", "Anillo"), ("price", "1000000000000")],
        &[("cover_image", "cover.png")],
    );

    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("price cannot exceed")
    );
    assert_eq!(stored_files(&dir), 0);
}
