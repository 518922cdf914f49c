//! `lumina-client` against a mocked API.
//!
//! Run with: cargo test -p lumina-integration-tests --test client_facade

#![allow(clippy::unwrap_used)]

use lumina_client::{ApiClient, ClientConfig, ClientError};
use lumina_core::{Price, ProductId, UserId, UserRole};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&ClientConfig::with_base_url(server.uri())).unwrap()
}

fn login_body(role: &str) -> serde_json::Value {
    json!({
        "message": "Login successful",
        "token": "token-abc",
        "user": {"id": 7, "name": "Ana", "email": "ana@lumina.test", "role": role}
    })
}

fn cart_body() -> serde_json::Value {
    json!({
        "id": 1,
        "user_id": 7,
        "product_ids": [3, 3],
        "total": 20.0,
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:00:00Z"
    })
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn test_login_stores_token_and_sends_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .and(body_json(json!({"email": "ana@lumina.test", "password": "secret-pass"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body("admin")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(header("authorization", "Bearer token-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let response = api.login("ana@lumina.test", "secret-pass").await.unwrap();

    assert_eq!(response.user.role, UserRole::Admin);
    assert!(api.session().is_authenticated());
    assert!(api.session().is_admin());
    assert_eq!(api.session().user_id(), Some(UserId::new(7)));

    assert!(api.users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthorized_response_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body("user")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart/7/count"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid or expired token"})),
        )
        .mount(&server)
        .await;

    let api = client(&server);
    api.login("ana@lumina.test", "secret-pass").await.unwrap();

    let err = api.cart_count(UserId::new(7)).await.unwrap_err();
    assert!(matches!(err, ClientError::ReauthenticationRequired));
    assert!(!api.session().is_authenticated());
}

#[tokio::test]
async fn test_anonymous_requests_carry_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/categories"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Audio", "description": "Auriculares"}
        ])))
        .mount(&server)
        .await;

    let categories = client(&server).categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Audio");
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_api_error_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let api = client(&server);
    let err = api.login("ana@lumina.test", "wrong-pass").await.unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!api.session().is_authenticated());
}

#[tokio::test]
async fn test_plain_text_error_body_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/9"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client(&server)
        .product(ProductId::new(9))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(502));
    assert!(err.to_string().contains("Bad Gateway"));
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_products_fall_back_to_samples() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let products = client(&server).products().await;

    assert_eq!(products.len(), 6);
    assert_eq!(products[0].name, "Laptop Profesional");
}

#[tokio::test]
async fn test_products_from_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Lamp", "price": 19.99, "category": "Hogar", "quantity": 3}
        ])))
        .mount(&server)
        .await;

    let products = client(&server).products().await;

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].price.to_string(), "$19.99");
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_missing_cart_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cart/7"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Cart not found"})))
        .mount(&server)
        .await;

    assert!(client(&server).cart(UserId::new(7)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_add_to_cart_sends_item() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cart/add"))
        .and(body_json(json!({"user_id": 7, "product_id": 3, "price": 10.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_body()))
        .expect(1)
        .mount(&server)
        .await;

    let price = Price::from_units(10);
    let cart = client(&server)
        .add_to_cart(UserId::new(7), ProductId::new(3), Some(price))
        .await
        .unwrap();

    assert_eq!(cart.product_ids, vec![ProductId::new(3), ProductId::new(3)]);
    assert_eq!(cart.total, Price::from_units(20));
}

#[tokio::test]
async fn test_checkout_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cart/7/checkout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://wa.me/5491100000000?text=Hola",
            "message": "Hola",
            "total": 20.0
        })))
        .mount(&server)
        .await;

    let checkout = client(&server).checkout(UserId::new(7)).await.unwrap();
    assert!(checkout.url.starts_with("https://wa.me/"));
    assert_eq!(checkout.total, Price::from_units(20));
}
