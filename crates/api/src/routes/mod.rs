//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (database)
//!
//! # Users
//! POST /users/register             - Register (rate limited)
//! POST /users/login                - Login, returns bearer token (rate limited)
//! GET  /users                      - List users (admin)
//! POST /users                      - Create user with role (admin)
//! GET  /users/{id}                 - User detail (admin)
//! PUT  /users/{id}                 - Update user (admin)
//! DELETE /users/{id}               - Delete user (admin)
//!
//! # Products
//! GET  /products                   - Catalog
//! GET  /products/{id}              - Product detail
//! GET  /products/{id}/related      - Same-category products (?limit=4)
//! POST /products                   - Create, JSON or multipart (admin)
//! PUT  /products/{id}              - Patch, JSON or multipart (admin)
//! DELETE /products/{id}            - Delete (admin)
//! POST /products/upload/cover      - Store a cover image (admin)
//! POST /products/upload/gallery    - Store gallery images (admin)
//!
//! # Categories
//! GET  /categories                 - List
//! GET  /categories/{id}            - Detail
//! POST /categories                 - Create (admin)
//! PUT  /categories/{id}            - Update (admin)
//! DELETE /categories/{id}          - Delete (admin)
//!
//! # Orders (bearer token)
//! GET  /orders                     - List (admin)
//! POST /orders                     - Place an order
//! GET  /orders/{id}                - Detail (owner or admin)
//! DELETE /orders/{id}              - Delete (admin)
//!
//! # Cart (bearer token, owner or admin)
//! POST /cart                       - Get or create
//! GET  /cart/{user_id}             - Raw cart
//! GET  /cart/{user_id}/summary     - Grouped lines and subtotal
//! GET  /cart/{user_id}/count       - Item count
//! GET  /cart/{user_id}/checkout    - Checkout deep link
//! POST /cart/add                   - Add one unit
//! POST /cart/remove                - Remove one unit
//! POST /cart/clear                 - Empty the cart
//! ```

pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the user routes router.
///
/// Login and register get their own rate limiter when `rate_limit` is set.
pub fn user_routes(rate_limit: bool) -> Router<AppState> {
    let auth = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login));
    let auth = if rate_limit {
        auth.layer(auth_rate_limiter())
    } else {
        auth
    };

    Router::new()
        .route("/", get(users::index).post(users::create))
        .route(
            "/{id}",
            get(users::show).put(users::update).delete(users::delete),
        )
        .merge(auth)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/{id}/related", get(products::related))
        .route("/upload/cover", post(products::upload_cover))
        .route("/upload/gallery", post(products::upload_gallery))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show).delete(orders::delete))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(cart::create))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/{user_id}", get(cart::show))
        .route("/{user_id}/summary", get(cart::summary))
        .route("/{user_id}/count", get(cart::count))
        .route("/{user_id}/checkout", get(cart::checkout))
}

/// Create all API routes.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/users", user_routes(rate_limit))
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/orders", order_routes())
        .nest("/cart", cart_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
