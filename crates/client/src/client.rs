//! HTTP client for the storefront API.

use reqwest::{Client, Method, RequestBuilder, StatusCode, multipart};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{debug, instrument, warn};

use lumina_core::{CategoryId, OrderId, Price, ProductId, UserId};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::fallback::fallback_products;
use crate::session::Session;
use crate::types::{
    Cart, CartCheckout, CartSummary, Category, CategoryInput, CountResponse, CoverUpload,
    GalleryUpload, ImageUpload, LoginResponse, MessageResponse, Order, OrderInput, Product,
    ProductInput, RegisterResponse, User, UserInput,
};

/// Path under which the API serves uploaded product images.
pub const UPLOADS_PATH: &str = "/uploads/products";

/// Typed client for the storefront API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    /// Create a client with an empty session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if no base URL can be resolved, or
    /// `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_session(config, Session::new())
    }

    /// Create a client around an existing session.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::new`].
    pub fn with_session(config: &ClientConfig, session: Session) -> Result<Self, ClientError> {
        let base_url = config.resolve_base_url()?;
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    /// The normalized API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session this client authenticates with.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Resolve a stored image reference to a URL. Absolute URLs pass
    /// through; bare file names resolve under the uploads path.
    #[must_use]
    pub fn image_url(&self, path: &str) -> String {
        let path = path.trim();
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }

        let file = path.trim_start_matches('/');
        let file = file
            .strip_prefix(UPLOADS_PATH.trim_start_matches('/'))
            .map_or(file, |rest| rest.trim_start_matches('/'));
        format!("{}{UPLOADS_PATH}/{file}", self.base_url)
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode a success body.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await.inspect_err(|e| {
            warn!(error = %e, timeout = e.is_timeout(), "API request failed");
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            debug!("API returned 401, clearing session");
            self.session.clear();
            return Err(ClientError::ReauthenticationRequired);
        }

        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<MessageResponse>(&bytes).map_or_else(
                |_| String::from_utf8_lossy(&bytes).into_owned(),
                |body| body.message,
            );
            debug!(status = status.as_u16(), message = %message, "API error response");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn put<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<MessageResponse, ClientError> {
        self.send(self.request(Method::DELETE, path)).await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Log in and store the returned token in the session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 on bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let response: LoginResponse = self
            .post(
                "/users/login",
                &json!({ "email": email, "password": password }),
            )
            .await?;

        self.session.set(response.token.clone(), response.user.clone());
        Ok(response)
    }

    /// Forget the stored token. No request is made.
    pub fn logout(&self) {
        self.session.clear();
    }

    /// Register a customer account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 on a duplicate email or
    /// invalid fields.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse, ClientError> {
        self.post(
            "/users/register",
            &json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 403 for non-admins.
    pub async fn users(&self) -> Result<Vec<User>, ClientError> {
        self.get("/users").await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the user does not exist.
    pub async fn user(&self, id: UserId) -> Result<User, ClientError> {
        self.get(&format!("/users/{id}")).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 on invalid fields.
    pub async fn create_user(&self, input: &UserInput) -> Result<User, ClientError> {
        self.post("/users", input).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 or 400.
    pub async fn update_user(&self, id: UserId, input: &UserInput) -> Result<User, ClientError> {
        self.put(&format!("/users/{id}"), input).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the user does not exist.
    pub async fn delete_user(&self, id: UserId) -> Result<MessageResponse, ClientError> {
        self.delete(&format!("/users/{id}")).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// The catalog, or sample products when the call fails entirely.
    ///
    /// A rejected token still clears the session before falling back.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Vec<Product> {
        match self.get::<Vec<Product>>("/products").await {
            Ok(products) => products,
            Err(e) => {
                warn!(error = %e, "Product list unavailable, showing sample catalog");
                fallback_products()
            }
        }
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the product does not exist.
    pub async fn product(&self, id: ProductId) -> Result<Product, ClientError> {
        self.get(&format!("/products/{id}")).await
    }

    /// Up to `limit` products in `category`, excluding `exclude_id`,
    /// filtered from the product list.
    pub async fn related_products(
        &self,
        category: &str,
        exclude_id: ProductId,
        limit: usize,
    ) -> Vec<Product> {
        self.products()
            .await
            .into_iter()
            .filter(|p| p.category == category && p.id != exclude_id)
            .take(limit)
            .collect()
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 on invalid fields.
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ClientError> {
        self.post("/products", input).await
    }

    /// Create a product from a multipart form with image files.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 on invalid fields or files.
    pub async fn create_product_with_images(
        &self,
        input: &ProductInput,
        cover: Option<ImageUpload>,
        gallery: Vec<ImageUpload>,
    ) -> Result<Product, ClientError> {
        let form = product_form(input, cover, gallery)?;
        self.send(self.request(Method::POST, "/products").multipart(form))
            .await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 or 400.
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, ClientError> {
        self.put(&format!("/products/{id}"), input).await
    }

    /// Patch a product from a multipart form. A cover upload replaces the
    /// cover; gallery uploads replace the gallery.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 or 400.
    pub async fn update_product_with_images(
        &self,
        id: ProductId,
        input: &ProductInput,
        cover: Option<ImageUpload>,
        gallery: Vec<ImageUpload>,
    ) -> Result<Product, ClientError> {
        let form = product_form(input, cover, gallery)?;
        self.send(
            self.request(Method::PUT, &format!("/products/{id}"))
                .multipart(form),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the product does not exist.
    pub async fn delete_product(&self, id: ProductId) -> Result<MessageResponse, ClientError> {
        self.delete(&format!("/products/{id}")).await
    }

    /// Upload a cover image and return its stored file name.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 for unsupported files.
    pub async fn upload_cover(&self, image: ImageUpload) -> Result<String, ClientError> {
        let form = multipart::Form::new().part("cover_image", file_part(image));
        let upload: CoverUpload = self
            .send(
                self.request(Method::POST, "/products/upload/cover")
                    .multipart(form),
            )
            .await?;
        Ok(upload.cover_image)
    }

    /// Upload gallery images and return their stored file names, in order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 for unsupported files.
    pub async fn upload_gallery(&self, images: Vec<ImageUpload>) -> Result<Vec<String>, ClientError> {
        let form = images
            .into_iter()
            .fold(multipart::Form::new(), |form, image| {
                form.part("gallery", file_part(image))
            });
        let upload: GalleryUpload = self
            .send(
                self.request(Method::POST, "/products/upload/gallery")
                    .multipart(form),
            )
            .await?;
        Ok(upload.gallery)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the API is unreachable.
    pub async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        self.get("/categories").await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the category does not exist.
    pub async fn category(&self, id: CategoryId) -> Result<Category, ClientError> {
        self.get(&format!("/categories/{id}")).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 on a duplicate name.
    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, ClientError> {
        self.post("/categories", input).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 or 400.
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, ClientError> {
        self.put(&format!("/categories/{id}"), input).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the category does not exist.
    pub async fn delete_category(&self, id: CategoryId) -> Result<MessageResponse, ClientError> {
        self.delete(&format!("/categories/{id}")).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 403 for non-admins.
    pub async fn orders(&self) -> Result<Vec<Order>, ClientError> {
        self.get("/orders").await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the order does not exist
    /// or belongs to someone else.
    pub async fn order(&self, id: OrderId) -> Result<Order, ClientError> {
        self.get(&format!("/orders/{id}")).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 for an empty or unknown
    /// product list.
    pub async fn create_order(&self, input: &OrderInput) -> Result<Order, ClientError> {
        self.post("/orders", input).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the order does not exist.
    pub async fn delete_order(&self, id: OrderId) -> Result<MessageResponse, ClientError> {
        self.delete(&format!("/orders/{id}")).await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Get or create the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the user does not exist.
    pub async fn create_cart(&self, user_id: UserId) -> Result<Cart, ClientError> {
        self.post("/cart", &json!({ "user_id": user_id })).await
    }

    /// The user's cart, or `None` if they have none yet.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` for failures other than a missing cart.
    pub async fn cart(&self, user_id: UserId) -> Result<Option<Cart>, ClientError> {
        match self.get(&format!("/cart/{user_id}")).await {
            Ok(cart) => Ok(Some(cart)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the user has no cart.
    pub async fn cart_summary(&self, user_id: UserId) -> Result<CartSummary, ClientError> {
        self.get(&format!("/cart/{user_id}/summary")).await
    }

    /// Item count for a badge; zero when the user has no cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ReauthenticationRequired` when the token expired.
    pub async fn cart_count(&self, user_id: UserId) -> Result<usize, ClientError> {
        let response: CountResponse = self.get(&format!("/cart/{user_id}/count")).await?;
        Ok(response.count)
    }

    /// Add one unit. The cart is created server-side if needed; without a
    /// price the catalog price is used.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 for an unknown user or
    /// product.
    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        price: Option<Price>,
    ) -> Result<Cart, ClientError> {
        self.post("/cart/add", &cart_item(user_id, product_id, price))
            .await
    }

    /// Remove one unit.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if there is no cart or the
    /// product is not in it.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        price: Option<Price>,
    ) -> Result<Cart, ClientError> {
        self.post("/cart/remove", &cart_item(user_id, product_id, price))
            .await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the user has no cart.
    pub async fn clear_cart(&self, user_id: UserId) -> Result<Cart, ClientError> {
        self.post("/cart/clear", &json!({ "user_id": user_id })).await
    }

    /// Checkout deep link for the cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 if the cart is empty.
    pub async fn checkout(&self, user_id: UserId) -> Result<CartCheckout, ClientError> {
        self.get(&format!("/cart/{user_id}/checkout")).await
    }
}

fn cart_item(
    user_id: UserId,
    product_id: ProductId,
    price: Option<Price>,
) -> serde_json::Value {
    let mut body = json!({ "user_id": user_id, "product_id": product_id });
    if let Some(price) = price {
        body["price"] = json!(price);
    }
    body
}

fn file_part(image: ImageUpload) -> multipart::Part {
    multipart::Part::bytes(image.bytes).file_name(image.file_name)
}

/// Multipart form carrying the product's text fields and images.
fn product_form(
    input: &ProductInput,
    cover: Option<ImageUpload>,
    gallery: Vec<ImageUpload>,
) -> Result<multipart::Form, ClientError> {
    let fields = serde_json::to_value(input).map_err(|e| ClientError::Decode(e.to_string()))?;

    let mut form = multipart::Form::new();
    if let serde_json::Value::Object(map) = fields {
        for (name, value) in map {
            let text = match value {
                serde_json::Value::String(s) => s,
                // Gallery URLs travel as a JSON array in one text field
                other => other.to_string(),
            };
            form = form.text(name, text);
        }
    }

    if let Some(cover) = cover {
        form = form.part("cover_image", file_part(cover));
    }
    for image in gallery {
        form = form.part("gallery", file_part(image));
    }
    Ok(form)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(&ClientConfig::with_base_url("https://api.lumina.shop/")).unwrap()
    }

    #[test]
    fn test_base_url_normalized() {
        assert_eq!(client().base_url(), "https://api.lumina.shop");
    }

    #[test]
    fn test_image_url_resolution() {
        let client = client();
        assert_eq!(
            client.image_url("a1b2.jpg"),
            "https://api.lumina.shop/uploads/products/a1b2.jpg"
        );
        assert_eq!(
            client.image_url("/uploads/products/a1b2.jpg"),
            "https://api.lumina.shop/uploads/products/a1b2.jpg"
        );
        assert_eq!(
            client.image_url("https://cdn.example.com/x.png"),
            "https://cdn.example.com/x.png"
        );
    }

    #[test]
    fn test_cart_item_body() {
        let body = cart_item(UserId::new(2), ProductId::new(9), None);
        assert_eq!(body, json!({ "user_id": 2, "product_id": 9 }));

        let body = cart_item(UserId::new(2), ProductId::new(9), Some(Price::from_units(12)));
        assert_eq!(body["price"], json!(12.0));
    }

    #[test]
    fn test_logout_clears_session() {
        let client = client();
        client.session().set(
            "tok".to_string(),
            User {
                id: UserId::new(1),
                name: "Ana".to_string(),
                email: "ana@lumina.shop".to_string(),
                role: lumina_core::UserRole::User,
                created_at: None,
                updated_at: None,
            },
        );
        client.logout();
        assert!(!client.session().is_authenticated());
    }
}
