//! Cart service.
//!
//! A cart has two states per user: absent (no row) and present. Adding
//! creates it in the same statement; nothing else creates it implicitly and
//! nothing deletes it apart from deleting the user.

use sqlx::PgPool;
use tracing::instrument;

use lumina_core::{CartContents, Price, ProductId, UserId};

use crate::db::{
    CartRepository, ProductRepository, RemoveOutcome, RepositoryError, UserRepository,
};
use crate::error::{AppError, Result};
use crate::models::{Cart, CartCheckout, CartLine, CartSummary, Product};
use crate::services::checkout;

/// Cart operations over the store.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    /// The raw cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user has no cart.
    pub async fn view(&self, user_id: UserId) -> Result<Cart> {
        self.carts
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("cart not found".to_string()))
    }

    /// Explicit get-or-create. The flag is `true` when the cart was created.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user does not exist.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<(Cart, bool)> {
        self.carts
            .get_or_create(user_id)
            .await
            .map_err(|e| user_not_found(e, user_id))
    }

    /// Add one occurrence of a product. Without an explicit price the
    /// catalog price is used.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown user, or for an unknown
    /// product when no price is supplied.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        price: Option<Price>,
    ) -> Result<Cart> {
        let price = match price {
            Some(price) => price,
            None => self.catalog_price(product_id).await?,
        };

        let cart = self
            .carts
            .add(user_id, product_id, price)
            .await
            .map_err(|e| user_not_found(e, user_id))?;

        tracing::info!(items = cart.product_ids.len(), total = %cart.total, "Added to cart");
        Ok(cart)
    }

    /// Remove one occurrence of a product.
    ///
    /// Without an explicit price the catalog price is used; ids whose product
    /// was deleted are removed at zero cost.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the cart is absent or does not contain
    /// the product.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
        price: Option<Price>,
    ) -> Result<Cart> {
        let price = match price {
            Some(price) => price,
            None => match self.products.get_by_id(product_id).await? {
                Some(product) => product.price,
                None => {
                    tracing::warn!("Removing product missing from catalog at zero cost");
                    Price::ZERO
                }
            },
        };

        match self.carts.remove(user_id, product_id, price).await? {
            RemoveOutcome::Removed(cart) => Ok(cart),
            RemoveOutcome::CartMissing => Err(AppError::NotFound("cart not found".to_string())),
            RemoveOutcome::ItemMissing => Err(AppError::NotFound(format!(
                "product {product_id} is not in the cart"
            ))),
        }
    }

    /// Empty the cart, keeping it present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user has no cart.
    pub async fn clear(&self, user_id: UserId) -> Result<Cart> {
        self.carts.clear(user_id).await.map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("cart not found".to_string()),
            other => other.into(),
        })
    }

    /// Number of items in the cart; zero when absent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<usize> {
        Ok(self
            .carts
            .get(user_id)
            .await?
            .map_or(0, |cart| cart.product_ids.len()))
    }

    /// The cart grouped by product with catalog data resolved.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user has no cart.
    pub async fn summary(&self, user_id: UserId) -> Result<CartSummary> {
        let cart = self.view(user_id).await?;
        let contents = cart.contents();
        let catalog = self.products.get_many(contents.product_ids()).await?;
        Ok(summarize(user_id, &contents, &catalog))
    }

    /// Build the checkout deep link for the cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the cart is absent or has no
    /// purchasable lines.
    pub async fn checkout(&self, user_id: UserId, phone: Option<&str>) -> Result<CartCheckout> {
        let summary = match self.summary(user_id).await {
            Ok(summary) => summary,
            Err(AppError::NotFound(_)) => return Err(empty_cart()),
            Err(other) => return Err(other),
        };
        if summary.lines.is_empty() {
            return Err(empty_cart());
        }

        let customer = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        Ok(checkout::build_checkout(phone, &customer.name, &summary))
    }

    async fn catalog_price(&self, product_id: ProductId) -> Result<Price> {
        self.products
            .get_by_id(product_id)
            .await?
            .map(|product| product.price)
            .ok_or_else(|| AppError::NotFound(format!("product {product_id} not found")))
    }
}

/// Group the multiset by product in first-seen order.
///
/// Ids with no matching product are reported in `missing_product_ids` and
/// left out of the subtotal.
#[must_use]
pub fn summarize(user_id: UserId, contents: &CartContents, catalog: &[Product]) -> CartSummary {
    let mut lines = Vec::new();
    let mut missing_product_ids = Vec::new();

    for (product_id, quantity) in contents.quantities() {
        match catalog.iter().find(|p| p.id == product_id) {
            Some(product) => lines.push(CartLine {
                unit_price: product.price,
                line_total: product.price.times(quantity),
                quantity,
                product: product.clone(),
            }),
            None => missing_product_ids.push(product_id),
        }
    }

    CartSummary {
        user_id,
        subtotal: lines.iter().map(|line| line.line_total).sum(),
        item_count: contents.item_count(),
        lines,
        missing_product_ids,
    }
}

fn user_not_found(e: RepositoryError, user_id: UserId) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound(format!("user {user_id} not found")),
        other => other.into(),
    }
}

fn empty_cart() -> AppError {
    AppError::BadRequest("cart is empty".to_string())
}
