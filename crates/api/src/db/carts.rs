//! Cart repository for database operations.
//!
//! Every mutation is a single statement or a row-locked transaction, so
//! concurrent requests for the same user are applied one after another.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use lumina_core::{CartId, Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::Cart;

const CART_COLUMNS: &str = "id, user_id, product_ids, total, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    product_ids: Vec<ProductId>,
    total: Price,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_ids: row.product_ids,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Result of removing one occurrence of a product.
#[derive(Debug)]
pub enum RemoveOutcome {
    /// The occurrence was removed; the updated cart.
    Removed(Cart),
    /// The user has no cart.
    CartMissing,
    /// The cart exists but does not contain the product.
    ItemMissing,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row: Option<CartRow> =
            sqlx::query_as(&format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1"))
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Cart::from))
    }

    /// Get the user's cart, creating an empty one if absent.
    ///
    /// The flag is `true` when this call created the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_or_create(&self, user_id: UserId) -> Result<(Cart, bool), RepositoryError> {
        let inserted: Option<CartRow> = sqlx::query_as(&format!(
            r"
            INSERT INTO carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING {CART_COLUMNS}
            "
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::from_missing_parent)?;

        if let Some(row) = inserted {
            return Ok((row.into(), true));
        }

        let existing = self.get(user_id).await?.ok_or(RepositoryError::NotFound)?;
        Ok((existing, false))
    }

    /// Append one occurrence of `product_id` and add `price` to the total,
    /// creating the cart if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        price: Price,
    ) -> Result<Cart, RepositoryError> {
        let row: CartRow = sqlx::query_as(&format!(
            r"
            INSERT INTO carts (user_id, product_ids, total)
            VALUES ($1, ARRAY[$2]::INTEGER[], $3)
            ON CONFLICT (user_id) DO UPDATE SET
                product_ids = array_append(carts.product_ids, $2),
                total = carts.total + $3,
                updated_at = NOW()
            RETURNING {CART_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(product_id)
        .bind(price)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_missing_parent)?;

        Ok(row.into())
    }

    /// Remove one occurrence of `product_id`, subtracting `price` from the
    /// total without going below zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
        price: Price,
    ) -> Result<RemoveOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<CartRow> = sqlx::query_as(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(RemoveOutcome::CartMissing);
        };

        let mut contents = Cart::from(row).contents();
        if contents.remove(product_id, price).is_err() {
            return Ok(RemoveOutcome::ItemMissing);
        }
        let (product_ids, total) = contents.into_parts();

        let updated: CartRow = sqlx::query_as(&format!(
            r"
            UPDATE carts SET product_ids = $2, total = $3, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {CART_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&product_ids)
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RemoveOutcome::Removed(updated.into()))
    }

    /// Empty the cart but keep the row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no cart.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let row: Option<CartRow> = sqlx::query_as(&format!(
            r"
            UPDATE carts SET product_ids = '{{}}', total = 0, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {CART_COLUMNS}
            "
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Cart::from).ok_or(RepositoryError::NotFound)
    }
}
