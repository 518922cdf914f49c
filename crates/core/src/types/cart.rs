//! Cart multiset arithmetic.
//!
//! A cart holds a flat list of product ids where repetition encodes quantity,
//! plus a running total. All mutations keep the two in step; the storage
//! layer only persists what this type produces.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The product id does not occur in the cart.
    #[error("product {0} is not in the cart")]
    ItemNotInCart(ProductId),
}

/// The mutable contents of a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartContents {
    product_ids: Vec<ProductId>,
    total: Price,
}

impl CartContents {
    /// Rebuild contents from stored values.
    #[must_use]
    pub const fn new(product_ids: Vec<ProductId>, total: Price) -> Self {
        Self { product_ids, total }
    }

    /// Product ids in insertion order, duplicates included.
    #[must_use]
    pub fn product_ids(&self) -> &[ProductId] {
        &self.product_ids
    }

    /// Running total.
    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    /// Number of items (not distinct products).
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.product_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    /// How many times `product_id` occurs.
    #[must_use]
    pub fn count_of(&self, product_id: ProductId) -> u32 {
        let count = self.product_ids.iter().filter(|id| **id == product_id).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Append one occurrence and add `price` to the total.
    pub fn add(&mut self, product_id: ProductId, price: Price) {
        self.product_ids.push(product_id);
        self.total = self.total + price;
    }

    /// Remove one occurrence (the earliest) and subtract `price`, flooring
    /// the total at zero.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotInCart` and leaves the cart untouched if
    /// the id does not occur.
    pub fn remove(&mut self, product_id: ProductId, price: Price) -> Result<(), CartError> {
        let position = self
            .product_ids
            .iter()
            .position(|id| *id == product_id)
            .ok_or(CartError::ItemNotInCart(product_id))?;

        self.product_ids.remove(position);
        self.total = if self.product_ids.is_empty() {
            Price::ZERO
        } else {
            self.total.saturating_sub(price)
        };
        Ok(())
    }

    /// Empty the cart and reset the total.
    pub fn clear(&mut self) {
        self.product_ids.clear();
        self.total = Price::ZERO;
    }

    /// Distinct product ids with their quantities, in first-seen order.
    #[must_use]
    pub fn quantities(&self) -> Vec<(ProductId, u32)> {
        let mut grouped: Vec<(ProductId, u32)> = Vec::new();
        for id in &self.product_ids {
            match grouped.iter_mut().find(|(seen, _)| seen == id) {
                Some((_, quantity)) => *quantity += 1,
                None => grouped.push((*id, 1)),
            }
        }
        grouped
    }

    /// Consume into the stored representation.
    #[must_use]
    pub fn into_parts(self) -> (Vec<ProductId>, Price) {
        (self.product_ids, self.total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pid(n: i32) -> ProductId {
        ProductId::new(n)
    }

    #[test]
    fn test_add_to_empty_cart() {
        let mut cart = CartContents::default();
        cart.add(pid(1), Price::from_units(1000));

        assert_eq!(cart.product_ids(), &[pid(1)]);
        assert_eq!(cart.total(), Price::from_units(1000));
    }

    #[test]
    fn test_add_same_product_twice() {
        let mut cart = CartContents::default();
        cart.add(pid(1), Price::from_units(250));
        cart.add(pid(1), Price::from_units(250));

        assert_eq!(cart.count_of(pid(1)), 2);
        assert_eq!(cart.total(), Price::from_units(500));
    }

    #[test]
    fn test_remove_takes_one_occurrence() {
        let mut cart = CartContents::default();
        cart.add(pid(1), Price::from_units(10));
        cart.add(pid(2), Price::from_units(4));
        cart.add(pid(1), Price::from_units(10));

        cart.remove(pid(1), Price::from_units(10)).unwrap();

        assert_eq!(cart.product_ids(), &[pid(2), pid(1)]);
        assert_eq!(cart.total(), Price::from_units(14));
    }

    #[test]
    fn test_remove_missing_item_fails_without_change() {
        let mut cart = CartContents::default();
        cart.add(pid(1), Price::from_units(10));
        let before = cart.clone();

        let err = cart.remove(pid(9), Price::from_units(10)).unwrap_err();

        assert_eq!(err, CartError::ItemNotInCart(pid(9)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_never_goes_negative() {
        let mut cart = CartContents::new(vec![pid(1), pid(1)], Price::from_units(3));
        cart.remove(pid(1), Price::from_units(50)).unwrap();
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_removing_last_item_zeroes_total() {
        let mut cart = CartContents::new(vec![pid(4)], Price::from_units(7));
        cart.remove(pid(4), Price::from_units(5)).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_clear() {
        let mut cart = CartContents::new(vec![pid(1), pid(2)], Price::from_units(30));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_quantities_first_seen_order() {
        let cart = CartContents::new(
            vec![pid(3), pid(1), pid(3), pid(2), pid(1), pid(3)],
            Price::ZERO,
        );
        assert_eq!(cart.quantities(), vec![(pid(3), 3), (pid(1), 2), (pid(2), 1)]);
    }
}
