//! Product domain types and payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lumina_core::{Price, ProductId};

use super::{ValidationError, non_blank};

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub description: String,
    /// Category name. Not a foreign key; renaming a category does not
    /// touch its products.
    pub category: String,
    pub quantity: i32,
    /// Stored file name (served under `/uploads/products/`) or absolute URL.
    pub cover_image: Option<String>,
    pub gallery: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for inserting a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub description: String,
    pub category: String,
    pub quantity: i32,
    pub cover_image: Option<String>,
    pub gallery: Vec<String>,
}

/// Patch applied by product update. `None` preserves the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i32>,
    pub cover_image: Option<String>,
    pub gallery: Option<Vec<String>>,
}

/// Product fields as sent by clients, either as JSON or as multipart text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFields {
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
    #[serde(default, alias = "precio")]
    pub price: Option<Price>,
    #[serde(default, alias = "descripcion")]
    pub description: Option<String>,
    #[serde(default, alias = "categoria")]
    pub category: Option<String>,
    #[serde(default, alias = "stock")]
    pub quantity: Option<i64>,
    #[serde(default, alias = "portada", alias = "image")]
    pub cover_image: Option<String>,
    #[serde(default, alias = "galeria")]
    pub gallery: Option<Vec<String>>,
}

impl ProductFields {
    /// Validate a create payload.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when `name` or `price` is missing, or when
    /// `quantity` is negative.
    pub fn into_new(self) -> Result<NewProduct, ValidationError> {
        let name = non_blank(self.name).ok_or_else(|| ValidationError::new("name is required"))?;
        let price = self
            .price
            .ok_or_else(|| ValidationError::new("price is required"))?;
        let quantity = match self.quantity {
            Some(q) => validate_quantity(q)?,
            None => 0,
        };

        Ok(NewProduct {
            name,
            price,
            description: self.description.unwrap_or_default().trim().to_owned(),
            category: self.category.unwrap_or_default().trim().to_owned(),
            quantity,
            cover_image: non_blank(self.cover_image),
            gallery: clean_gallery(self.gallery.unwrap_or_default()),
        })
    }

    /// Validate an update payload. Absent fields stay absent.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when `name` is blank or `quantity` negative.
    pub fn into_changes(self) -> Result<ProductChanges, ValidationError> {
        let name = match self.name {
            Some(name) => Some(
                non_blank(Some(name)).ok_or_else(|| ValidationError::new("name cannot be empty"))?,
            ),
            None => None,
        };
        let quantity = self.quantity.map(validate_quantity).transpose()?;

        Ok(ProductChanges {
            name,
            price: self.price,
            description: self.description.map(|d| d.trim().to_owned()),
            category: self.category.map(|c| c.trim().to_owned()),
            quantity,
            cover_image: non_blank(self.cover_image),
            gallery: self.gallery.map(clean_gallery),
        })
    }
}

fn validate_quantity(quantity: i64) -> Result<i32, ValidationError> {
    if quantity < 0 {
        return Err(ValidationError::new("quantity cannot be negative"));
    }
    i32::try_from(quantity).map_err(|_| ValidationError::new("quantity is too large"))
}

fn clean_gallery(gallery: Vec<String>) -> Vec<String> {
    gallery
        .into_iter()
        .filter_map(|entry| non_blank(Some(entry)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_aliases_deserialize() {
        let fields: ProductFields = serde_json::from_str(
            r#"{"nombre":"Collar Luna","precio":85000,"categoria":"Collares",
                "stock":3,"portada":"luna.jpg","galeria":["a.jpg","b.jpg"]}"#,
        )
        .unwrap();

        let product = fields.into_new().unwrap();
        assert_eq!(product.name, "Collar Luna");
        assert_eq!(product.price, Price::from_units(85000));
        assert_eq!(product.category, "Collares");
        assert_eq!(product.quantity, 3);
        assert_eq!(product.cover_image.as_deref(), Some("luna.jpg"));
        assert_eq!(product.gallery, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_create_requires_name_and_price() {
        let missing_name: ProductFields = serde_json::from_str(r#"{"price":10}"#).unwrap();
        assert!(missing_name.into_new().is_err());

        let missing_price: ProductFields = serde_json::from_str(r#"{"name":"Anillo"}"#).unwrap();
        assert!(missing_price.into_new().is_err());
    }

    #[test]
    fn test_negative_values_rejected() {
        let negative_qty: ProductFields =
            serde_json::from_str(r#"{"name":"Anillo","price":10,"quantity":-1}"#).unwrap();
        assert!(negative_qty.into_new().is_err());

        assert!(serde_json::from_str::<ProductFields>(r#"{"price":-5}"#).is_err());
    }

    #[test]
    fn test_changes_preserve_absent_fields() {
        let fields: ProductFields = serde_json::from_str(r#"{"price":12.5}"#).unwrap();
        let changes = fields.into_changes().unwrap();

        assert!(changes.price.is_some());
        assert!(changes.name.is_none());
        assert!(changes.cover_image.is_none());
        assert!(changes.gallery.is_none());
    }

    #[test]
    fn test_changes_reject_blank_name() {
        let fields: ProductFields = serde_json::from_str(r#"{"name":"  "}"#).unwrap();
        assert!(fields.into_changes().is_err());
    }
}
