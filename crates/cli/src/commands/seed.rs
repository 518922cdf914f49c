//! Seed the catalog from a YAML file.
//!
//! The file lists categories and products using the same field names the API
//! accepts. Seeding is idempotent: categories are matched by name and
//! products whose name already exists are skipped.
//!
//! ```yaml
//! categories:
//!   - name: Computadoras
//!     description: Laptops y equipos de escritorio
//! products:
//!   - name: Laptop Profesional
//!     price: 1299.99
//!     category: Computadoras
//!     quantity: 10
//! ```

use std::collections::HashSet;
use std::path::Path;

use lumina_api::db::{CategoryRepository, ProductRepository, RepositoryError};
use lumina_api::models::{CategoryFields, ProductFields, ValidationError};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use super::{CommandError, connect};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid entry '{entry}': {source}")]
    Invalid {
        entry: String,
        source: ValidationError,
    },

    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Catalog file layout.
#[derive(Debug, Default, Deserialize)]
struct Catalog {
    #[serde(default)]
    categories: Vec<CategoryFields>,
    #[serde(default)]
    products: Vec<ProductFields>,
}

/// Load a catalog file into the database.
///
/// Every entry is validated before connecting, so a bad file writes nothing.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an entry fails
/// validation, or a database operation fails.
pub async fn catalog(path: &Path) -> Result<(), SeedError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let catalog: Catalog = serde_yaml::from_str(&content)?;

    let categories = catalog
        .categories
        .into_iter()
        .enumerate()
        .map(|(i, fields)| {
            let entry = fields.name.clone().unwrap_or_else(|| format!("category #{}", i + 1));
            fields
                .into_new()
                .map_err(|source| SeedError::Invalid { entry, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let products = catalog
        .products
        .into_iter()
        .enumerate()
        .map(|(i, fields)| {
            let entry = fields.name.clone().unwrap_or_else(|| format!("product #{}", i + 1));
            fields
                .into_new()
                .map_err(|source| SeedError::Invalid { entry, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        categories = categories.len(),
        products = products.len(),
        "Parsed catalog"
    );

    let pool = connect().await?;

    let category_repo = CategoryRepository::new(&pool);
    let mut created_categories = 0;
    for (name, description) in &categories {
        if category_repo.create_if_absent(name, description).await?.is_some() {
            created_categories += 1;
        } else {
            info!(category = %name, "Category exists, skipping");
        }
    }

    let product_repo = ProductRepository::new(&pool);
    let mut existing: HashSet<String> = product_repo
        .list()
        .await?
        .into_iter()
        .map(|product| product.name)
        .collect();

    let mut created_products = 0;
    for product in &products {
        if !existing.insert(product.name.clone()) {
            info!(product = %product.name, "Product exists, skipping");
            continue;
        }
        if !categories.iter().any(|(name, _)| *name == product.category) {
            warn!(
                product = %product.name,
                category = %product.category,
                "Product category is not in the catalog file"
            );
        }
        product_repo.create(product).await?;
        created_products += 1;
    }

    info!(
        categories = created_categories,
        products = created_products,
        "Seeding complete"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_accepts_api_field_names() {
        let catalog: Catalog = serde_yaml::from_str(
            r"
categories:
  - nombre: Audio
    descripcion: Auriculares y parlantes
products:
  - nombre: Auriculares Bluetooth
    precio: 89.99
    categoria: Audio
    stock: 25
",
        )
        .unwrap();

        assert_eq!(catalog.categories.len(), 1);
        let product = catalog.products.into_iter().next().unwrap().into_new().unwrap();
        assert_eq!(product.name, "Auriculares Bluetooth");
        assert_eq!(product.category, "Audio");
        assert_eq!(product.quantity, 25);
    }

    #[test]
    fn test_empty_sections_default() {
        let catalog: Catalog = serde_yaml::from_str("categories: []").unwrap();
        assert!(catalog.categories.is_empty());
        assert!(catalog.products.is_empty());
    }

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog: Catalog =
            serde_yaml::from_str(include_str!("../../seed/catalog.yaml")).unwrap();
        assert!(!catalog.categories.is_empty());
        for product in catalog.products {
            product.into_new().unwrap();
        }
    }
}
