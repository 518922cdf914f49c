//! Sample catalog shown when the product list cannot be fetched.
//!
//! This is degraded-mode display data, not a cache: it never reflects the
//! real catalog and is rebuilt on every call.

use lumina_core::{Price, ProductId};

use crate::types::Product;

const PLACEHOLDER_BASE: &str = "https://via.placeholder.com/300x225";

struct Sample {
    name: &'static str,
    units: u32,
    description: &'static str,
    category: &'static str,
    quantity: i32,
    color: &'static str,
    label: &'static str,
}

const SAMPLES: [Sample; 6] = [
    Sample {
        name: "Laptop Profesional",
        units: 2_500_000,
        description: "Laptop de alto rendimiento para profesionales y creativos",
        category: "Electrónica",
        quantity: 15,
        color: "4A90E2",
        label: "Laptop",
    },
    Sample {
        name: "Mouse Inalámbrico",
        units: 85_000,
        description: "Mouse ergonómico con conexión Bluetooth",
        category: "Accesorios",
        quantity: 45,
        color: "50C878",
        label: "Mouse",
    },
    Sample {
        name: "Teclado Mecánico",
        units: 320_000,
        description: "Teclado mecánico RGB para gamers",
        category: "Accesorios",
        quantity: 8,
        color: "FF6B6B",
        label: "Teclado",
    },
    Sample {
        name: "Monitor 27\"",
        units: 1_200_000,
        description: "Monitor Full HD con panel IPS",
        category: "Electrónica",
        quantity: 12,
        color: "9B59B6",
        label: "Monitor",
    },
    Sample {
        name: "Audífonos Bluetooth",
        units: 280_000,
        description: "Audífonos con cancelación de ruido",
        category: "Audio",
        quantity: 0,
        color: "F39C12",
        label: "Audifonos",
    },
    Sample {
        name: "Webcam HD",
        units: 195_000,
        description: "Cámara web 1080p con micrófono integrado",
        category: "Accesorios",
        quantity: 22,
        color: "1ABC9C",
        label: "Webcam",
    },
];

/// Six sample products with placeholder images, ids 1 through 6.
#[must_use]
pub fn fallback_products() -> Vec<Product> {
    (1..)
        .zip(SAMPLES.iter())
        .map(|(id, sample)| Product {
            id: ProductId::new(id),
            name: sample.name.to_string(),
            price: Price::from_units(sample.units),
            description: sample.description.to_string(),
            category: sample.category.to_string(),
            quantity: sample.quantity,
            cover_image: Some(format!(
                "{PLACEHOLDER_BASE}/{}/ffffff?text={}",
                sample.color, sample.label
            )),
            gallery: Vec::new(),
            created_at: None,
            updated_at: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_catalog_shape() {
        let products = fallback_products();

        assert_eq!(products.len(), 6);
        assert_eq!(products[0].id, ProductId::new(1));
        assert_eq!(products[5].id, ProductId::new(6));
        assert!(
            products
                .iter()
                .all(|p| p.cover_image.as_deref().is_some_and(|c| c.starts_with("https://")))
        );
        assert_eq!(
            products.iter().filter(|p| p.category == "Accesorios").count(),
            3
        );
    }
}
