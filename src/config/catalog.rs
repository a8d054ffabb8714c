//! Gas product catalog loading from config.toml
//!
//! The products defined in config.toml seed the `gas_products` table on startup.
//! Seeding is idempotent: products whose SKU already exists are left untouched.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the catalog file
#[derive(Debug, Deserialize)]
pub struct Catalog {
    /// Products to seed
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// Configuration for a single gas product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Stock keeping unit, unique
    pub sku: String,
    /// Display name
    pub name: String,
    /// Filled weight in kilograms
    pub size_kg: f64,
    /// Refill price
    pub unit_price: f64,
    /// Cylinder deposit, defaults to zero
    #[serde(default)]
    pub deposit_amount: f64,
}

/// Loads the product catalog from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!(
            "Failed to read catalog file {}: {e}",
            path.as_ref().display()
        ),
    })?;

    parse_catalog(&contents)
}

/// Parses catalog TOML text
pub fn parse_catalog(contents: &str) -> Result<Catalog> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog: {e}"),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let toml_str = r#"
            [[products]]
            sku = "CYL-20"
            name = "20kg Household"
            size_kg = 20.0
            unit_price = 780.0
            deposit_amount = 1500.0

            [[products]]
            sku = "CYL-4"
            name = "4kg Camping"
            size_kg = 4.0
            unit_price = 220.0
        "#;

        let catalog = parse_catalog(toml_str).unwrap();
        assert_eq!(catalog.products.len(), 2);
        assert_eq!(catalog.products[0].sku, "CYL-20");
        assert_eq!(catalog.products[0].deposit_amount, 1500.0);
        assert_eq!(catalog.products[1].deposit_amount, 0.0);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = parse_catalog("").unwrap();
        assert!(catalog.products.is_empty());
    }

    #[test]
    fn test_missing_field_is_config_error() {
        let result = parse_catalog("[[products]]\nsku = \"X\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_catalog("/nonexistent/catalog.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
