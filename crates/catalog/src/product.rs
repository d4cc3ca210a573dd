//! Product record and creation input.

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// A product as stored in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Quantity on hand. Never negative.
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    name: String,
    description: String,
    quantity: i64,
}

impl NewProduct {
    /// Validates and builds a product creation request.
    ///
    /// The name must be non-empty after trimming and the initial quantity
    /// must not be negative. The description may be empty.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        quantity: i64,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogError::Validation(
                "product name cannot be empty".to_string(),
            ));
        }
        if quantity < 0 {
            return Err(CatalogError::Validation(format!(
                "initial quantity cannot be negative, got {quantity}"
            )));
        }
        Ok(Self {
            name,
            description: description.into(),
            quantity,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_accepts_valid_input() {
        let p = NewProduct::new("Widget", "A widget", 10).unwrap();
        assert_eq!(p.name(), "Widget");
        assert_eq!(p.description(), "A widget");
        assert_eq!(p.quantity(), 10);
    }

    #[test]
    fn new_product_accepts_zero_quantity() {
        let p = NewProduct::new("Widget", "", 0).unwrap();
        assert_eq!(p.quantity(), 0);
    }

    #[test]
    fn new_product_rejects_empty_name() {
        let err = NewProduct::new("", "desc", 1).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn new_product_rejects_whitespace_name() {
        let err = NewProduct::new("   ", "desc", 1).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn new_product_rejects_negative_quantity() {
        let err = NewProduct::new("Widget", "desc", -1).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn new_product_allows_empty_description() {
        let p = NewProduct::new("Widget", "", 5).unwrap();
        assert_eq!(p.description(), "");
    }
}
