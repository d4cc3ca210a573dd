use common::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the product catalogue.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input failed validation before reaching the store.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The referenced product does not exist.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// A decrement was requested that would take stock below zero.
    ///
    /// Callers are expected to check availability under the row lock
    /// before decrementing, so hitting this indicates a caller bug.
    #[error("Invalid quantity for product {product_id}: requested {requested}")]
    InvalidQuantity {
        product_id: ProductId,
        requested: i64,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for catalogue operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
