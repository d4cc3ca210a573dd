use catalog::CatalogError;
use common::{OrderId, ProductId};
use thiserror::Error;

use crate::status::OrderStatus;

/// Errors that can occur during order placement and lifecycle updates.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Input failed validation; no store access has occurred.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Requested quantity exceeds the available stock for a product.
    /// The whole order has been rolled back.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// A status update does not follow the order lifecycle sequence.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Transient conflicts persisted past the retry budget.
    #[error("Order placement conflicted {attempts} times, giving up")]
    ConflictExhausted { attempts: u32 },

    /// A stored order carries a status string this version does not know.
    #[error("Unknown order status {0:?} in store")]
    UnknownStatus(String),

    /// Catalogue error (product lookup, lock, decrement).
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for fulfillment operations.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
