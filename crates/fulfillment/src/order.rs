//! Order records and line-item normalization.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::{FulfillmentError, Result};
use crate::status::OrderStatus;

/// An order as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item of a committed order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
}

/// One requested (product, quantity) pair within an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl OrderLine {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Validates and normalizes requested order lines.
///
/// Rejects an empty list and non-positive quantities before any store
/// access. Lines are sorted by product ID and duplicates are merged by
/// summing their quantities, so every transaction acquires row locks in
/// one global order and never locks the same row twice. Two concurrent
/// orders over overlapping product sets therefore cannot deadlock.
pub fn normalize_lines(lines: &[OrderLine]) -> Result<Vec<OrderLine>> {
    if lines.is_empty() {
        return Err(FulfillmentError::Validation(
            "order must contain at least one line".to_string(),
        ));
    }
    for line in lines {
        if line.quantity <= 0 {
            return Err(FulfillmentError::Validation(format!(
                "quantity for product {} must be positive, got {}",
                line.product_id, line.quantity
            )));
        }
    }

    let mut normalized: Vec<OrderLine> = lines.to_vec();
    normalized.sort_by_key(|line| line.product_id);

    let mut merged: Vec<OrderLine> = Vec::with_capacity(normalized.len());
    for line in normalized {
        match merged.last_mut() {
            Some(last) if last.product_id == line.product_id => {
                last.quantity += line.quantity;
            }
            _ => merged.push(line),
        }
    }
    Ok(merged)
}
