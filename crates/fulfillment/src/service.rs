//! Order placement and lifecycle orchestration.

use catalog::ProductCatalog;
use chrono::Utc;
use common::OrderId;
use metrics::counter;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{FulfillmentError, Result};
use crate::order::{Order, OrderItem, OrderLine, normalize_lines};
use crate::retry::{self, MAX_ATTEMPTS};
use crate::status::OrderStatus;

/// Places orders against the product catalogue.
///
/// All stock decisions go through the catalogue's row-locking primitives
/// inside a single transaction per order; nothing is cached in process.
#[derive(Clone)]
pub struct OrderFulfillment {
    pool: PgPool,
    catalog: ProductCatalog,
}

impl OrderFulfillment {
    /// Creates a fulfillment service over an existing pool and catalogue.
    ///
    /// The pool must be the same one the catalogue uses, so both sides of
    /// the placement transaction run on one connection.
    pub fn new(pool: PgPool, catalog: ProductCatalog) -> Self {
        Self { pool, catalog }
    }

    /// Atomically places an order for the given lines.
    ///
    /// On success the order exists with status [`OrderStatus::Created`],
    /// its items exactly match the deduplicated lines, and every
    /// referenced product has been decremented accordingly. On any
    /// failure the store is left exactly as it was: no order row, no
    /// items, no partial decrements.
    ///
    /// Transient conflicts (deadlock, serialization failure) are retried
    /// with backoff up to a fixed budget; see [`crate::retry`].
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn place_order(&self, lines: &[OrderLine]) -> Result<OrderId> {
        // Validation and lock-order normalization happen before any
        // store access.
        let lines = normalize_lines(lines)?;

        let mut attempt = 1;
        loop {
            match self.try_place(&lines).await {
                Ok(order_id) => {
                    counter!("fulfillment_orders_placed_total").increment(1);
                    tracing::info!(%order_id, attempt, "order placed");
                    return Ok(order_id);
                }
                Err(err) if retry::is_retryable(&err) => {
                    counter!("fulfillment_order_conflicts_total").increment(1);
                    if attempt >= MAX_ATTEMPTS {
                        tracing::warn!(attempt, error = %err, "conflict retry budget exhausted");
                        return Err(FulfillmentError::ConflictExhausted {
                            attempts: attempt,
                        });
                    }
                    let backoff = retry::backoff_for_attempt(attempt);
                    tracing::debug!(attempt, backoff_ms = backoff.as_millis() as u64, error = %err,
                        "transient conflict, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    if matches!(err, FulfillmentError::InsufficientStock { .. }) {
                        counter!("fulfillment_insufficient_stock_total").increment(1);
                    }
                    return Err(err);
                }
            }
        }
    }

    /// One placement attempt inside one transaction.
    ///
    /// The `Transaction` guard rolls back on drop, so every early return
    /// below leaves the store untouched; only the final `commit` makes
    /// the order visible.
    async fn try_place(&self, lines: &[OrderLine]) -> Result<OrderId> {
        let mut tx = self.pool.begin().await?;

        let order_id = OrderId::new();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO orders (id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(OrderStatus::Created.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Lines are pre-sorted; locks are taken in global product-ID
        // order.
        for line in lines {
            let available = self
                .catalog
                .lock_for_decrement(&mut *tx, line.product_id)
                .await?;
            if available < line.quantity {
                return Err(FulfillmentError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                });
            }

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(order_id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            self.catalog
                .decrement(&mut *tx, line.product_id, line.quantity)
                .await?;
        }

        tx.commit().await?;
        Ok(order_id)
    }

    /// Advances an order to the next lifecycle status.
    ///
    /// Rejects any transition that is not the immediate successor of the
    /// current status. The current status is read under a row lock so
    /// concurrent transitions on the same order serialize.
    #[tracing::instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        let current = parse_status(&row)?;
        if !current.can_transition_to(new_status) {
            return Err(FulfillmentError::InvalidTransition {
                from: current,
                to: new_status,
            });
        }

        sqlx::query("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(new_status.as_str())
            .bind(Utc::now())
            .bind(order_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(%order_id, from = %current, to = %new_status, "order status updated");
        Ok(())
    }

    /// Loads an order by ID.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        let row = sqlx::query(
            "SELECT id, status, created_at, updated_at FROM orders WHERE id = $1",
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_order(row),
            None => Err(FulfillmentError::OrderNotFound(order_id)),
        }
    }

    /// Lists all orders, newest first.
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT id, status, created_at, updated_at FROM orders ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_order).collect()
    }

    /// Lists the items of one order, in lock-acquisition order.
    pub async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY product_id ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_order_item).collect()
    }

    /// Lists all order items.
    pub async fn list_order_items(&self) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            "SELECT order_id, product_id, quantity FROM order_items ORDER BY order_id, product_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_order_item).collect()
    }
}

fn parse_status(row: &PgRow) -> Result<OrderStatus> {
    let raw: String = row.try_get("status")?;
    OrderStatus::parse(&raw).ok_or(FulfillmentError::UnknownStatus(raw))
}

fn row_to_order(row: PgRow) -> Result<Order> {
    let status = parse_status(&row)?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_order_item(row: PgRow) -> Result<OrderItem> {
    Ok(OrderItem {
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        product_id: common::ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        quantity: row.try_get("quantity")?,
    })
}
