//! PostgreSQL-backed product catalogue.
//!
//! The catalogue is the only component that mutates product quantities.
//! Decrements happen in two steps inside a caller-owned transaction:
//! [`ProductCatalog::lock_for_decrement`] takes the row lock and returns
//! the current quantity, then [`ProductCatalog::decrement`] applies the
//! write. Splitting the read from the write lets the caller decide
//! whether to proceed while the lock is held, which is what makes the
//! check race-free.

use chrono::Utc;
use common::ProductId;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::error::{CatalogError, Result};
use crate::product::{NewProduct, Product};

/// PostgreSQL-backed product catalogue.
#[derive(Clone)]
pub struct ProductCatalog {
    pool: PgPool,
}

impl ProductCatalog {
    /// Creates a catalogue over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Inserts a new product and returns its generated ID.
    #[tracing::instrument(skip(self, product), fields(name = product.name()))]
    pub async fn create(&self, product: NewProduct) -> Result<ProductId> {
        let id = ProductId::new();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(product.name())
        .bind(product.description())
        .bind(product.quantity())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::info!(product_id = %id, quantity = product.quantity(), "product created");
        Ok(id)
    }

    /// Loads a product by ID.
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, quantity, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_product(row),
            None => Err(CatalogError::NotFound(id)),
        }
    }

    /// Lists all products, newest first.
    pub async fn list(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, quantity, created_at, updated_at
            FROM products
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_product).collect()
    }

    /// Takes an exclusive row lock on the product and returns its current
    /// quantity.
    ///
    /// Must be called inside an open transaction; the lock is held until
    /// that transaction commits or rolls back. Every decrement decision
    /// must read through this lock, otherwise a concurrent writer can
    /// invalidate the quantity between the read and the write.
    pub async fn lock_for_decrement(
        &self,
        conn: &mut PgConnection,
        id: ProductId,
    ) -> Result<i64> {
        let row = sqlx::query("SELECT quantity FROM products WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => Ok(row.try_get("quantity")?),
            None => Err(CatalogError::NotFound(id)),
        }
    }

    /// Reduces the product's quantity by `quantity` and refreshes
    /// `updated_at`.
    ///
    /// The caller must hold the row lock via
    /// [`ProductCatalog::lock_for_decrement`] and must have verified that
    /// enough stock is available. The `quantity >= $1` guard in the WHERE
    /// clause backstops that contract.
    pub async fn decrement(
        &self,
        conn: &mut PgConnection,
        id: ProductId,
        quantity: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity - $1, updated_at = $2
            WHERE id = $3 AND quantity >= $1
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::InvalidQuantity {
                product_id: id,
                requested: quantity,
            });
        }
        Ok(())
    }
}

fn row_to_product(row: PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        quantity: row.try_get("quantity")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
