//! PostgreSQL integration tests for order placement.
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p fulfillment --test postgres_integration
//! ```

use std::sync::Arc;

use catalog::{CatalogError, NewProduct, ProductCatalog};
use fulfillment::{
    FulfillmentError, OrderFulfillment, OrderId, OrderLine, OrderStatus, ProductId,
};
use sqlx::{PgPool, Row};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!("../../../migrations/001_create_tables.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Fresh catalogue + fulfillment service over one pool, cleared tables
async fn get_test_services() -> (ProductCatalog, OrderFulfillment) {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders, products")
        .execute(&pool)
        .await
        .unwrap();

    let catalog = ProductCatalog::new(pool.clone());
    let fulfillment = OrderFulfillment::new(pool, catalog.clone());
    (catalog, fulfillment)
}

async fn seed_product(catalog: &ProductCatalog, name: &str, quantity: i64) -> ProductId {
    catalog
        .create(NewProduct::new(name, "", quantity).unwrap())
        .await
        .unwrap()
}

async fn order_count(pool: &PgPool) -> i64 {
    sqlx::query("SELECT COUNT(*) AS n FROM orders")
        .fetch_one(pool)
        .await
        .unwrap()
        .try_get("n")
        .unwrap()
}

async fn order_item_count(pool: &PgPool) -> i64 {
    sqlx::query("SELECT COUNT(*) AS n FROM order_items")
        .fetch_one(pool)
        .await
        .unwrap()
        .try_get("n")
        .unwrap()
}

fn line(product_id: ProductId, quantity: i64) -> OrderLine {
    OrderLine::new(product_id, quantity)
}

#[tokio::test]
async fn place_order_decrements_stock_and_records_items() {
    let (catalog, fulfillment) = get_test_services().await;
    let p1 = seed_product(&catalog, "p1", 10).await;

    let order_id = fulfillment.place_order(&[line(p1, 7)]).await.unwrap();

    let order = fulfillment.get_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Created);

    let items = fulfillment.get_order_items(order_id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, p1);
    assert_eq!(items[0].quantity, 7);

    assert_eq!(catalog.get(p1).await.unwrap().quantity, 3);
}

#[tokio::test]
async fn insufficient_stock_leaves_quantity_untouched() {
    let (catalog, fulfillment) = get_test_services().await;
    let p1 = seed_product(&catalog, "p1", 10).await;

    fulfillment.place_order(&[line(p1, 7)]).await.unwrap();

    let err = fulfillment.place_order(&[line(p1, 5)]).await.unwrap_err();
    assert!(matches!(
        err,
        FulfillmentError::InsufficientStock {
            product_id,
            requested: 5,
            available: 3,
        } if product_id == p1
    ));

    assert_eq!(catalog.get(p1).await.unwrap().quantity, 3);
    assert_eq!(order_count(catalog.pool()).await, 1);
}

#[tokio::test]
async fn failing_line_rolls_back_the_whole_order() {
    let (catalog, fulfillment) = get_test_services().await;
    let p1 = seed_product(&catalog, "p1", 5).await;
    let p2 = seed_product(&catalog, "p2", 0).await;

    let err = fulfillment
        .place_order(&[line(p1, 3), line(p2, 1)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FulfillmentError::InsufficientStock { product_id, .. } if product_id == p2
    ));

    // No partial decrement from the p1 line, no orphan rows.
    assert_eq!(catalog.get(p1).await.unwrap().quantity, 5);
    assert_eq!(catalog.get(p2).await.unwrap().quantity, 0);
    assert_eq!(order_count(catalog.pool()).await, 0);
    assert_eq!(order_item_count(catalog.pool()).await, 0);
}

#[tokio::test]
async fn unknown_product_fails_without_creating_an_order() {
    let (catalog, fulfillment) = get_test_services().await;

    let err = fulfillment
        .place_order(&[line(ProductId::new(), 1)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FulfillmentError::Catalog(CatalogError::NotFound(_))
    ));

    assert_eq!(order_count(catalog.pool()).await, 0);
}

#[tokio::test]
async fn validation_happens_before_any_store_access() {
    let (catalog, fulfillment) = get_test_services().await;
    let p1 = seed_product(&catalog, "p1", 5).await;

    let err = fulfillment.place_order(&[]).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::Validation(_)));

    let err = fulfillment.place_order(&[line(p1, 0)]).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::Validation(_)));

    let err = fulfillment.place_order(&[line(p1, -2)]).await.unwrap_err();
    assert!(matches!(err, FulfillmentError::Validation(_)));

    assert_eq!(order_count(catalog.pool()).await, 0);
    assert_eq!(catalog.get(p1).await.unwrap().quantity, 5);
}

#[tokio::test]
async fn duplicate_lines_are_merged_into_one_item() {
    let (catalog, fulfillment) = get_test_services().await;
    let p1 = seed_product(&catalog, "p1", 10).await;

    let order_id = fulfillment
        .place_order(&[line(p1, 2), line(p1, 3)])
        .await
        .unwrap();

    let items = fulfillment.get_order_items(order_id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 5);
    assert_eq!(catalog.get(p1).await.unwrap().quantity, 5);
}

#[tokio::test]
async fn concurrent_orders_on_same_product_never_oversell() {
    let (catalog, fulfillment) = get_test_services().await;
    let p1 = seed_product(&catalog, "p1", 10).await;

    let f1 = fulfillment.clone();
    let f2 = fulfillment.clone();
    let a = tokio::spawn(async move { f1.place_order(&[line(p1, 6)]).await });
    let b = tokio::spawn(async move { f2.place_order(&[line(p1, 6)]).await });

    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    // Exactly one wins; the loser sees the post-commit quantity.
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let loser = if a.is_err() { a } else { b };
    assert!(matches!(
        loser.unwrap_err(),
        FulfillmentError::InsufficientStock {
            requested: 6,
            available: 4,
            ..
        }
    ));

    assert_eq!(catalog.get(p1).await.unwrap().quantity, 4);
    assert_eq!(order_count(catalog.pool()).await, 1);
}

#[tokio::test]
async fn overlapping_orders_in_opposite_input_order_both_complete() {
    let (catalog, fulfillment) = get_test_services().await;
    let p1 = seed_product(&catalog, "p1", 100).await;
    let p2 = seed_product(&catalog, "p2", 100).await;

    // Same product set, reversed input order. Normalization fixes the
    // lock order, so neither can deadlock the other.
    let f1 = fulfillment.clone();
    let f2 = fulfillment.clone();
    let a = tokio::spawn(async move { f1.place_order(&[line(p1, 10), line(p2, 20)]).await });
    let b = tokio::spawn(async move { f2.place_order(&[line(p2, 5), line(p1, 15)]).await });

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(catalog.get(p1).await.unwrap().quantity, 75);
    assert_eq!(catalog.get(p2).await.unwrap().quantity, 75);
}

#[tokio::test]
async fn disjoint_orders_do_not_block_each_other() {
    let (catalog, fulfillment) = get_test_services().await;
    let p1 = seed_product(&catalog, "p1", 10).await;
    let p2 = seed_product(&catalog, "p2", 10).await;

    let f1 = fulfillment.clone();
    let f2 = fulfillment.clone();
    let a = tokio::spawn(async move { f1.place_order(&[line(p1, 10)]).await });
    let b = tokio::spawn(async move { f2.place_order(&[line(p2, 10)]).await });

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(catalog.get(p1).await.unwrap().quantity, 0);
    assert_eq!(catalog.get(p2).await.unwrap().quantity, 0);
}

#[tokio::test]
async fn stock_is_conserved_across_mixed_outcomes() {
    let (catalog, fulfillment) = get_test_services().await;
    let initial = 20;
    let p1 = seed_product(&catalog, "p1", initial).await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let f = fulfillment.clone();
        tasks.push(tokio::spawn(async move { f.place_order(&[line(p1, 3)]).await }));
    }
    for task in tasks {
        // Success or InsufficientStock, never anything else.
        match task.await.unwrap() {
            Ok(_) => {}
            Err(FulfillmentError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let remaining = catalog.get(p1).await.unwrap().quantity;
    assert!(remaining >= 0);

    let committed: i64 = sqlx::query(
        "SELECT COALESCE(SUM(quantity), 0) AS total FROM order_items WHERE product_id = $1",
    )
    .bind(p1.as_uuid())
    .fetch_one(catalog.pool())
    .await
    .unwrap()
    .try_get("total")
    .unwrap();

    assert_eq!(remaining + committed, initial);
}

#[tokio::test]
async fn status_walks_the_full_lifecycle() {
    let (catalog, fulfillment) = get_test_services().await;
    let p1 = seed_product(&catalog, "p1", 1).await;
    let order_id = fulfillment.place_order(&[line(p1, 1)]).await.unwrap();

    for next in [
        OrderStatus::Assembled,
        OrderStatus::InTransit,
        OrderStatus::AtPickupPoint,
        OrderStatus::Completed,
    ] {
        fulfillment
            .update_order_status(order_id, next)
            .await
            .unwrap();
        assert_eq!(fulfillment.get_order(order_id).await.unwrap().status, next);
    }
}

#[tokio::test]
async fn status_skip_and_repeat_are_rejected() {
    let (catalog, fulfillment) = get_test_services().await;
    let p1 = seed_product(&catalog, "p1", 1).await;
    let order_id = fulfillment.place_order(&[line(p1, 1)]).await.unwrap();

    // Skip
    let err = fulfillment
        .update_order_status(order_id, OrderStatus::InTransit)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FulfillmentError::InvalidTransition {
            from: OrderStatus::Created,
            to: OrderStatus::InTransit,
        }
    ));

    // Repeat
    let err = fulfillment
        .update_order_status(order_id, OrderStatus::Created)
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::InvalidTransition { .. }));

    // Backwards
    fulfillment
        .update_order_status(order_id, OrderStatus::Assembled)
        .await
        .unwrap();
    let err = fulfillment
        .update_order_status(order_id, OrderStatus::Created)
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::InvalidTransition { .. }));

    assert_eq!(
        fulfillment.get_order(order_id).await.unwrap().status,
        OrderStatus::Assembled
    );
}

#[tokio::test]
async fn status_update_on_unknown_order_is_not_found() {
    let (_catalog, fulfillment) = get_test_services().await;
    let missing = OrderId::new();

    let err = fulfillment
        .update_order_status(missing, OrderStatus::Assembled)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FulfillmentError::OrderNotFound(id) if id == missing
    ));
}

#[tokio::test]
async fn list_orders_and_items_reflect_placements() {
    let (catalog, fulfillment) = get_test_services().await;
    let p1 = seed_product(&catalog, "p1", 10).await;
    let p2 = seed_product(&catalog, "p2", 10).await;

    let first = fulfillment.place_order(&[line(p1, 1)]).await.unwrap();
    let second = fulfillment
        .place_order(&[line(p1, 2), line(p2, 3)])
        .await
        .unwrap();

    let orders = fulfillment.list_orders().await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, second);
    assert_eq!(orders[1].id, first);

    let items = fulfillment.list_order_items().await.unwrap();
    assert_eq!(items.len(), 3);
}
