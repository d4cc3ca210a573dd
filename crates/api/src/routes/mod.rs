pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use catalog::ProductCatalog;
use fulfillment::OrderFulfillment;

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: ProductCatalog,
    pub fulfillment: OrderFulfillment,
}
