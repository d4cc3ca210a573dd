pub mod error;
pub mod order;
pub mod retry;
pub mod service;
pub mod status;

pub use common::{OrderId, ProductId};
pub use error::{FulfillmentError, Result};
pub use order::{Order, OrderItem, OrderLine};
pub use service::OrderFulfillment;
pub use status::OrderStatus;
