pub mod error;
pub mod product;
pub mod store;

pub use common::ProductId;
pub use error::{CatalogError, Result};
pub use product::{NewProduct, Product};
pub use store::ProductCatalog;
