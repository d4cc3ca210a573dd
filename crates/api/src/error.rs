//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog::CatalogError;
use fulfillment::FulfillmentError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Catalogue error.
    Catalog(CatalogError),
    /// Order placement or lifecycle error.
    Fulfillment(FulfillmentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Catalog(err) => catalog_error_to_response(err),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn catalog_error_to_response(err: CatalogError) -> (StatusCode, String) {
    match &err {
        CatalogError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CatalogError::InvalidQuantity { .. } | CatalogError::Database(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, String) {
    match &err {
        FulfillmentError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        FulfillmentError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        FulfillmentError::Catalog(catalog_err) => match catalog_err {
            CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
            CatalogError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        },
        FulfillmentError::InsufficientStock { .. } | FulfillmentError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        FulfillmentError::ConflictExhausted { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        FulfillmentError::UnknownStatus(_) | FulfillmentError::Database(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, ProductId};
    use fulfillment::OrderStatus;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ApiError::Fulfillment(FulfillmentError::Validation("empty".into()));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_product_maps_to_not_found() {
        let err = ApiError::Fulfillment(FulfillmentError::Catalog(CatalogError::NotFound(
            ProductId::new(),
        )));
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);

        let err = ApiError::Catalog(CatalogError::NotFound(ProductId::new()));
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn insufficient_stock_maps_to_conflict() {
        let err = ApiError::Fulfillment(FulfillmentError::InsufficientStock {
            product_id: ProductId::new(),
            requested: 5,
            available: 2,
        });
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_transition_maps_to_conflict() {
        let err = ApiError::Fulfillment(FulfillmentError::InvalidTransition {
            from: OrderStatus::Created,
            to: OrderStatus::Completed,
        });
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn conflict_exhausted_maps_to_service_unavailable() {
        let err = ApiError::Fulfillment(FulfillmentError::ConflictExhausted { attempts: 5 });
        assert_eq!(status_of(err), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn missing_order_maps_to_not_found() {
        let err = ApiError::Fulfillment(FulfillmentError::OrderNotFound(OrderId::new()));
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }
}
