//! Product catalogue endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use catalog::{NewProduct, Product};
use common::ProductId;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductCreatedResponse {
    pub id: String,
}

// -- Handlers --

/// POST /products — add a product to the catalogue.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(axum::http::StatusCode, Json<ProductCreatedResponse>), ApiError> {
    let product = NewProduct::new(req.name, req.description, req.quantity)?;
    let id = state.catalog.create(product).await?;

    let response = ProductCreatedResponse { id: id.to_string() };
    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

/// GET /products — list all products, newest first.
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.catalog.list().await?;
    Ok(Json(products))
}

/// GET /products/{id} — load one product.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product_id = parse_product_id(&id)?;
    let product = state.catalog.get(product_id).await?;
    Ok(Json(product))
}

pub(crate) fn parse_product_id(raw: &str) -> Result<ProductId, ApiError> {
    let uuid = uuid::Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid product id: {e}")))?;
    Ok(ProductId::from_uuid(uuid))
}
