//! Order placement and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use fulfillment::{Order, OrderItem, OrderLine, OrderStatus};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;
use crate::routes::products::parse_product_id;

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: String,
    pub status: OrderStatus,
}

// -- Handlers --

/// POST /orders — atomically place a multi-line order.
#[tracing::instrument(skip(state, req))]
pub async fn place(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderPlacedResponse>), ApiError> {
    let mut lines = Vec::with_capacity(req.lines.len());
    for line in &req.lines {
        lines.push(OrderLine::new(
            parse_product_id(&line.product_id)?,
            line.quantity,
        ));
    }

    let order_id = state.fulfillment.place_order(&lines).await?;

    let response = OrderPlacedResponse {
        order_id: order_id.to_string(),
        status: OrderStatus::Created,
    };
    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

/// GET /orders — list all orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state.fulfillment.list_orders().await?;
    Ok(Json(orders))
}

/// GET /orders/{id} — load one order.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.fulfillment.get_order(order_id).await?;
    Ok(Json(order))
}

/// GET /orders/{id}/items — list the items of one order.
#[tracing::instrument(skip(state))]
pub async fn items(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderItem>>, ApiError> {
    let order_id = parse_order_id(&id)?;
    // Surface NotFound for an absent order rather than an empty list.
    state.fulfillment.get_order(order_id).await?;
    let items = state.fulfillment.get_order_items(order_id).await?;
    Ok(Json(items))
}

/// GET /order-items — list all order items.
#[tracing::instrument(skip(state))]
pub async fn list_items(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OrderItem>>, ApiError> {
    let items = state.fulfillment.list_order_items().await?;
    Ok(Json(items))
}

/// POST /orders/{id}/status — advance an order to the next lifecycle status.
#[tracing::instrument(skip(state, req))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status = OrderStatus::parse(&req.status)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", req.status)))?;

    state.fulfillment.update_order_status(order_id, status).await?;
    let order = state.fulfillment.get_order(order_id).await?;
    Ok(Json(order))
}

fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
