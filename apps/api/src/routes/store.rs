//! `/store` handlers: inventory and orders.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::AuthPrincipal;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;
use petstore_core::{authorize, Action, CoreError, Inventory, Order, OrderId, OrderPatch, PetId, ORDER_QUANTITY};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub pet_id: PetId,
    /// Defaults to 1; anything else is rejected.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub ship_date: Option<DateTime<Utc>>,
}

fn default_quantity() -> i64 {
    ORDER_QUANTITY
}

/// `GET /store/inventory`
pub async fn inventory(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<Json<Inventory>> {
    authorize(&principal, Action::ViewInventory, None).into_result()?;

    let inventory = state.db.pets().inventory().await?;
    Ok(Json(inventory))
}

/// `POST /store/order`
///
/// The order always belongs to the caller.
pub async fn place_order(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiJson(body): ApiJson<PlaceOrderRequest>,
) -> ApiResult<Json<Order>> {
    let order = state
        .engine
        .place_order(&principal, body.pet_id, body.quantity, body.ship_date)
        .await?;

    Ok(Json(order))
}

/// `GET /store/order/{orderId}`
pub async fn get_order(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(order_id): ApiPath<OrderId>,
) -> ApiResult<Json<Order>> {
    let order = state
        .db
        .orders()
        .get_by_id(order_id)
        .await?
        .ok_or(CoreError::OrderNotFound(order_id))?;

    authorize(&principal, Action::ViewOrder, Some(order.user_id)).into_result()?;

    Ok(Json(order))
}

/// `PUT /store/order/{orderId}`
pub async fn update_order(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(order_id): ApiPath<OrderId>,
    ApiJson(patch): ApiJson<OrderPatch>,
) -> ApiResult<Json<Order>> {
    let order = state.engine.update_order(&principal, order_id, &patch).await?;
    Ok(Json(order))
}

/// `DELETE /store/order/{orderId}`
///
/// Returns the cancelled order as it was.
pub async fn cancel_order(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ApiPath(order_id): ApiPath<OrderId>,
) -> ApiResult<Json<Order>> {
    let order = state.engine.cancel_order(&principal, order_id).await?;
    Ok(Json(order))
}
