use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use pressroom_catalog::Selection;
use pressroom_order::{Address, Order};
use pressroom_quote::CustomerInfo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    catalog::{default_true, find_active_product, QuantityInput},
    error::AppError,
    events,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub product_slug: String,
    #[serde(default)]
    pub selections: Vec<Selection>,
    #[serde(default)]
    pub quantity: QuantityInput,
    pub customer: CustomerInfo,
    pub shipping_address: Address,
    #[serde(default = "default_true")]
    pub include_vat: bool,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    pub session_id: String,
    /// Hosted payment page to redirect the customer to
    pub checkout_url: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/checkout", post(checkout))
        .route("/v1/orders/{id}", get(get_order))
        .route("/v1/orders/{id}/checkout", post(pay_order))
}

/// Open a checkout session for a stored order and persist the session reference.
async fn start_payment(state: &AppState, order: &mut Order) -> Result<CheckoutResponse, AppError> {
    let (success_url, cancel_url) = state.checkout_urls();
    let session = state.payments.start_checkout(order, &success_url, &cancel_url).await?;
    state.orders.update(order).await?;

    Ok(CheckoutResponse {
        order: order.clone(),
        session_id: session.id,
        checkout_url: session.url,
    })
}

/// POST /v1/checkout
/// Price the configured product, record a pending order and hand off to the payment page
async fn checkout(
    State(state): State<AppState>,
    Json(req): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<CheckoutResponse>), AppError> {
    let product = find_active_product(&state, &req.product_slug).await?;
    let quantity = req.quantity.resolve();

    let breakdown = state.pricing.price_product(&product, &req.selections, quantity, req.include_vat)?;
    let options = product.resolve_selections(&req.selections)?;
    let mut order = Order::from_configured_product(
        &product,
        options,
        &breakdown,
        req.customer,
        req.shipping_address,
        req.include_vat,
    )?;

    state.orders.create(&order).await?;
    tracing::info!(order_number = %order.order_number, total = %order.total, "Order created");

    let response = start_payment(&state, &mut order).await?;
    state.notify(events::order_placed(&order)).await;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /v1/orders/{id}
async fn get_order(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Order not found: {}", id)))?;
    Ok(Json(order))
}

/// POST /v1/orders/{id}/checkout
/// Pay for an order that is still awaiting payment, typically one converted from a quote
async fn pay_order(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CheckoutResponse>, AppError> {
    let mut order = state
        .orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Order not found: {}", id)))?;

    let response = start_payment(&state, &mut order).await?;
    Ok(Json(response))
}
