use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, events, state::AppState};
use pressroom_order::OrderStatus;

#[derive(Debug, Deserialize)]
pub struct PaymentWebhook {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: SessionObject,
}

/// Only the id is read; everything else is re-fetched from the gateway.
#[derive(Debug, Deserialize)]
pub struct SessionObject {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

const HANDLED_EVENTS: [&str; 4] = [
    "checkout.session.completed",
    "checkout.session.async_payment_succeeded",
    "checkout.session.expired",
    "checkout.session.async_payment_failed",
];

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/webhooks/payments", post(handle_payment_webhook))
}

/// POST /v1/webhooks/payments
/// Receive checkout session updates from the payment gateway
async fn handle_payment_webhook(
    State(state): State<AppState>,
    Json(payload): Json<PaymentWebhook>,
) -> Result<Json<WebhookAck>, AppError> {
    tracing::info!("Received webhook {}: {} for session {}", payload.id, payload.type_, payload.data.object.id);

    if !HANDLED_EVENTS.contains(&payload.type_.as_str()) {
        tracing::debug!(event_type = %payload.type_, "Ignoring webhook event");
        return Ok(Json(WebhookAck { received: true }));
    }

    let session = state.payments.process_status_update(&payload.data.object.id).await?;

    let mut order = state
        .orders
        .get(session.order_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Order not found: {}", session.order_id)))?;

    if order.payment_reference.as_deref() != Some(session.id.as_str()) {
        tracing::info!(
            order_number = %order.order_number,
            session_id = %session.id,
            status = ?session.status,
            "Webhook for a checkout session the order has replaced"
        );
    }

    if !order.apply_session_status(&session.id, session.status)? {
        tracing::debug!(order_number = %order.order_number, status = %order.status, "Webhook left order unchanged");
        return Ok(Json(WebhookAck { received: true }));
    }

    state.orders.update(&order).await?;

    match order.status {
        OrderStatus::Paid => {
            tracing::info!("Order {} marked as paid via webhook", order.order_number);
            state.notify(events::order_paid(&order)).await;
        }
        OrderStatus::Cancelled => {
            tracing::info!("Order {} cancelled via webhook: payment {:?}", order.order_number, session.status);
            state.notify(events::order_cancelled(&order, "Payment was not completed")).await;
        }
        _ => {}
    }

    Ok(Json(WebhookAck { received: true }))
}
