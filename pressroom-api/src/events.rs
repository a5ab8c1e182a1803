//! Builders for the events handlers hand to the notifier.

use chrono::Utc;
use pressroom_order::Order;
use pressroom_quote::{PriceMatchRequest, QuoteRequest};
use pressroom_shared::models::events::{
    OrderCancelledEvent, OrderPaidEvent, OrderPlacedEvent, PriceMatchResolvedEvent, PriceMatchSubmittedEvent,
    QuoteApprovedEvent, QuoteRejectedEvent, QuoteSubmittedEvent,
};
use pressroom_shared::{Masked, StoreEvent};

fn now() -> i64 {
    Utc::now().timestamp()
}

pub fn quote_submitted(quote: &QuoteRequest) -> StoreEvent {
    StoreEvent::QuoteSubmitted(QuoteSubmittedEvent {
        quote_id: quote.id,
        reference: quote.reference.clone(),
        customer_name: quote.customer.name.clone(),
        customer_email: Masked::new(quote.customer.email.clone()),
        project_description: quote.project_description.clone(),
        timestamp: now(),
    })
}

pub fn quote_approved(quote: &QuoteRequest) -> StoreEvent {
    StoreEvent::QuoteApproved(QuoteApprovedEvent {
        quote_id: quote.id,
        reference: quote.reference.clone(),
        customer_email: Masked::new(quote.customer.email.clone()),
        quoted_price: quote.quoted_price.unwrap_or_default(),
        include_vat: quote.include_vat,
        expires_at: quote.expires_at.map(|at| at.timestamp()),
        timestamp: now(),
    })
}

pub fn quote_rejected(quote: &QuoteRequest) -> StoreEvent {
    StoreEvent::QuoteRejected(QuoteRejectedEvent {
        quote_id: quote.id,
        reference: quote.reference.clone(),
        customer_email: Masked::new(quote.customer.email.clone()),
        reason: quote.admin_notes.clone(),
        timestamp: now(),
    })
}

pub fn order_placed(order: &Order) -> StoreEvent {
    StoreEvent::OrderPlaced(OrderPlacedEvent {
        order_id: order.id,
        order_number: order.order_number.clone(),
        customer_email: Masked::new(order.customer.email.clone()),
        total: order.total,
        currency: order.currency.clone(),
        quote_id: order.quote_id,
        timestamp: now(),
    })
}

pub fn order_paid(order: &Order) -> StoreEvent {
    StoreEvent::OrderPaid(OrderPaidEvent {
        order_id: order.id,
        order_number: order.order_number.clone(),
        customer_email: Masked::new(order.customer.email.clone()),
        total: order.total,
        currency: order.currency.clone(),
        payment_reference: order.payment_reference.clone(),
        timestamp: now(),
    })
}

pub fn order_cancelled(order: &Order, reason: &str) -> StoreEvent {
    StoreEvent::OrderCancelled(OrderCancelledEvent {
        order_id: order.id,
        order_number: order.order_number.clone(),
        customer_email: Masked::new(order.customer.email.clone()),
        reason: reason.to_string(),
        timestamp: now(),
    })
}

pub fn price_match_submitted(request: &PriceMatchRequest) -> StoreEvent {
    StoreEvent::PriceMatchSubmitted(PriceMatchSubmittedEvent {
        request_id: request.id,
        product_name: request.product_name.clone(),
        customer_email: Masked::new(request.customer.email.clone()),
        competitor_price: request.competitor_price,
        timestamp: now(),
    })
}

pub fn price_match_resolved(request: &PriceMatchRequest) -> StoreEvent {
    StoreEvent::PriceMatchResolved(PriceMatchResolvedEvent {
        request_id: request.id,
        product_name: request.product_name.clone(),
        customer_email: Masked::new(request.customer.email.clone()),
        outcome: request.status.to_string(),
        offered_total: request.offered_price.as_ref().map(|o| o.total),
        timestamp: now(),
    })
}
