use rust_decimal::Decimal;
use uuid::Uuid;

use crate::pii::Masked;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct QuoteSubmittedEvent {
    pub quote_id: Uuid,
    pub reference: String,
    pub customer_name: String,
    pub customer_email: Masked<String>,
    pub project_description: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct QuoteApprovedEvent {
    pub quote_id: Uuid,
    pub reference: String,
    pub customer_email: Masked<String>,
    pub quoted_price: Decimal,
    pub include_vat: bool,
    pub expires_at: Option<i64>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct QuoteRejectedEvent {
    pub quote_id: Uuid,
    pub reference: String,
    pub customer_email: Masked<String>,
    pub reason: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderPlacedEvent {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_email: Masked<String>,
    pub total: Decimal,
    pub currency: String,
    pub quote_id: Option<Uuid>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderPaidEvent {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_email: Masked<String>,
    pub total: Decimal,
    pub currency: String,
    pub payment_reference: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderCancelledEvent {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_email: Masked<String>,
    pub reason: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PriceMatchSubmittedEvent {
    pub request_id: Uuid,
    pub product_name: String,
    pub customer_email: Masked<String>,
    pub competitor_price: Decimal,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PriceMatchResolvedEvent {
    pub request_id: Uuid,
    pub product_name: String,
    pub customer_email: Masked<String>,
    /// `approved`, `rejected` or `contacted`
    pub outcome: String,
    pub offered_total: Option<Decimal>,
    pub timestamp: i64,
}

/// Everything the storefront tells the outside world about.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    QuoteSubmitted(QuoteSubmittedEvent),
    QuoteApproved(QuoteApprovedEvent),
    QuoteRejected(QuoteRejectedEvent),
    OrderPlaced(OrderPlacedEvent),
    OrderPaid(OrderPaidEvent),
    OrderCancelled(OrderCancelledEvent),
    PriceMatchSubmitted(PriceMatchSubmittedEvent),
    PriceMatchResolved(PriceMatchResolvedEvent),
}

impl StoreEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::QuoteSubmitted(_) => "quote.submitted",
            StoreEvent::QuoteApproved(_) => "quote.approved",
            StoreEvent::QuoteRejected(_) => "quote.rejected",
            StoreEvent::OrderPlaced(_) => "order.placed",
            StoreEvent::OrderPaid(_) => "order.paid",
            StoreEvent::OrderCancelled(_) => "order.cancelled",
            StoreEvent::PriceMatchSubmitted(_) => "price_match.submitted",
            StoreEvent::PriceMatchResolved(_) => "price_match.resolved",
        }
    }

    pub fn customer_email(&self) -> &Masked<String> {
        match self {
            StoreEvent::QuoteSubmitted(e) => &e.customer_email,
            StoreEvent::QuoteApproved(e) => &e.customer_email,
            StoreEvent::QuoteRejected(e) => &e.customer_email,
            StoreEvent::OrderPlaced(e) => &e.customer_email,
            StoreEvent::OrderPaid(e) => &e.customer_email,
            StoreEvent::OrderCancelled(e) => &e.customer_email,
            StoreEvent::PriceMatchSubmitted(e) => &e.customer_email,
            StoreEvent::PriceMatchResolved(e) => &e.customer_email,
        }
    }

    /// Submissions need a human at the shop to act on them.
    pub fn needs_shop_attention(&self) -> bool {
        matches!(
            self,
            StoreEvent::QuoteSubmitted(_) | StoreEvent::PriceMatchSubmitted(_) | StoreEvent::OrderPaid(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = StoreEvent::OrderPaid(OrderPaidEvent {
            order_id: Uuid::new_v4(),
            order_number: "PR-0000ABCD".to_string(),
            customer_email: Masked::from("a@b.co"),
            total: Decimal::new(6000, 2),
            currency: "GBP".to_string(),
            payment_reference: Some("cs_test_1".to_string()),
            timestamp: 0,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "order_paid");
        assert_eq!(json["customer_email"], "a@b.co");
        assert_eq!(event.kind(), "order.paid");
        assert!(event.needs_shop_attention());
    }
}
