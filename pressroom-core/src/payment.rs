use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Session created, customer has not finished on the hosted page.
    Open,
    /// Customer finished but the funds have not cleared (bank debits and similar).
    Processing,
    Complete,
    Expired,
    Failed,
}

impl PaymentStatus {
    pub fn is_settled(self) -> bool {
        self == PaymentStatus::Complete
    }

    pub fn is_terminal_failure(self) -> bool {
        matches!(self, PaymentStatus::Expired | PaymentStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub name: String,
    pub description: Option<String>,
    pub unit_amount: Decimal,
    pub quantity: u32,
}

/// What the hosted payment page needs to charge for one order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_email: String,
    pub lines: Vec<CheckoutLine>,
    /// Amount actually charged; includes VAT.
    pub total: Decimal,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String, // Provider's ID (e.g., cs_123)
    pub order_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    /// Hosted page the customer is redirected to. Absent once the session is closed.
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Open a hosted checkout session with the provider
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError>;

    /// Fetch the provider's current view of a session
    async fn get_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Checkout session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid payment amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),
}

/// Pounds to pence for gateways that take integer minor units.
pub fn to_minor_units(amount: Decimal) -> Result<i64, PaymentError> {
    if amount < Decimal::ZERO {
        return Err(PaymentError::InvalidAmount(amount));
    }
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or(PaymentError::InvalidAmount(amount))
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(Decimal::new(4620, 2)).unwrap(), 4620);
        assert_eq!(to_minor_units(Decimal::new(95, 0)).unwrap(), 9500);
        assert!(to_minor_units(Decimal::new(-1, 0)).is_err());
        assert_eq!(from_minor_units(11400), Decimal::new(114, 0));
    }

    #[test]
    fn test_status_flags() {
        assert!(PaymentStatus::Complete.is_settled());
        assert!(!PaymentStatus::Processing.is_settled());
        assert!(PaymentStatus::Expired.is_terminal_failure());
        assert!(!PaymentStatus::Open.is_terminal_failure());
    }
}
