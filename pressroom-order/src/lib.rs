pub mod models;
pub mod lifecycle;
pub mod conversion;
pub mod orchestrator;

#[cfg(test)]
mod test_support;

pub use conversion::convert_quote;
pub use models::{generate_order_number, Address, Order, OrderItem, OrderStatus, PaymentState};
pub use orchestrator::{MockPaymentAdapter, PaymentOrchestrator};

use pressroom_catalog::PricingError;
use pressroom_core::PaymentError;
use pressroom_quote::QuoteError;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Order is not awaiting payment: {0}")]
    NotPayable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}
