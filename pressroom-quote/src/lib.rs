pub mod models;
pub mod quote;
pub mod price_match;

pub use models::{CustomerInfo, PriceMatchStatus, QuoteStatus};
pub use price_match::{NewPriceMatchRequest, PriceMatchRequest};
pub use quote::{NewQuoteRequest, QuoteRequest, MAX_VALIDITY_DAYS};

use pressroom_catalog::PricingError;

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Quote has expired: {0}")]
    Expired(String),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}
