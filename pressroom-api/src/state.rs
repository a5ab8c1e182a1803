use pressroom_catalog::PricingEngine;
use pressroom_core::Notifier;
use pressroom_order::PaymentOrchestrator;
use pressroom_shared::StoreEvent;
use pressroom_store::{OrderRepository, PriceMatchRepository, ProductRepository, QuoteRepository};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub admin_api_key: String,
    /// Granted to tokens minted with the admin API key
    pub admin_permissions: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub quotes: Arc<dyn QuoteRepository>,
    pub price_matches: Arc<dyn PriceMatchRepository>,
    pub payments: Arc<PaymentOrchestrator>,
    pub notifier: Arc<dyn Notifier>,
    pub pricing: Arc<PricingEngine>,
    pub auth: AuthConfig,
    pub public_url: String,
    pub quote_validity_days: i64,
}

impl AppState {
    /// Fire-and-log. The write this reports on is already committed.
    pub async fn notify(&self, event: StoreEvent) {
        if let Err(e) = self.notifier.notify(&event).await {
            tracing::warn!(kind = event.kind(), error = %e, "Failed to send notification");
        }
    }

    /// Where the hosted checkout sends the customer back to. `{ORDER_ID}` is filled in per order.
    pub fn checkout_urls(&self) -> (String, String) {
        let base = self.public_url.trim_end_matches('/');
        (
            format!("{}/orders/{{ORDER_ID}}?checkout=success", base),
            format!("{}/orders/{{ORDER_ID}}?checkout=cancelled", base),
        )
    }
}
