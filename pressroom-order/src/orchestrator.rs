use pressroom_core::payment::{CheckoutLine, CheckoutRequest, CheckoutSession, PaymentAdapter, PaymentError, PaymentStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Order;
use crate::OrderError;

pub struct PaymentOrchestrator {
    adapter: Arc<dyn PaymentAdapter>,
}

impl PaymentOrchestrator {
    pub fn new(adapter: Arc<dyn PaymentAdapter>) -> Self {
        Self { adapter }
    }

    /// Open a hosted checkout session for an order and attach it.
    pub async fn start_checkout(
        &self,
        order: &mut Order,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, OrderError> {
        if !order.is_payable() {
            return Err(OrderError::NotPayable(order.order_number.clone()));
        }

        let request = CheckoutRequest {
            order_id: order.id,
            order_number: order.order_number.clone(),
            customer_email: order.customer.email.clone(),
            lines: order
                .items
                .iter()
                .map(|item| CheckoutLine {
                    name: item.product_name.clone(),
                    description: describe_options(item),
                    unit_amount: item.unit_price,
                    quantity: item.quantity,
                })
                .collect(),
            total: order.total,
            currency: order.currency.clone(),
            success_url: success_url.replace("{ORDER_ID}", &order.id.to_string()),
            cancel_url: cancel_url.replace("{ORDER_ID}", &order.id.to_string()),
        };

        let session = self.adapter.create_session(&request).await?;
        tracing::info!(order_number = %order.order_number, session_id = %session.id, "Checkout session created");

        order.attach_payment(session.id.clone())?;
        Ok(session)
    }

    /// Process a status update (e.g., from a webhook). Always asks the gateway, never trusts the caller.
    pub async fn process_status_update(&self, session_id: &str) -> Result<CheckoutSession, OrderError> {
        let session = self.adapter.get_session(session_id).await?;
        tracing::debug!(session_id, status = ?session.status, "Fetched checkout session");
        Ok(session)
    }
}

fn describe_options(item: &crate::models::OrderItem) -> Option<String> {
    if item.options.is_empty() {
        return None;
    }
    Some(
        item.options
            .iter()
            .map(|o| format!("{}: {}", o.group, o.choice))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// In-process stand-in for the hosted checkout. Sessions are kept in memory and
/// report `settle_status` once they are looked up again.
pub struct MockPaymentAdapter {
    sessions: RwLock<HashMap<String, CheckoutSession>>,
    settle_status: RwLock<PaymentStatus>,
    fail_create: bool,
}

impl MockPaymentAdapter {
    pub fn new() -> Self {
        Self::with_settle_status(PaymentStatus::Complete)
    }

    pub fn with_settle_status(status: PaymentStatus) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            settle_status: RwLock::new(status),
            fail_create: false,
        }
    }

    /// Every `create_session` fails as if the gateway were down.
    pub fn unavailable() -> Self {
        Self { fail_create: true, ..Self::new() }
    }

    pub async fn set_settle_status(&self, status: PaymentStatus) {
        *self.settle_status.write().await = status;
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for MockPaymentAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PaymentAdapter for MockPaymentAdapter {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        if self.fail_create {
            return Err(PaymentError::Gateway("mock gateway unavailable".to_string()));
        }

        let id = format!("cs_mock_{}", Uuid::new_v4().simple());
        let session = CheckoutSession {
            url: Some(format!("https://checkout.mock/pay/{}", id)),
            id: id.clone(),
            order_id: request.order_id,
            amount: request.total,
            currency: request.currency.clone(),
            status: PaymentStatus::Open,
            created_at: chrono::Utc::now(),
        };

        self.sessions.write().await.insert(id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError> {
        let status = *self.settle_status.read().await;
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| PaymentError::SessionNotFound(session_id.to_string()))?;

        session.status = status;
        if status != PaymentStatus::Open {
            session.url = None;
        }
        Ok(session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderStatus, PaymentState};
    use crate::test_support::priced_order;

    #[tokio::test]
    async fn test_start_checkout_attaches_session() {
        let adapter = Arc::new(MockPaymentAdapter::new());
        let orchestrator = PaymentOrchestrator::new(adapter.clone());
        let mut order = priced_order();

        let session = orchestrator
            .start_checkout(&mut order, "https://shop.test/orders/{ORDER_ID}/thanks", "https://shop.test/basket")
            .await
            .unwrap();

        assert_eq!(session.status, PaymentStatus::Open);
        assert_eq!(session.amount, order.total);
        assert!(session.url.is_some());
        assert_eq!(order.payment_reference.as_deref(), Some(session.id.as_str()));
        assert_eq!(adapter.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_status_update_settles() {
        let adapter = Arc::new(MockPaymentAdapter::new());
        let orchestrator = PaymentOrchestrator::new(adapter.clone());
        let mut order = priced_order();
        let session = orchestrator.start_checkout(&mut order, "s", "c").await.unwrap();

        let fetched = orchestrator.process_status_update(&session.id).await.unwrap();
        assert_eq!(fetched.status, PaymentStatus::Complete);
        assert_eq!(fetched.order_id, order.id);

        assert!(order.apply_payment_status(fetched.status).unwrap());
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_state, PaymentState::Paid);
    }

    #[tokio::test]
    async fn test_paid_order_cannot_checkout_again() {
        let orchestrator = PaymentOrchestrator::new(Arc::new(MockPaymentAdapter::new()));
        let mut order = priced_order();
        order.mark_paid().unwrap();

        let result = orchestrator.start_checkout(&mut order, "s", "c").await;
        assert!(matches!(result, Err(OrderError::NotPayable(_))));
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_order_untouched() {
        let orchestrator = PaymentOrchestrator::new(Arc::new(MockPaymentAdapter::unavailable()));
        let mut order = priced_order();

        let result = orchestrator.start_checkout(&mut order, "s", "c").await;
        assert!(matches!(result, Err(OrderError::Payment(PaymentError::Gateway(_)))));
        assert!(order.payment_reference.is_none());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let orchestrator = PaymentOrchestrator::new(Arc::new(MockPaymentAdapter::new()));
        let result = orchestrator.process_status_update("cs_nope").await;
        assert!(matches!(result, Err(OrderError::Payment(PaymentError::SessionNotFound(_)))));
    }
}
