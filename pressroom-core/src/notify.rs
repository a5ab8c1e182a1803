use async_trait::async_trait;
use pressroom_shared::StoreEvent;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell the customer (and the shop, where relevant) that something happened.
    async fn notify(&self, event: &StoreEvent) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Email delivery failed: {0}")]
    Delivery(String),

    #[error("Email API rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Writes events to the log instead of sending them anywhere. Used in development.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &StoreEvent) -> Result<(), NotifyError> {
        // customer email is masked by its Debug impl
        tracing::info!(kind = event.kind(), ?event, "Store event");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressroom_shared::models::events::QuoteRejectedEvent;
    use pressroom_shared::Masked;

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let event = StoreEvent::QuoteRejected(QuoteRejectedEvent {
            quote_id: uuid::Uuid::new_v4(),
            reference: "Q-1".to_string(),
            customer_email: Masked::from("x@y.z"),
            reason: None,
            timestamp: 0,
        });
        assert!(LogNotifier.notify(&event).await.is_ok());
    }
}
