pub mod payment;
pub mod notify;

pub use notify::{LogNotifier, Notifier, NotifyError};
pub use payment::{CheckoutLine, CheckoutRequest, CheckoutSession, PaymentAdapter, PaymentError, PaymentStatus};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

pub type CoreResult<T> = Result<T, CoreError>;
