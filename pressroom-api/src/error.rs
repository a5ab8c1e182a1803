use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pressroom_catalog::{PricingError, ProductError};
use pressroom_core::PaymentError;
use pressroom_order::OrderError;
use pressroom_quote::QuoteError;
use pressroom_store::StoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    AuthorizationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    PaymentGatewayError(String),
    #[error("{0}")]
    InternalServerError(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::PaymentGatewayError(msg) => {
                tracing::error!("Payment gateway error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Payment provider unavailable".to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFoundError(format!("Not found: {}", what)),
            StoreError::Conflict(what) => AppError::ConflictError(format!("Already exists: {}", what)),
            StoreError::StaleWrite(what) => AppError::ConflictError(format!("Modified concurrently: {}", what)),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            other => AppError::ValidationError(other.to_string()),
        }
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::Product(product) => product.into(),
            other => AppError::ValidationError(other.to_string()),
        }
    }
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::InvalidTransition { .. } | QuoteError::Expired(_) => AppError::ConflictError(err.to_string()),
            QuoteError::Validation(_) => AppError::ValidationError(err.to_string()),
            QuoteError::Pricing(pricing) => pricing.into(),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::SessionNotFound(_) => AppError::NotFoundError(err.to_string()),
            PaymentError::InvalidAmount(_) => AppError::ValidationError(err.to_string()),
            PaymentError::Gateway(_) | PaymentError::MalformedResponse(_) => {
                AppError::PaymentGatewayError(err.to_string())
            }
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            OrderError::InvalidTransition { .. } | OrderError::NotPayable(_) => AppError::ConflictError(err.to_string()),
            OrderError::Validation(_) => AppError::ValidationError(err.to_string()),
            OrderError::Quote(e) => e.into(),
            OrderError::Pricing(e) => e.into(),
            OrderError::Payment(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        assert_eq!(status_of(StoreError::NotFound("order".into()).into()), StatusCode::NOT_FOUND);
        assert_eq!(status_of(StoreError::Conflict("slug".into()).into()), StatusCode::CONFLICT);
        assert_eq!(status_of(StoreError::StaleWrite("quote".into()).into()), StatusCode::CONFLICT);
        assert_eq!(status_of(StoreError::Decode("bad".into()).into()), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_of(QuoteError::InvalidTransition { from: "rejected".into(), to: "approved".into() }.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(PricingError::InvalidQuantity.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(OrderError::Payment(PaymentError::Gateway("down".into())).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(OrderError::Quote(QuoteError::Pricing(PricingError::NegativePrice(Decimal::NEGATIVE_ONE))).into()),
            StatusCode::BAD_REQUEST
        );
    }
}
