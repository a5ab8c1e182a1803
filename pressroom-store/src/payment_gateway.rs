use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use pressroom_core::payment::{
    from_minor_units, to_minor_units, CheckoutRequest, CheckoutSession, PaymentAdapter, PaymentError, PaymentStatus,
};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Hosted checkout through Stripe's Checkout Sessions API.
pub struct StripeCheckoutAdapter {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeCheckoutAdapter {
    pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }

    async fn read_session(&self, response: reqwest::Response, session_hint: &str) -> Result<CheckoutSession, PaymentError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PaymentError::SessionNotFound(session_hint.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "Payment gateway rejected request");
            return Err(PaymentError::Gateway(format!("gateway responded with {}", status)));
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| PaymentError::MalformedResponse(e.to_string()))?;
        session.into_checkout_session()
    }
}

/// Form fields for `POST /v1/checkout/sessions`. The whole order is charged as one line.
pub fn session_form(request: &CheckoutRequest) -> Result<Vec<(String, String)>, PaymentError> {
    let amount = to_minor_units(request.total)?;
    if amount <= 0 {
        return Err(PaymentError::InvalidAmount(request.total));
    }

    let order_id = request.order_id.to_string();
    let description: Vec<String> = request
        .lines
        .iter()
        .map(|l| format!("{} x {}", l.quantity, l.name))
        .collect();

    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("customer_email".to_string(), request.customer_email.clone()),
        ("client_reference_id".to_string(), order_id.clone()),
        ("metadata[order_id]".to_string(), order_id),
        ("metadata[order_number]".to_string(), request.order_number.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("line_items[0][price_data][currency]".to_string(), request.currency.to_lowercase()),
        ("line_items[0][price_data][unit_amount]".to_string(), amount.to_string()),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            format!("Order {}", request.order_number),
        ),
    ];
    if !description.is_empty() {
        form.push((
            "line_items[0][price_data][product_data][description]".to_string(),
            description.join("; "),
        ));
    }
    Ok(form)
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    status: Option<String>,
    payment_status: Option<String>,
    amount_total: Option<i64>,
    currency: Option<String>,
    client_reference_id: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    created: Option<i64>,
}

impl StripeSession {
    fn into_checkout_session(self) -> Result<CheckoutSession, PaymentError> {
        let order_ref = self
            .metadata
            .get("order_id")
            .or(self.client_reference_id.as_ref())
            .ok_or_else(|| PaymentError::MalformedResponse(format!("session {} has no order reference", self.id)))?;
        let order_id = Uuid::parse_str(order_ref)
            .map_err(|e| PaymentError::MalformedResponse(format!("session {}: {}", self.id, e)))?;

        let status = map_status(self.status.as_deref(), self.payment_status.as_deref());
        let created_at: DateTime<Utc> = self
            .created
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(Utc::now);

        Ok(CheckoutSession {
            id: self.id,
            order_id,
            amount: from_minor_units(self.amount_total.unwrap_or_default()),
            currency: self.currency.unwrap_or_default().to_uppercase(),
            status,
            url: self.url,
            created_at,
        })
    }
}

/// `status` says whether the customer finished; `payment_status` whether money arrived.
pub fn map_status(status: Option<&str>, payment_status: Option<&str>) -> PaymentStatus {
    match (status, payment_status) {
        (Some("complete"), Some("paid")) | (Some("complete"), Some("no_payment_required")) => PaymentStatus::Complete,
        (Some("complete"), _) => PaymentStatus::Processing,
        (Some("expired"), _) => PaymentStatus::Expired,
        (Some("open"), _) | (None, _) => PaymentStatus::Open,
        (Some(_), _) => PaymentStatus::Failed,
    }
}

#[async_trait]
impl PaymentAdapter for StripeCheckoutAdapter {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        let form = session_form(request)?;

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        self.read_session(response, &request.order_number).await
    }

    async fn get_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .client
            .get(format!("{}/v1/checkout/sessions/{}", self.api_base, session_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        self.read_session(response, session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressroom_core::payment::CheckoutLine;
    use rust_decimal::Decimal;

    fn request(total: Decimal) -> CheckoutRequest {
        CheckoutRequest {
            order_id: Uuid::new_v4(),
            order_number: "PR-00C0FFEE".to_string(),
            customer_email: "ada@example.com".to_string(),
            lines: vec![CheckoutLine {
                name: "A5 Flyers".to_string(),
                description: None,
                unit_amount: Decimal::new(20, 2),
                quantity: 250,
            }],
            total,
            currency: "GBP".to_string(),
            success_url: "https://shop.test/thanks".to_string(),
            cancel_url: "https://shop.test/basket".to_string(),
        }
    }

    fn field<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_session_form() {
        let req = request(Decimal::new(6000, 2));
        let form = session_form(&req).unwrap();

        assert_eq!(field(&form, "mode"), Some("payment"));
        assert_eq!(field(&form, "line_items[0][price_data][unit_amount]"), Some("6000"));
        assert_eq!(field(&form, "line_items[0][price_data][currency]"), Some("gbp"));
        assert_eq!(field(&form, "line_items[0][quantity]"), Some("1"));
        assert_eq!(field(&form, "client_reference_id"), Some(req.order_id.to_string().as_str()));
        assert_eq!(field(&form, "metadata[order_id]"), Some(req.order_id.to_string().as_str()));
        assert_eq!(field(&form, "line_items[0][price_data][product_data][description]"), Some("250 x A5 Flyers"));
    }

    #[test]
    fn test_session_form_rejects_zero_total() {
        assert!(matches!(session_form(&request(Decimal::ZERO)), Err(PaymentError::InvalidAmount(_))));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_status(Some("open"), Some("unpaid")), PaymentStatus::Open);
        assert_eq!(map_status(Some("complete"), Some("paid")), PaymentStatus::Complete);
        assert_eq!(map_status(Some("complete"), Some("unpaid")), PaymentStatus::Processing);
        assert_eq!(map_status(Some("expired"), Some("unpaid")), PaymentStatus::Expired);
        assert_eq!(map_status(Some("something_new"), None), PaymentStatus::Failed);
    }

    #[test]
    fn test_session_decoding() {
        let order_id = Uuid::new_v4();
        let json = serde_json::json!({
            "id": "cs_test_123",
            "object": "checkout.session",
            "url": null,
            "status": "complete",
            "payment_status": "paid",
            "amount_total": 11400,
            "currency": "gbp",
            "client_reference_id": order_id.to_string(),
            "metadata": { "order_id": order_id.to_string() },
            "created": 1_700_000_000
        });

        let session: StripeSession = serde_json::from_value(json).unwrap();
        let session = session.into_checkout_session().unwrap();
        assert_eq!(session.order_id, order_id);
        assert_eq!(session.amount, Decimal::new(114, 0));
        assert_eq!(session.currency, "GBP");
        assert_eq!(session.status, PaymentStatus::Complete);
    }

    #[test]
    fn test_session_without_order_reference() {
        let json = serde_json::json!({ "id": "cs_test_456", "status": "open" });
        let session: StripeSession = serde_json::from_value(json).unwrap();
        assert!(matches!(session.into_checkout_session(), Err(PaymentError::MalformedResponse(_))));
    }
}
