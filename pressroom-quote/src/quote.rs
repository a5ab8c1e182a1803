use chrono::{DateTime, Duration, Utc};
use pressroom_catalog::{max_amount, parse_quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CustomerInfo, QuoteStatus};
use crate::QuoteError;

/// Longest validity window an approval may grant, in days.
pub const MAX_VALIDITY_DAYS: i64 = 3650;

/// What the customer submits through the quote form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuoteRequest {
    pub customer: CustomerInfo,
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub project_description: String,
    #[serde(default)]
    pub quantity_text: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub attachment_urls: Vec<String>,
    #[serde(default = "default_include_vat")]
    pub include_vat: bool,
}

fn default_include_vat() -> bool {
    true
}

/// A request for a manually priced job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub id: Uuid,
    /// Short human reference quoted in emails, e.g. `Q-1A2B3C4D`
    pub reference: String,
    pub customer: CustomerInfo,
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub project_description: String,
    pub quantity_text: Option<String>,
    pub deadline: Option<String>,
    pub attachment_urls: Vec<String>,
    pub include_vat: bool,
    /// Subtotal agreed by the shop, before VAT.
    pub quoted_price: Option<Decimal>,
    pub admin_notes: Option<String>,
    pub status: QuoteStatus,
    pub order_id: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuoteRequest {
    pub fn new(request: NewQuoteRequest) -> Result<Self, QuoteError> {
        request.customer.validate()?;
        if request.project_description.trim().is_empty() {
            return Err(QuoteError::Validation("project description is required".to_string()));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        Ok(Self {
            id,
            reference: quote_reference(&id),
            customer: request.customer,
            product_id: request.product_id,
            product_name: request.product_name,
            project_description: request.project_description,
            quantity_text: request.quantity_text,
            deadline: request.deadline,
            attachment_urls: request.attachment_urls,
            include_vat: request.include_vat,
            quoted_price: None,
            admin_notes: None,
            status: QuoteStatus::Pending,
            order_id: None,
            expires_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Price the job. An approved quote may be re-priced, which restarts its validity window.
    pub fn approve(&mut self, price: Decimal, notes: Option<String>, validity_days: i64) -> Result<(), QuoteError> {
        self.ensure_status(&[QuoteStatus::Pending, QuoteStatus::Approved], QuoteStatus::Approved)?;
        if price < Decimal::ZERO {
            return Err(QuoteError::Validation("quoted price must not be negative".to_string()));
        }
        if price > max_amount() {
            return Err(QuoteError::Validation(format!("quoted price must not exceed {}", max_amount())));
        }
        if !(1..=MAX_VALIDITY_DAYS).contains(&validity_days) {
            return Err(QuoteError::Validation(format!(
                "quote validity must be between 1 and {} days",
                MAX_VALIDITY_DAYS
            )));
        }

        let now = Utc::now();
        self.quoted_price = Some(price);
        if notes.is_some() {
            self.admin_notes = notes;
        }
        self.status = QuoteStatus::Approved;
        self.expires_at = Some(now + Duration::days(validity_days));
        self.updated_at = now;
        Ok(())
    }

    pub fn reject(&mut self, reason: Option<String>) -> Result<(), QuoteError> {
        self.ensure_status(&[QuoteStatus::Pending, QuoteStatus::Approved], QuoteStatus::Rejected)?;

        if reason.is_some() {
            self.admin_notes = reason;
        }
        self.status = QuoteStatus::Rejected;
        self.expires_at = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_converted(&mut self, order_id: Uuid) -> Result<(), QuoteError> {
        self.ensure_convertible()?;

        self.status = QuoteStatus::ConvertedToOrder;
        self.order_id = Some(order_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Approved, priced and still inside its validity window.
    pub fn ensure_convertible(&self) -> Result<Decimal, QuoteError> {
        self.ensure_status(&[QuoteStatus::Approved], QuoteStatus::ConvertedToOrder)?;
        if self.is_expired() {
            return Err(QuoteError::Expired(self.reference.clone()));
        }
        self.quoted_price
            .ok_or_else(|| QuoteError::Validation("quote has no price".to_string()))
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }

    pub fn quantity(&self) -> u32 {
        parse_quantity(self.quantity_text.as_deref().unwrap_or(""))
    }

    fn ensure_status(&self, allowed: &[QuoteStatus], to: QuoteStatus) -> Result<(), QuoteError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(QuoteError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            })
        }
    }
}

fn quote_reference(id: &Uuid) -> String {
    let simple = id.simple().to_string();
    format!("Q-{}", simple[..8].to_uppercase())
}
