use chrono::{DateTime, Utc};
use pressroom_catalog::{parse_competitor_price, PriceBreakdown, PricingEngine};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CustomerInfo, PriceMatchStatus};
use crate::QuoteError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPriceMatchRequest {
    pub customer: CustomerInfo,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub competitor_name: String,
    #[serde(default)]
    pub competitor_url: Option<String>,
    /// Free text as typed, e.g. "£89.99 inc VAT"
    pub competitor_price: String,
    #[serde(default)]
    pub include_vat: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A customer asking us to beat a competitor's price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceMatchRequest {
    pub id: Uuid,
    pub customer: CustomerInfo,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub competitor_name: String,
    pub competitor_url: Option<String>,
    pub competitor_price_text: String,
    pub competitor_price: Decimal,
    pub include_vat: bool,
    /// Set on approval.
    pub offered_price: Option<PriceBreakdown>,
    pub notes: Option<String>,
    pub status: PriceMatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PriceMatchRequest {
    pub fn new(request: NewPriceMatchRequest) -> Result<Self, QuoteError> {
        request.customer.validate()?;
        if request.product_name.trim().is_empty() {
            return Err(QuoteError::Validation("product name is required".to_string()));
        }
        if request.competitor_name.trim().is_empty() {
            return Err(QuoteError::Validation("competitor name is required".to_string()));
        }
        let competitor_price = parse_competitor_price(&request.competitor_price)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            customer: request.customer,
            product_id: request.product_id,
            product_name: request.product_name,
            competitor_name: request.competitor_name,
            competitor_url: request.competitor_url,
            competitor_price_text: request.competitor_price,
            competitor_price,
            include_vat: request.include_vat,
            offered_price: None,
            notes: request.notes,
            status: PriceMatchStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Accept the match, recording the discounted offer.
    pub fn approve(&mut self, engine: &PricingEngine, notes: Option<String>) -> Result<&PriceBreakdown, QuoteError> {
        self.ensure_status(&[PriceMatchStatus::Pending, PriceMatchStatus::Contacted], PriceMatchStatus::Approved)?;

        let offer = engine.price_match(self.competitor_price, self.include_vat)?;
        self.status = PriceMatchStatus::Approved;
        self.set_notes(notes);
        self.updated_at = Utc::now();
        Ok(self.offered_price.insert(offer))
    }

    pub fn reject(&mut self, notes: Option<String>) -> Result<(), QuoteError> {
        self.ensure_status(&[PriceMatchStatus::Pending, PriceMatchStatus::Contacted], PriceMatchStatus::Rejected)?;

        self.status = PriceMatchStatus::Rejected;
        self.set_notes(notes);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Shop has reached out to the customer; may be recorded more than once.
    pub fn mark_contacted(&mut self, notes: Option<String>) -> Result<(), QuoteError> {
        self.ensure_status(&[PriceMatchStatus::Pending, PriceMatchStatus::Contacted], PriceMatchStatus::Contacted)?;

        self.status = PriceMatchStatus::Contacted;
        self.set_notes(notes);
        self.updated_at = Utc::now();
        Ok(())
    }

    fn set_notes(&mut self, notes: Option<String>) {
        if notes.is_some() {
            self.notes = notes;
        }
    }

    fn ensure_status(&self, allowed: &[PriceMatchStatus], to: PriceMatchStatus) -> Result<(), QuoteError> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use pressroom_catalog::PricingError;
    use std::str::FromStr;

    fn submission(price: &str, include_vat: bool) -> NewPriceMatchRequest {
        NewPriceMatchRequest {
            customer: CustomerInfo {
                name: "Alan".to_string(),
                email: "alan@example.com".to_string(),
                phone: Some("07700 900000".to_string()),
                company: None,
            },
            product_id: None,
            product_name: "A5 Flyers".to_string(),
            competitor_name: "PrintCo".to_string(),
            competitor_url: Some("https://printco.example/flyers".to_string()),
            competitor_price: price.to_string(),
            include_vat,
            notes: None,
        }
    }

    #[test]
    fn test_new_parses_competitor_price() {
        let request = PriceMatchRequest::new(submission("£1,000.00", false)).unwrap();
        assert_eq!(request.competitor_price, Decimal::from_str("1000.00").unwrap());
        assert_eq!(request.competitor_price_text, "£1,000.00");
        assert_eq!(request.status, PriceMatchStatus::Pending);
    }

    #[test]
    fn test_new_rejects_unreadable_price() {
        let result = PriceMatchRequest::new(submission("ring for price", false));
        assert!(matches!(result, Err(QuoteError::Pricing(_))));
    }

    #[test]
    fn test_out_of_range_prices_never_panic() {
        let result = PriceMatchRequest::new(submission("79228162514264337593543950335", false));
        assert!(matches!(result, Err(QuoteError::Pricing(PricingError::InvalidCompetitorPrice(_)))));

        // at the limit, VAT on the offer would overflow the stored total
        let engine = PricingEngine::default();
        let mut request = PriceMatchRequest::new(submission("9999999999.99", true)).unwrap();
        assert!(matches!(
            request.approve(&engine, None),
            Err(QuoteError::Pricing(PricingError::AmountTooLarge))
        ));
        assert_eq!(request.status, PriceMatchStatus::Pending);
    }

    #[test]
    fn test_approve_beats_competitor() {
        let engine = PricingEngine::default();
        let mut request = PriceMatchRequest::new(submission("£100", true)).unwrap();

        let offer = request.approve(&engine, None).unwrap().clone();
        assert_eq!(offer.subtotal, Decimal::new(95, 0));
        assert_eq!(offer.total, Decimal::new(114, 0));
        assert_eq!(request.status, PriceMatchStatus::Approved);
        assert_eq!(request.offered_price, Some(offer));
    }

    #[test]
    fn test_transitions() {
        let engine = PricingEngine::default();
        let mut request = PriceMatchRequest::new(submission("50", false)).unwrap();

        request.mark_contacted(Some("Left voicemail".to_string())).unwrap();
        request.mark_contacted(None).unwrap();
        assert_eq!(request.notes.as_deref(), Some("Left voicemail"));

        request.reject(Some("Competitor price excludes delivery".to_string())).unwrap();
        assert_eq!(request.status, PriceMatchStatus::Rejected);
        assert!(matches!(request.approve(&engine, None), Err(QuoteError::InvalidTransition { .. })));
        assert!(request.mark_contacted(None).is_err());
    }
}
