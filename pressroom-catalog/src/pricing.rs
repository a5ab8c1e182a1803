use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::product::{Product, ProductError, Selection};

static FIRST_INTEGER: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\d+").expect("static pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// UK VAT, 0.20
    pub vat_rate: Decimal,

    /// How far under a competitor's price we go when matching, 0.05
    pub price_match_discount: Decimal,

    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            vat_rate: Decimal::new(20, 2),
            price_match_discount: Decimal::new(5, 2),
            currency: "GBP".to_string(),
        }
    }
}

/// Result of a price computation. All amounts are rounded to pence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBreakdown {
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
    /// Zero when VAT is not charged.
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub currency: String,
}

/// Prices configured products, quoted jobs and price-match offers
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// unit = base + Σ modifiers, subtotal = unit × quantity, then VAT on top.
    pub fn calculate(
        &self,
        base_price: Decimal,
        modifiers: &[Decimal],
        quantity: u32,
        include_vat: bool,
    ) -> Result<PriceBreakdown, PricingError> {
        if base_price < Decimal::ZERO {
            return Err(PricingError::InvalidBasePrice(base_price));
        }
        if quantity == 0 {
            return Err(PricingError::InvalidQuantity);
        }

        let unit_price = modifiers
            .iter()
            .try_fold(base_price, |acc, m| acc.checked_add(*m))
            .map(round_money)
            .ok_or(PricingError::AmountTooLarge)?;
        if unit_price < Decimal::ZERO {
            return Err(PricingError::NegativePrice(unit_price));
        }

        let subtotal = unit_price
            .checked_mul(Decimal::from(quantity))
            .map(round_money)
            .ok_or(PricingError::AmountTooLarge)?;
        let mut breakdown = self.apply_tax(subtotal, include_vat)?;
        breakdown.unit_price = unit_price;
        breakdown.quantity = quantity;
        Ok(breakdown)
    }

    /// Price a catalog product from the customer's option picks.
    pub fn price_product(
        &self,
        product: &Product,
        selections: &[Selection],
        quantity: u32,
        include_vat: bool,
    ) -> Result<PriceBreakdown, PricingError> {
        if product.quote_only {
            return Err(PricingError::QuoteOnly(product.slug.clone()));
        }

        let options = product.resolve_selections(selections)?;
        let modifiers: Vec<Decimal> = options.iter().map(|o| o.price_modifier).collect();
        self.calculate(product.base_price, &modifiers, quantity, include_vat)
    }

    /// Wrap an already agreed subtotal (a quoted price) with tax.
    pub fn apply_tax(&self, subtotal: Decimal, include_vat: bool) -> Result<PriceBreakdown, PricingError> {
        if subtotal < Decimal::ZERO {
            return Err(PricingError::NegativePrice(subtotal));
        }

        let subtotal = ensure_within_limit(round_money(subtotal))?;
        let (tax_rate, tax) = if include_vat {
            let tax = subtotal
                .checked_mul(self.config.vat_rate)
                .map(round_money)
                .ok_or(PricingError::AmountTooLarge)?;
            (self.config.vat_rate, tax)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };
        let total = subtotal
            .checked_add(tax)
            .ok_or(PricingError::AmountTooLarge)
            .and_then(ensure_within_limit)?;

        Ok(PriceBreakdown {
            unit_price: subtotal,
            quantity: 1,
            subtotal,
            tax_rate,
            tax,
            total,
            currency: self.config.currency.clone(),
        })
    }

    /// Beat a competitor's total by the configured discount.
    pub fn price_match(&self, competitor_total: Decimal, include_vat: bool) -> Result<PriceBreakdown, PricingError> {
        if competitor_total < Decimal::ZERO {
            return Err(PricingError::NegativePrice(competitor_total));
        }

        let subtotal = competitor_total
            .checked_mul(Decimal::ONE - self.config.price_match_discount)
            .map(round_money)
            .ok_or(PricingError::AmountTooLarge)?;
        self.apply_tax(subtotal, include_vat)
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

/// Largest amount a price, subtotal or total may reach; matches the `NUMERIC(12,2)` columns.
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

fn ensure_within_limit(amount: Decimal) -> Result<Decimal, PricingError> {
    if amount > max_amount() {
        return Err(PricingError::AmountTooLarge);
    }
    Ok(amount)
}

/// Two decimal places, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Quantity out of free text such as "250 units" or "approx. 1000".
///
/// Takes the first run of digits. Text without digits, a zero, or a number
/// too large for u32 all fall back to 1.
pub fn parse_quantity(text: &str) -> u32 {
    FIRST_INTEGER
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|q| *q > 0)
        .unwrap_or(1)
}

/// Competitor price out of whatever the customer typed ("£1,234.50 inc VAT").
pub fn parse_competitor_price(text: &str) -> Result<Decimal, PricingError> {
    let cleaned: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let cleaned = cleaned.trim_matches('.');

    if cleaned.is_empty() {
        return Err(PricingError::InvalidCompetitorPrice(text.to_string()));
    }

    Decimal::from_str(cleaned)
        .ok()
        .map(round_money)
        .filter(|price| *price <= max_amount())
        .ok_or_else(|| PricingError::InvalidCompetitorPrice(text.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Base price must not be negative: {0}")]
    InvalidBasePrice(Decimal),

    #[error("Price must not be negative: {0}")]
    NegativePrice(Decimal),

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Product is priced by quotation only: {0}")]
    QuoteOnly(String),

    #[error("Could not read a price from '{0}'")]
    InvalidCompetitorPrice(String),

    #[error("Amount exceeds the largest supported price")]
    AmountTooLarge,

    #[error(transparent)]
    Product(#[from] ProductError),
}
