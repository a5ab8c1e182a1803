use chrono::{DateTime, Utc};
use pressroom_catalog::{PriceBreakdown, Product, SelectedOption};
use pressroom_quote::CustomerInfo;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::OrderError;

/// Order status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created from the configurator, awaiting payment.
    Pending,
    /// Created from an approved quote, awaiting payment.
    QuotePriced,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::QuotePriced => "quote_priced",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "quote_priced" => Ok(OrderStatus::QuotePriced),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::Validation(format!("unknown order status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Unpaid,
    Paid,
    Failed,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Unpaid => "unpaid",
            PaymentState::Paid => "paid",
            PaymentState::Failed => "failed",
        }
    }
}

impl FromStr for PaymentState {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentState::Unpaid),
            "paid" => Ok(PaymentState::Paid),
            "failed" => Ok(PaymentState::Failed),
            other => Err(OrderError::Validation(format!("unknown payment state '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "GB".to_string()
}

impl Address {
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.line1.trim().is_empty() || self.city.trim().is_empty() || self.postcode.trim().is_empty() {
            return Err(OrderError::Validation("address needs a first line, city and postcode".to_string()));
        }
        Ok(())
    }
}

/// A priced line of an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    /// Options as priced at order time; later catalog edits do not change them.
    pub options: Vec<SelectedOption>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// The customer's purchase, from checkout to payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer: CustomerInfo,
    pub shipping_address: Option<Address>,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub include_vat: bool,
    pub status: OrderStatus,
    pub payment_state: PaymentState,
    /// Checkout session id at the payment gateway
    pub payment_reference: Option<String>,
    pub quote_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    fn new(
        customer: CustomerInfo,
        shipping_address: Option<Address>,
        items: Vec<OrderItem>,
        breakdown: &PriceBreakdown,
        include_vat: bool,
        status: OrderStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_number: generate_order_number(),
            customer,
            shipping_address,
            items,
            subtotal: breakdown.subtotal,
            tax: breakdown.tax,
            total: breakdown.total,
            currency: breakdown.currency.clone(),
            include_vat,
            status,
            payment_state: PaymentState::Unpaid,
            payment_reference: None,
            quote_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Order for a product configured and priced on the storefront.
    pub fn from_configured_product(
        product: &Product,
        options: Vec<SelectedOption>,
        breakdown: &PriceBreakdown,
        customer: CustomerInfo,
        shipping_address: Address,
        include_vat: bool,
    ) -> Result<Self, OrderError> {
        customer.validate()?;
        shipping_address.validate()?;

        let item = OrderItem {
            id: Uuid::new_v4(),
            product_id: Some(product.id),
            product_name: product.name.clone(),
            options,
            quantity: breakdown.quantity,
            unit_price: breakdown.unit_price,
            line_total: breakdown.subtotal,
        };

        Ok(Self::new(
            customer,
            Some(shipping_address),
            vec![item],
            breakdown,
            include_vat,
            OrderStatus::Pending,
        ))
    }

    /// Order for a manually quoted job. See `conversion::convert_quote`.
    pub(crate) fn from_quote(
        quote_id: Uuid,
        customer: CustomerInfo,
        shipping_address: Option<Address>,
        item: OrderItem,
        breakdown: &PriceBreakdown,
        include_vat: bool,
    ) -> Self {
        let mut order = Self::new(customer, shipping_address, vec![item], breakdown, include_vat, OrderStatus::QuotePriced);
        order.quote_id = Some(quote_id);
        order
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// `PR-` followed by eight uppercase hex digits.
pub fn generate_order_number() -> String {
    let n: u32 = rand::thread_rng().gen();
    format!("PR-{:08X}", n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{address, customer};
    use pressroom_catalog::{OptionChoice, OptionGroup, PricingEngine, Selection};

    #[test]
    fn test_order_number_format() {
        for _ in 0..50 {
            let number = generate_order_number();
            assert_eq!(number.len(), 11);
            assert!(number.starts_with("PR-"));
            assert!(number[3..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_from_configured_product() {
        let engine = PricingEngine::default();
        let product = Product::new("Posters", Decimal::new(1500, 2)).unwrap().with_group(OptionGroup {
            name: "Size".to_string(),
            choices: vec![OptionChoice { name: "A2".to_string(), price_modifier: Decimal::new(500, 2), unit: None }],
        });
        let selections = vec![Selection { group: "Size".to_string(), choice: "A2".to_string() }];
        let options = product.resolve_selections(&selections).unwrap();
        let breakdown = engine.price_product(&product, &selections, 10, true).unwrap();

        let order = Order::from_configured_product(&product, options, &breakdown, customer(), address(), true).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_state, PaymentState::Unpaid);
        assert_eq!(order.subtotal, Decimal::new(200, 0));
        assert_eq!(order.tax, Decimal::new(40, 0));
        assert_eq!(order.total, Decimal::new(240, 0));
        assert_eq!(order.items[0].quantity, 10);
        assert_eq!(order.items[0].unit_price, Decimal::new(20, 0));
        assert_eq!(order.items[0].options[0].choice, "A2");
    }

    #[test]
    fn test_from_configured_product_requires_address() {
        let engine = PricingEngine::default();
        let product = Product::new("Stickers", Decimal::new(5, 0)).unwrap();
        let breakdown = engine.price_product(&product, &[], 1, false).unwrap();
        let mut bad = address();
        bad.postcode = String::new();

        let result = Order::from_configured_product(&product, vec![], &breakdown, customer(), bad, false);
        assert!(matches!(result, Err(OrderError::Validation(_))));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(OrderStatus::QuotePriced.as_str(), "quote_priced");
        assert_eq!("cancelled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert_eq!(serde_json::to_string(&OrderStatus::QuotePriced).unwrap(), "\"quote_priced\"");
        assert_eq!("failed".parse::<PaymentState>().unwrap(), PaymentState::Failed);
    }
}
