use pressroom_catalog::{PricingEngine, Product};
use pressroom_quote::{CustomerInfo, NewQuoteRequest, QuoteRequest};
use rust_decimal::Decimal;

use crate::models::{Address, Order};

pub fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: None,
        company: None,
    }
}

pub fn address() -> Address {
    Address {
        line1: "1 Analytical Way".to_string(),
        line2: None,
        city: "London".to_string(),
        postcode: "N1 1AA".to_string(),
        country: "GB".to_string(),
    }
}

/// A pending £60.00 order (£50 + VAT) for a product with no options.
pub fn priced_order() -> Order {
    let engine = PricingEngine::default();
    let product = Product::new("Letterheads", Decimal::new(50, 0)).unwrap();
    let breakdown = engine.price_product(&product, &[], 1, true).unwrap();
    Order::from_configured_product(&product, vec![], &breakdown, customer(), address(), true).unwrap()
}

pub fn quote_request(quantity_text: &str, include_vat: bool) -> QuoteRequest {
    QuoteRequest::new(NewQuoteRequest {
        customer: customer(),
        product_id: None,
        product_name: Some("Leaflets".to_string()),
        project_description: "Folded leaflets for a charity event".to_string(),
        quantity_text: Some(quantity_text.to_string()),
        deadline: None,
        attachment_urls: vec![],
        include_vat,
    })
    .unwrap()
}
