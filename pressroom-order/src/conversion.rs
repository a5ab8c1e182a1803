use pressroom_catalog::{round_money, PricingEngine};
use pressroom_quote::QuoteRequest;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Address, Order, OrderItem};
use crate::OrderError;

/// Turn an approved quote into an order awaiting payment.
///
/// The quoted price is the subtotal; VAT goes on top when the quote asked for it.
/// The quote is marked converted and linked to the new order.
pub fn convert_quote(
    quote: &mut QuoteRequest,
    engine: &PricingEngine,
    shipping_address: Option<Address>,
) -> Result<Order, OrderError> {
    let quoted_price = quote.ensure_convertible()?;
    if let Some(address) = &shipping_address {
        address.validate()?;
    }

    let breakdown = engine.apply_tax(quoted_price, quote.include_vat)?;
    let quantity = quote.quantity();
    let item = OrderItem {
        id: Uuid::new_v4(),
        product_id: quote.product_id,
        product_name: quote
            .product_name
            .clone()
            .unwrap_or_else(|| format!("Custom job {}", quote.reference)),
        options: Vec::new(),
        quantity,
        unit_price: round_money(breakdown.subtotal / Decimal::from(quantity)),
        line_total: breakdown.subtotal,
    };

    let mut order = Order::from_quote(
        quote.id,
        quote.customer.clone(),
        shipping_address,
        item,
        &breakdown,
        quote.include_vat,
    );
    order.notes = quote.admin_notes.clone();

    quote.mark_converted(order.id)?;
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use crate::test_support::{address, quote_request};
    use pressroom_quote::{QuoteError, QuoteStatus};
    use std::str::FromStr;

    #[test]
    fn test_convert_with_vat() {
        let engine = PricingEngine::default();
        let mut quote = quote_request("250 leaflets", true);
        quote.approve(Decimal::new(100, 0), None, 30).unwrap();

        let order = convert_quote(&mut quote, &engine, Some(address())).unwrap();
        assert_eq!(order.status, OrderStatus::QuotePriced);
        assert_eq!(order.subtotal, Decimal::new(100, 0));
        assert_eq!(order.tax, Decimal::new(20, 0));
        assert_eq!(order.total, Decimal::new(120, 0));
        assert_eq!(order.quote_id, Some(quote.id));
        assert_eq!(order.items[0].quantity, 250);
        assert_eq!(order.items[0].unit_price, Decimal::from_str("0.40").unwrap());

        assert_eq!(quote.status, QuoteStatus::ConvertedToOrder);
        assert_eq!(quote.order_id, Some(order.id));
    }

    #[test]
    fn test_convert_without_vat_or_quantity() {
        let engine = PricingEngine::default();
        let mut quote = quote_request("lots", false);
        quote.approve(Decimal::from_str("99.99").unwrap(), None, 30).unwrap();

        let order = convert_quote(&mut quote, &engine, None).unwrap();
        assert_eq!(order.tax, Decimal::ZERO);
        assert_eq!(order.total, Decimal::from_str("99.99").unwrap());
        assert_eq!(order.items[0].quantity, 1);
        assert_eq!(order.items[0].unit_price, Decimal::from_str("99.99").unwrap());
    }

    #[test]
    fn test_unit_price_rounds_to_pence() {
        let engine = PricingEngine::default();
        let mut quote = quote_request("3 signs", false);
        quote.approve(Decimal::new(100, 0), None, 30).unwrap();

        let order = convert_quote(&mut quote, &engine, None).unwrap();
        assert_eq!(order.items[0].unit_price, Decimal::from_str("33.33").unwrap());
        assert_eq!(order.items[0].line_total, Decimal::new(100, 0));
    }

    #[test]
    fn test_pending_quote_cannot_convert() {
        let engine = PricingEngine::default();
        let mut quote = quote_request("10", true);

        let result = convert_quote(&mut quote, &engine, None);
        assert!(matches!(result, Err(OrderError::Quote(QuoteError::InvalidTransition { .. }))));
        assert_eq!(quote.status, QuoteStatus::Pending);
    }

    #[test]
    fn test_expired_quote_cannot_convert() {
        let engine = PricingEngine::default();
        let mut quote = quote_request("10", true);
        quote.approve(Decimal::new(10, 0), None, 30).unwrap();
        quote.expires_at = Some(chrono::Utc::now() - chrono::Duration::hours(1));

        let result = convert_quote(&mut quote, &engine, None);
        assert!(matches!(result, Err(OrderError::Quote(QuoteError::Expired(_)))));
        assert_eq!(quote.status, QuoteStatus::Approved);
    }
}
