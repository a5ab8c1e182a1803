use async_trait::async_trait;
use pressroom_catalog::Product;
use pressroom_order::Order;
use pressroom_quote::{PriceMatchRequest, PriceMatchStatus, QuoteRequest, QuoteStatus};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repository::{
    email_matches, OrderFilter, OrderRepository, PriceMatchRepository, ProductRepository, QuoteFilter,
    QuoteRepository, StoreError, StoreResult,
};

/// Process-local store for development without Postgres, and for tests.
#[derive(Default)]
pub struct InMemoryStore {
    products: RwLock<HashMap<Uuid, Product>>,
    orders: RwLock<HashMap<Uuid, Order>>,
    quotes: RwLock<HashMap<Uuid, QuoteRequest>>,
    price_matches: RwLock<HashMap<Uuid, PriceMatchRequest>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn create(&self, product: &Product) -> StoreResult<()> {
        let mut products = self.products.write().await;
        if products.values().any(|p| p.slug == product.slug) {
            return Err(StoreError::Conflict(format!("product slug '{}'", product.slug)));
        }
        if products.contains_key(&product.id) {
            return Err(StoreError::Conflict(format!("product {}", product.id)));
        }
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.values().find(|p| p.slug == slug).cloned())
    }

    async fn list(&self, active_only: bool) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .await
            .values()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn update(&self, product: &Product) -> StoreResult<()> {
        let mut products = self.products.write().await;
        if products.values().any(|p| p.slug == product.slug && p.id != product.id) {
            return Err(StoreError::Conflict(format!("product slug '{}'", product.slug)));
        }
        match products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("product {}", product.id))),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.products
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("product {}", id)))
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create(&self, order: &Order) -> StoreResult<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!("order {}", order.id)));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| filter.status.map_or(true, |s| o.status == s))
            .filter(|o| email_matches(&filter.customer_email, &o.customer.email))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update(&self, order: &Order) -> StoreResult<()> {
        match self.orders.write().await.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("order {}", order.id))),
        }
    }
}

#[async_trait]
impl QuoteRepository for InMemoryStore {
    async fn create(&self, quote: &QuoteRequest) -> StoreResult<()> {
        let mut quotes = self.quotes.write().await;
        if quotes.contains_key(&quote.id) {
            return Err(StoreError::Conflict(format!("quote {}", quote.id)));
        }
        quotes.insert(quote.id, quote.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<QuoteRequest>> {
        Ok(self.quotes.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &QuoteFilter) -> StoreResult<Vec<QuoteRequest>> {
        let mut quotes: Vec<QuoteRequest> = self
            .quotes
            .read()
            .await
            .values()
            .filter(|q| filter.status.map_or(true, |s| q.status == s))
            .filter(|q| email_matches(&filter.customer_email, &q.customer.email))
            .cloned()
            .collect();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(quotes)
    }

    async fn update(&self, quote: &QuoteRequest) -> StoreResult<()> {
        match self.quotes.write().await.get_mut(&quote.id) {
            Some(existing) => {
                *existing = quote.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("quote {}", quote.id))),
        }
    }

    async fn update_if_status(&self, quote: &QuoteRequest, expected: QuoteStatus) -> StoreResult<()> {
        match self.quotes.write().await.get_mut(&quote.id) {
            Some(existing) if existing.status == expected => {
                *existing = quote.clone();
                Ok(())
            }
            Some(_) => Err(StoreError::StaleWrite(format!("quote {} is no longer {}", quote.id, expected.as_str()))),
            None => Err(StoreError::NotFound(format!("quote {}", quote.id))),
        }
    }
}

#[async_trait]
impl PriceMatchRepository for InMemoryStore {
    async fn create(&self, request: &PriceMatchRequest) -> StoreResult<()> {
        let mut requests = self.price_matches.write().await;
        if requests.contains_key(&request.id) {
            return Err(StoreError::Conflict(format!("price match request {}", request.id)));
        }
        requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<PriceMatchRequest>> {
        Ok(self.price_matches.read().await.get(&id).cloned())
    }

    async fn list(&self, status: Option<PriceMatchStatus>) -> StoreResult<Vec<PriceMatchRequest>> {
        let mut requests: Vec<PriceMatchRequest> = self
            .price_matches
            .read()
            .await
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn update(&self, request: &PriceMatchRequest) -> StoreResult<()> {
        match self.price_matches.write().await.get_mut(&request.id) {
            Some(existing) => {
                *existing = request.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("price match request {}", request.id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressroom_quote::{CustomerInfo, NewQuoteRequest};
    use rust_decimal::Decimal;

    fn quote_for(email: &str) -> QuoteRequest {
        QuoteRequest::new(NewQuoteRequest {
            customer: CustomerInfo {
                name: "Customer".to_string(),
                email: email.to_string(),
                phone: None,
                company: None,
            },
            product_id: None,
            product_name: None,
            project_description: "Wedding stationery".to_string(),
            quantity_text: Some("120".to_string()),
            deadline: None,
            attachment_urls: vec![],
            include_vat: true,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_product_slug_is_unique() {
        let store = InMemoryStore::new();
        let first = Product::new("Flyers", Decimal::new(10, 0)).unwrap();
        let second = Product::new("Flyers", Decimal::new(12, 0)).unwrap();

        ProductRepository::create(&store, &first).await.unwrap();
        let result = ProductRepository::create(&store, &second).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        let found = store.get_by_slug("flyers").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn test_list_active_only_sorted_by_name() {
        let store = InMemoryStore::new();
        let mut hidden = Product::new("Zines", Decimal::new(5, 0)).unwrap();
        hidden.is_active = false;
        for product in [Product::new("Posters", Decimal::ONE).unwrap(), Product::new("Banners", Decimal::ONE).unwrap(), hidden] {
            ProductRepository::create(&store, &product).await.unwrap();
        }

        let active = ProductRepository::list(&store, true).await.unwrap();
        let names: Vec<&str> = active.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Banners", "Posters"]);
        assert_eq!(ProductRepository::list(&store, false).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_missing_product() {
        let store = InMemoryStore::new();
        let result = ProductRepository::delete(&store, Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_quote_filter_by_email_and_status() {
        let store = InMemoryStore::new();
        let mut approved = quote_for("Ada@Example.com");
        approved.approve(Decimal::new(300, 0), None, 30).unwrap();
        QuoteRepository::create(&store, &approved).await.unwrap();
        QuoteRepository::create(&store, &quote_for("ada@example.com")).await.unwrap();
        QuoteRepository::create(&store, &quote_for("someone@else.com")).await.unwrap();

        let mine = QuoteRepository::list(
            &store,
            &QuoteFilter { status: None, customer_email: Some("ada@example.com".to_string()) },
        )
        .await
        .unwrap();
        assert_eq!(mine.len(), 2);

        let approved_only = QuoteRepository::list(
            &store,
            &QuoteFilter { status: Some(QuoteStatus::Approved), customer_email: None },
        )
        .await
        .unwrap();
        assert_eq!(approved_only.len(), 1);
        assert_eq!(approved_only[0].id, approved.id);
    }

    #[tokio::test]
    async fn test_update_missing_quote() {
        let store = InMemoryStore::new();
        let result = QuoteRepository::update(&store, &quote_for("a@b.co")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_conditional_update_claims_quote_once() {
        let store = InMemoryStore::new();
        let mut quote = quote_for("ada@example.com");
        quote.approve(Decimal::new(300, 0), None, 30).unwrap();
        QuoteRepository::create(&store, &quote).await.unwrap();

        let mut first = quote.clone();
        first.mark_converted(Uuid::new_v4()).unwrap();
        let mut second = quote.clone();
        second.mark_converted(Uuid::new_v4()).unwrap();

        store.update_if_status(&first, QuoteStatus::Approved).await.unwrap();
        let result = store.update_if_status(&second, QuoteStatus::Approved).await;
        assert!(matches!(result, Err(StoreError::StaleWrite(_))));

        let stored = QuoteRepository::get(&store, quote.id).await.unwrap().unwrap();
        assert_eq!(stored.status, QuoteStatus::ConvertedToOrder);
        assert_eq!(stored.order_id, first.order_id);

        let missing = store.update_if_status(&quote_for("a@b.co"), QuoteStatus::Approved).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }
}
