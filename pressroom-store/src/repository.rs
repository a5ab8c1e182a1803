use async_trait::async_trait;
use pressroom_catalog::Product;
use pressroom_order::{Order, OrderStatus};
use pressroom_quote::{PriceMatchRequest, PriceMatchStatus, QuoteRequest, QuoteStatus};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored record could not be decoded: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Modified concurrently: {0}")]
    StaleWrite(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Case-insensitive match on the customer's email
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct QuoteFilter {
    pub status: Option<QuoteStatus>,
    pub customer_email: Option<String>,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Fails with `Conflict` when the slug is taken.
    async fn create(&self, product: &Product) -> StoreResult<()>;
    async fn get(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Product>>;
    /// Ordered by name.
    async fn list(&self, active_only: bool) -> StoreResult<Vec<Product>>;
    async fn update(&self, product: &Product) -> StoreResult<()>;
    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: &Order) -> StoreResult<()>;
    async fn get(&self, id: Uuid) -> StoreResult<Option<Order>>;
    /// Newest first.
    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;
    /// Header fields only; items are fixed once the order exists.
    async fn update(&self, order: &Order) -> StoreResult<()>;
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn create(&self, quote: &QuoteRequest) -> StoreResult<()>;
    async fn get(&self, id: Uuid) -> StoreResult<Option<QuoteRequest>>;
    /// Newest first.
    async fn list(&self, filter: &QuoteFilter) -> StoreResult<Vec<QuoteRequest>>;
    async fn update(&self, quote: &QuoteRequest) -> StoreResult<()>;
    /// Writes `quote` only while the stored row is still in `expected`.
    /// Returns `StaleWrite` when another writer moved it first.
    async fn update_if_status(&self, quote: &QuoteRequest, expected: QuoteStatus) -> StoreResult<()>;
}

#[async_trait]
pub trait PriceMatchRepository: Send + Sync {
    async fn create(&self, request: &PriceMatchRequest) -> StoreResult<()>;
    async fn get(&self, id: Uuid) -> StoreResult<Option<PriceMatchRequest>>;
    /// Newest first.
    async fn list(&self, status: Option<PriceMatchStatus>) -> StoreResult<Vec<PriceMatchRequest>>;
    async fn update(&self, request: &PriceMatchRequest) -> StoreResult<()>;
}

pub(crate) fn email_matches(filter: &Option<String>, email: &str) -> bool {
    filter.as_ref().map_or(true, |wanted| wanted.eq_ignore_ascii_case(email))
}
