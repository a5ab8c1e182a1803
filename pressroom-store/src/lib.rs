pub mod app_config;
pub mod database;
pub mod repository;
pub mod catalog_repo;
pub mod order_repo;
pub mod quote_repo;
pub mod memory;
pub mod payment_gateway;
pub mod mailer;

pub use catalog_repo::PgProductRepository;
pub use database::DbClient;
pub use mailer::HttpMailer;
pub use memory::InMemoryStore;
pub use order_repo::PgOrderRepository;
pub use payment_gateway::StripeCheckoutAdapter;
pub use quote_repo::{PgPriceMatchRepository, PgQuoteRepository};
pub use repository::{
    OrderFilter, OrderRepository, PriceMatchRepository, ProductRepository, QuoteFilter, QuoteRepository,
    StoreError, StoreResult,
};
