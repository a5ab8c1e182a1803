use anyhow::Context;
use pressroom_api::{
    app,
    state::{AppState, AuthConfig},
};
use pressroom_catalog::PricingEngine;
use pressroom_core::{LogNotifier, Notifier, PaymentAdapter};
use pressroom_order::{MockPaymentAdapter, PaymentOrchestrator};
use pressroom_store::{
    app_config::{Config, EmailProvider, PaymentProvider},
    DbClient, HttpMailer, InMemoryStore, OrderRepository, PgOrderRepository, PgPriceMatchRepository,
    PgProductRepository, PgQuoteRepository, PriceMatchRepository, ProductRepository, QuoteRepository,
    StripeCheckoutAdapter,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct Repositories {
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
    quotes: Arc<dyn QuoteRepository>,
    price_matches: Arc<dyn PriceMatchRepository>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pressroom_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Pressroom API on port {}", config.server.port);

    // Storage
    let (repos, rules) = if config.database.url.starts_with("memory") {
        tracing::warn!("Using in-memory storage; data is lost on restart");
        let store = Arc::new(InMemoryStore::new());
        let repos = Repositories {
            products: store.clone(),
            orders: store.clone(),
            quotes: store.clone(),
            price_matches: store,
        };
        (repos, config.business_rules.clone())
    } else {
        let db = DbClient::new(&config.database)
            .await
            .context("Failed to connect to Postgres")?;
        db.migrate().await.context("Failed to run migrations")?;
        let rules = db
            .fetch_business_rules(config.business_rules.clone())
            .await
            .context("Failed to load business rules")?;
        let repos = Repositories {
            products: Arc::new(PgProductRepository::new(db.pool.clone())),
            orders: Arc::new(PgOrderRepository::new(db.pool.clone())),
            quotes: Arc::new(PgQuoteRepository::new(db.pool.clone())),
            price_matches: Arc::new(PgPriceMatchRepository::new(db.pool.clone())),
        };
        (repos, rules)
    };

    let pricing = PricingEngine::new(rules.pricing_config().context("Invalid business rules")?);

    // Payments
    let adapter: Arc<dyn PaymentAdapter> = match config.payments.provider {
        PaymentProvider::Stripe => {
            let key = config
                .payments
                .secret_key
                .clone()
                .context("payments.secret_key is required for the stripe provider")?;
            Arc::new(StripeCheckoutAdapter::new(config.payments.api_base.clone(), key))
        }
        PaymentProvider::Mock => {
            tracing::warn!("Using mock payment adapter; no real payments will be taken");
            Arc::new(MockPaymentAdapter::new())
        }
    };

    // Notifications
    let notifier: Arc<dyn Notifier> = match config.email.provider {
        EmailProvider::Http => {
            let api_url = config.email.api_url.clone().context("email.api_url is required for the http provider")?;
            let api_key = config.email.api_key.clone().context("email.api_key is required for the http provider")?;
            Arc::new(HttpMailer::new(
                api_url,
                api_key,
                config.email.from_address.clone(),
                config.email.shop_address.clone(),
            ))
        }
        EmailProvider::Log => Arc::new(LogNotifier),
    };

    let app_state = AppState {
        products: repos.products,
        orders: repos.orders,
        quotes: repos.quotes,
        price_matches: repos.price_matches,
        payments: Arc::new(PaymentOrchestrator::new(adapter)),
        notifier,
        pricing: Arc::new(pricing),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
            admin_api_key: config.auth.admin_api_key.clone(),
            admin_permissions: config.auth.admin_permissions.clone(),
        },
        public_url: config.server.public_url.clone(),
        quote_validity_days: rules.quote_validity_days,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
