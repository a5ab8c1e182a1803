use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use pressroom_catalog::{slugify, OptionGroup, Product};
use pressroom_order::{convert_quote, Address, Order, OrderStatus};
use pressroom_quote::{PriceMatchRequest, PriceMatchStatus, QuoteRequest, QuoteStatus};
use pressroom_store::{OrderFilter, QuoteFilter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    events,
    middleware::auth::{require_permission, AdminClaims},
    state::AppState,
};

pub const CATALOG_WRITE: &str = "catalog:write";
pub const ORDERS_WRITE: &str = "orders:write";
pub const QUOTES_WRITE: &str = "quotes:write";
pub const PRICE_MATCH_WRITE: &str = "price_match:write";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub base_price: Decimal,
    #[serde(default)]
    pub quote_only: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub option_groups: Vec<OptionGroup>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<Decimal>,
    pub quote_only: Option<bool>,
    pub is_active: Option<bool>,
    pub option_groups: Option<Vec<OptionGroup>>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveQuoteRequest {
    /// Subtotal before VAT
    pub price: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectQuoteRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ConvertQuoteRequest {
    pub shipping_address: Option<Address>,
}

#[derive(Debug, Serialize)]
pub struct ConvertQuoteResponse {
    pub order: Order,
    pub quote: QuoteRequest,
}

#[derive(Debug, Deserialize, Default)]
pub struct PriceMatchDecision {
    pub notes: Option<String>,
}

/// Routes for back-office staff. The caller layers `admin_auth_middleware` on top.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/products", get(list_products).post(create_product))
        .route(
            "/v1/admin/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/v1/admin/orders", get(list_orders))
        .route("/v1/admin/orders/{id}", get(get_order))
        .route("/v1/admin/orders/{id}/cancel", post(cancel_order))
        .route("/v1/admin/quotes", get(list_quotes))
        .route("/v1/admin/quotes/{id}/approve", post(approve_quote))
        .route("/v1/admin/quotes/{id}/reject", post(reject_quote))
        .route("/v1/admin/quotes/{id}/convert", post(convert_quote_to_order))
        .route("/v1/admin/price-matches", get(list_price_matches))
        .route("/v1/admin/price-matches/{id}/approve", post(approve_price_match))
        .route("/v1/admin/price-matches/{id}/reject", post(reject_price_match))
        .route("/v1/admin/price-matches/{id}/contacted", post(contacted_price_match))
}

fn parse_status<T: std::str::FromStr>(raw: Option<&str>) -> Result<Option<T>, AppError>
where
    T::Err: std::fmt::Display,
{
    raw.map(|s| s.parse::<T>().map_err(|e| AppError::ValidationError(e.to_string())))
        .transpose()
}

// ============================================================================
// Product Management Handlers
// ============================================================================

/// GET /v1/admin/products
/// Includes inactive products
async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.products.list(false).await?))
}

/// GET /v1/admin/products/{id}
async fn get_product(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>, AppError> {
    let product = state
        .products
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Product not found: {}", id)))?;
    Ok(Json(product))
}

/// POST /v1/admin/products
async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    require_permission(&claims, CATALOG_WRITE)?;

    let mut product = Product::new(req.name, req.base_price)?;
    if let Some(slug) = req.slug {
        product.slug = slugify(&slug);
    }
    product.description = req.description;
    product.quote_only = req.quote_only;
    product.is_active = req.is_active;
    product.option_groups = req.option_groups;
    product.validate()?;

    state.products.create(&product).await?;
    tracing::info!(slug = %product.slug, admin = %claims.sub, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /v1/admin/products/{id}
async fn update_product(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    require_permission(&claims, CATALOG_WRITE)?;

    let mut product = state
        .products
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Product not found: {}", id)))?;

    if let Some(name) = req.name {
        product.name = name;
    }
    if let Some(slug) = req.slug {
        product.slug = slugify(&slug);
    }
    if req.description.is_some() {
        product.description = req.description;
    }
    if let Some(base_price) = req.base_price {
        product.base_price = base_price;
    }
    if let Some(quote_only) = req.quote_only {
        product.quote_only = quote_only;
    }
    if let Some(is_active) = req.is_active {
        product.is_active = is_active;
    }
    if let Some(groups) = req.option_groups {
        product.option_groups = groups;
    }
    product.validate()?;
    product.touch();

    state.products.update(&product).await?;
    Ok(Json(product))
}

/// DELETE /v1/admin/products/{id}
async fn delete_product(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_permission(&claims, CATALOG_WRITE)?;
    state.products.delete(id).await?;
    tracing::info!(product_id = %id, admin = %claims.sub, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Order Management Handlers
// ============================================================================

/// GET /v1/admin/orders?status=&email=
async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let filter = OrderFilter {
        status: parse_status::<OrderStatus>(query.status.as_deref())?,
        customer_email: query.email,
    };
    Ok(Json(state.orders.list(&filter).await?))
}

/// GET /v1/admin/orders/{id}
async fn get_order(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Order not found: {}", id)))?;
    Ok(Json(order))
}

/// POST /v1/admin/orders/{id}/cancel
async fn cancel_order(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelOrderRequest>,
) -> Result<Json<Order>, AppError> {
    require_permission(&claims, ORDERS_WRITE)?;

    let mut order = state
        .orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Order not found: {}", id)))?;

    let reason = req.reason.unwrap_or_else(|| "Cancelled by the shop".to_string());
    order.cancel(Some(reason.clone()))?;
    state.orders.update(&order).await?;
    tracing::info!(order_number = %order.order_number, admin = %claims.sub, "Order cancelled");

    state.notify(events::order_cancelled(&order, &reason)).await;
    Ok(Json(order))
}

// ============================================================================
// Quote Handlers
// ============================================================================

async fn load_quote(state: &AppState, id: Uuid) -> Result<QuoteRequest, AppError> {
    state
        .quotes
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Quote not found: {}", id)))
}

/// GET /v1/admin/quotes?status=&email=
async fn list_quotes(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<QuoteRequest>>, AppError> {
    let filter = QuoteFilter {
        status: parse_status::<QuoteStatus>(query.status.as_deref())?,
        customer_email: query.email,
    };
    Ok(Json(state.quotes.list(&filter).await?))
}

/// POST /v1/admin/quotes/{id}/approve
async fn approve_quote(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApproveQuoteRequest>,
) -> Result<Json<QuoteRequest>, AppError> {
    require_permission(&claims, QUOTES_WRITE)?;

    let mut quote = load_quote(&state, id).await?;
    quote.approve(req.price, req.notes, state.quote_validity_days)?;
    state.quotes.update(&quote).await?;
    tracing::info!(reference = %quote.reference, price = %req.price, "Quote approved");

    state.notify(events::quote_approved(&quote)).await;
    Ok(Json(quote))
}

/// POST /v1/admin/quotes/{id}/reject
async fn reject_quote(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectQuoteRequest>,
) -> Result<Json<QuoteRequest>, AppError> {
    require_permission(&claims, QUOTES_WRITE)?;

    let mut quote = load_quote(&state, id).await?;
    quote.reject(req.reason)?;
    state.quotes.update(&quote).await?;
    tracing::info!(reference = %quote.reference, "Quote rejected");

    state.notify(events::quote_rejected(&quote)).await;
    Ok(Json(quote))
}

/// POST /v1/admin/quotes/{id}/convert
/// Creates a quote-priced order the customer can then pay for
async fn convert_quote_to_order(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    req: Option<Json<ConvertQuoteRequest>>,
) -> Result<(StatusCode, Json<ConvertQuoteResponse>), AppError> {
    require_permission(&claims, QUOTES_WRITE)?;
    let req = req.map(|Json(body)| body).unwrap_or_default();

    let original = load_quote(&state, id).await?;
    let mut quote = original.clone();
    let order = convert_quote(&mut quote, &state.pricing, req.shipping_address)?;

    // Claim the quote before creating the order so a concurrent convert loses.
    state.quotes.update_if_status(&quote, QuoteStatus::Approved).await?;
    if let Err(err) = state.orders.create(&order).await {
        if let Err(restore) = state.quotes.update(&original).await {
            tracing::error!(error = %restore, quote_id = %original.id, "Failed to release quote after order insert failed");
        }
        return Err(err.into());
    }
    tracing::info!(reference = %quote.reference, order_number = %order.order_number, "Quote converted to order");

    state.notify(events::order_placed(&order)).await;
    Ok((StatusCode::CREATED, Json(ConvertQuoteResponse { order, quote })))
}

// ============================================================================
// Price Match Handlers
// ============================================================================

async fn load_price_match(state: &AppState, id: Uuid) -> Result<PriceMatchRequest, AppError> {
    state
        .price_matches
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Price match request not found: {}", id)))
}

/// GET /v1/admin/price-matches?status=
async fn list_price_matches(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PriceMatchRequest>>, AppError> {
    let status = parse_status::<PriceMatchStatus>(query.status.as_deref())?;
    Ok(Json(state.price_matches.list(status).await?))
}

/// POST /v1/admin/price-matches/{id}/approve
async fn approve_price_match(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    req: Option<Json<PriceMatchDecision>>,
) -> Result<Json<PriceMatchRequest>, AppError> {
    require_permission(&claims, PRICE_MATCH_WRITE)?;
    let req = req.map(|Json(body)| body).unwrap_or_default();

    let mut request = load_price_match(&state, id).await?;
    request.approve(&state.pricing, req.notes)?;
    state.price_matches.update(&request).await?;

    state.notify(events::price_match_resolved(&request)).await;
    Ok(Json(request))
}

/// POST /v1/admin/price-matches/{id}/reject
async fn reject_price_match(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    req: Option<Json<PriceMatchDecision>>,
) -> Result<Json<PriceMatchRequest>, AppError> {
    require_permission(&claims, PRICE_MATCH_WRITE)?;
    let req = req.map(|Json(body)| body).unwrap_or_default();

    let mut request = load_price_match(&state, id).await?;
    request.reject(req.notes)?;
    state.price_matches.update(&request).await?;

    state.notify(events::price_match_resolved(&request)).await;
    Ok(Json(request))
}

/// POST /v1/admin/price-matches/{id}/contacted
async fn contacted_price_match(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    req: Option<Json<PriceMatchDecision>>,
) -> Result<Json<PriceMatchRequest>, AppError> {
    require_permission(&claims, PRICE_MATCH_WRITE)?;
    let req = req.map(|Json(body)| body).unwrap_or_default();

    let mut request = load_price_match(&state, id).await?;
    request.mark_contacted(req.notes)?;
    state.price_matches.update(&request).await?;

    state.notify(events::price_match_resolved(&request)).await;
    Ok(Json(request))
}
