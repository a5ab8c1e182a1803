use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use pressroom_catalog::{parse_quantity, PriceBreakdown, Product, SelectedOption, Selection};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

/// Quantity as a number or as whatever the customer typed ("250 units").
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Count(u32),
    Text(String),
}

impl QuantityInput {
    pub fn resolve(&self) -> u32 {
        match self {
            QuantityInput::Count(0) => 1,
            QuantityInput::Count(n) => *n,
            QuantityInput::Text(text) => parse_quantity(text),
        }
    }
}

impl Default for QuantityInput {
    fn default() -> Self {
        QuantityInput::Count(1)
    }
}

pub(crate) fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    #[serde(default)]
    pub selections: Vec<Selection>,
    #[serde(default)]
    pub quantity: QuantityInput,
    #[serde(default = "default_true")]
    pub include_vat: bool,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub product_slug: String,
    pub options: Vec<SelectedOption>,
    #[serde(flatten)]
    pub price: PriceBreakdown,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/products", get(list_products))
        .route("/v1/products/{slug}", get(get_product))
        .route("/v1/products/{slug}/price", post(price_product))
}

/// Active product by slug; inactive products are invisible on the storefront.
pub(crate) async fn find_active_product(state: &AppState, slug: &str) -> Result<Product, AppError> {
    state
        .products
        .get_by_slug(slug)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFoundError(format!("Product not found: {}", slug)))
}

/// GET /v1/products
async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.products.list(true).await?;
    Ok(Json(products))
}

/// GET /v1/products/{slug}
async fn get_product(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<Product>, AppError> {
    let product = find_active_product(&state, &slug).await?;
    Ok(Json(product))
}

/// POST /v1/products/{slug}/price
/// Live price for the configurator
async fn price_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<PriceRequest>,
) -> Result<Json<PriceResponse>, AppError> {
    let product = find_active_product(&state, &slug).await?;
    let quantity = req.quantity.resolve();

    let price = state.pricing.price_product(&product, &req.selections, quantity, req.include_vat)?;
    let options = product.resolve_selections(&req.selections)?;

    Ok(Json(PriceResponse {
        product_slug: product.slug,
        options,
        price,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_input() {
        let count: QuantityInput = serde_json::from_str("250").unwrap();
        assert_eq!(count.resolve(), 250);

        let text: QuantityInput = serde_json::from_str("\"500 copies\"").unwrap();
        assert_eq!(text.resolve(), 500);

        let nonsense: QuantityInput = serde_json::from_str("\"a few\"").unwrap();
        assert_eq!(nonsense.resolve(), 1);

        assert_eq!(QuantityInput::Count(0).resolve(), 1);
    }
}
