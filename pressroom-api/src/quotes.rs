use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use pressroom_quote::{NewQuoteRequest, QuoteRequest};
use uuid::Uuid;

use crate::{error::AppError, events, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/quotes", post(submit_quote))
        .route("/v1/quotes/{id}", get(get_quote))
}

/// POST /v1/quotes
async fn submit_quote(
    State(state): State<AppState>,
    Json(mut req): Json<NewQuoteRequest>,
) -> Result<(StatusCode, Json<QuoteRequest>), AppError> {
    if let Some(product_id) = req.product_id {
        let product = state
            .products
            .get(product_id)
            .await?
            .ok_or_else(|| AppError::ValidationError(format!("Unknown product: {}", product_id)))?;
        req.product_name.get_or_insert(product.name);
    }

    let quote = QuoteRequest::new(req)?;
    state.quotes.create(&quote).await?;
    tracing::info!(reference = %quote.reference, "Quote request received");

    state.notify(events::quote_submitted(&quote)).await;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// GET /v1/quotes/{id}
async fn get_quote(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<QuoteRequest>, AppError> {
    let quote = state
        .quotes
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Quote not found: {}", id)))?;
    Ok(Json(quote))
}
