use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use pressroom_quote::{NewPriceMatchRequest, PriceMatchRequest};

use crate::{error::AppError, events, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/price-match", post(submit_price_match))
}

/// POST /v1/price-match
async fn submit_price_match(
    State(state): State<AppState>,
    Json(req): Json<NewPriceMatchRequest>,
) -> Result<(StatusCode, Json<PriceMatchRequest>), AppError> {
    if let Some(product_id) = req.product_id {
        if state.products.get(product_id).await?.is_none() {
            return Err(AppError::ValidationError(format!("Unknown product: {}", product_id)));
        }
    }

    let request = PriceMatchRequest::new(req)?;
    state.price_matches.create(&request).await?;
    tracing::info!(request_id = %request.id, competitor = %request.competitor_name, "Price match request received");

    state.notify(events::price_match_submitted(&request)).await;
    Ok((StatusCode::CREATED, Json(request)))
}
