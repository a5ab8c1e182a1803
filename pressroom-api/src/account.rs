use axum::{extract::State, routing::get, Extension, Json, Router};
use pressroom_order::Order;
use pressroom_quote::QuoteRequest;
use pressroom_store::{OrderFilter, QuoteFilter};

use crate::{error::AppError, middleware::auth::CustomerClaims, state::AppState};

/// Routes for signed-in customers. The caller layers `customer_auth_middleware` on top.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/account/orders", get(my_orders))
        .route("/v1/account/quotes", get(my_quotes))
}

/// GET /v1/account/orders
async fn my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Vec<Order>>, AppError> {
    let filter = OrderFilter {
        status: None,
        customer_email: Some(claims.email),
    };
    Ok(Json(state.orders.list(&filter).await?))
}

/// GET /v1/account/quotes
async fn my_quotes(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Vec<QuoteRequest>>, AppError> {
    let filter = QuoteFilter {
        status: None,
        customer_email: Some(claims.email),
    };
    Ok(Json(state.quotes.list(&filter).await?))
}
