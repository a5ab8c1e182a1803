use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::{AdminClaims, ROLE_ADMIN},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/admin", post(login_admin))
}

/// POST /v1/auth/admin
/// Swap the back-office API key for a short-lived admin token
async fn login_admin(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if state.auth.admin_api_key.is_empty() || req.api_key != state.auth.admin_api_key {
        tracing::warn!("Rejected admin login with invalid API key");
        return Err(AppError::AuthenticationError("Invalid API key".to_string()));
    }

    let claims = AdminClaims {
        sub: format!("admin-{}", Uuid::new_v4()),
        email: None,
        role: ROLE_ADMIN.to_owned(),
        permissions: state.auth.admin_permissions.clone(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(state.auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;

    Ok(Json(AuthResponse {
        token,
        expires_in: state.auth.expiration,
    }))
}
