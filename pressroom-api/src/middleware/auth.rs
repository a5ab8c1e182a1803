use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

pub const ROLE_CUSTOMER: &str = "CUSTOMER";
pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_SUPER_ADMIN: &str = "SUPER_ADMIN";

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminClaims {
    pub sub: String,
    pub email: Option<String>,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: usize,
}

fn bearer_token(req: &Request) -> Result<String, AppError> {
    req.headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))
}

// ============================================================================
// Customer Authentication Middleware
// ============================================================================

pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)?;

    let token_data = decode::<CustomerClaims>(
        &token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthenticationError("Invalid token".to_string()))?;

    if token_data.claims.role != ROLE_CUSTOMER {
        return Err(AppError::AuthorizationError("Customer account required".to_string()));
    }

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

// ============================================================================
// Admin Authentication Middleware
// ============================================================================

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)?;

    let token_data = decode::<AdminClaims>(
        &token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthenticationError("Invalid token".to_string()))?;

    if token_data.claims.role != ROLE_ADMIN && token_data.claims.role != ROLE_SUPER_ADMIN {
        return Err(AppError::AuthorizationError("Admin access required".to_string()));
    }

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

// ============================================================================
// Permission Check Helpers
// ============================================================================

pub fn has_permission(claims: &AdminClaims, permission: &str) -> bool {
    claims.role == ROLE_SUPER_ADMIN || claims.permissions.iter().any(|p| p == permission)
}

pub fn require_permission(claims: &AdminClaims, permission: &str) -> Result<(), AppError> {
    if has_permission(claims, permission) {
        Ok(())
    } else {
        Err(AppError::AuthorizationError(format!("Missing permission: {}", permission)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str, permissions: &[&str]) -> AdminClaims {
        AdminClaims {
            sub: "admin-1".to_string(),
            email: None,
            role: role.to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            exp: 0,
        }
    }

    #[test]
    fn test_has_permission() {
        assert!(has_permission(&claims(ROLE_ADMIN, &["quotes:write"]), "quotes:write"));
        assert!(!has_permission(&claims(ROLE_ADMIN, &["quotes:write"]), "catalog:write"));
        assert!(has_permission(&claims(ROLE_SUPER_ADMIN, &[]), "catalog:write"));
        assert!(require_permission(&claims(ROLE_ADMIN, &[]), "orders:write").is_err());
    }
}
