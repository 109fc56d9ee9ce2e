use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated account context extracted from the JWT
#[derive(Clone, Debug)]
pub struct AuthAccount {
    pub id: i32,
    pub name: String,
    pub role: i32,
    /// Correlates log lines for one request
    pub request_id: Uuid,
}

impl From<Claims> for AuthAccount {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            name: claims.name,
            role: claims.role,
            request_id: Uuid::new_v4(),
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthAccount {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthAccount>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Auth token is not supplied"))
    }
}

/// JWT authentication middleware that validates tokens and injects `AuthAccount`
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_token(&headers) else {
        tracing::warn!("Rejected {} {}: no auth token", request.method(), request.uri().path());
        return Err(ApiError::unauthorized("Auth token is not supplied"));
    };

    let claims = state.tokens.verify(&token)?;
    let account = AuthAccount::from(claims);
    tracing::debug!(
        request_id = %account.request_id,
        account_id = account.id,
        "Authenticated {} {}",
        request.method(),
        request.uri().path()
    );

    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}

/// Token from `x-access-token` or `Authorization`, with any `Bearer ` prefix removed
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get("x-access-token")
        .or_else(|| headers.get(axum::http::header::AUTHORIZATION))?
        .to_str()
        .ok()?;

    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
