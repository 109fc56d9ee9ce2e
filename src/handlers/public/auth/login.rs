// handlers/public/auth/login.rs - POST /login handler

use axum::{extract::State, Json};
use serde_json::Value;

use crate::api::format::AccessGrant;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::provided_str;

/**
 * POST /login - Authenticate with email and password and receive a JWT
 *
 * Expected Input:
 * ```json
 * { "email": "ada@example.com", "password": "correct horse" }
 * ```
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "success": true,
 *   "data": {
 *     "accessToken": "eyJhbGciOiJIUzI1NiI...",
 *     "user": { "id": 1, "firstname": "Ada", "email": "ada@example.com", "role": 1, ... }
 *   }
 * }
 * ```
 *
 * An unknown email and a wrong password get the same answer.
 */
pub async fn login_post(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<AccessGrant> {
    let (Some(email), Some(password)) = (provided_str(&body["email"]), provided_str(&body["password"])) else {
        return Err(ApiError::bad_request("Missing required information"));
    };

    let Some((account, credential)) = state.store.find_by_email(email).await? else {
        tracing::warn!("Login rejected: no account for {}", email);
        return Err(ApiError::bad_request("Credentials did not match"));
    };

    if !credential.verify(password) {
        tracing::warn!("Login rejected: bad password for account {}", account.id);
        return Err(ApiError::bad_request("Credentials did not match"));
    }

    let claims = state
        .tokens
        .claims_for(account.id, account.firstname.clone(), account.role);
    let access_token = state.tokens.issue(&claims)?;

    tracing::info!("Account {} logged in", account.id);
    Ok(ApiResponse::success(AccessGrant {
        access_token,
        user: account,
    }))
}
