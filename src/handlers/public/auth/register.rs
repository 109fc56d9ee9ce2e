// handlers/public/auth/register.rs - POST /register handler

use axum::{extract::State, Json};
use serde_json::Value;

use crate::api::format::AccessGrant;
use crate::auth::Credential;
use crate::database::models::NewAccount;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{
    is_valid_email, is_valid_password, is_valid_phone, is_valid_role, provided_str, signed_int,
};

/**
 * POST /register - Create an account and receive an access token
 *
 * Expected Input:
 * ```json
 * {
 *   "firstname": "Ada",
 *   "lastname": "Lovelace",
 *   "username": "ada",
 *   "email": "ada@example.com",
 *   "phone": "2065550100",
 *   "password": "correct horse",
 *   "role": 1
 * }
 * ```
 *
 * Responds 201 with `{ accessToken, user }`.
 */
pub async fn register_post(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<AccessGrant> {
    let (account, password) = validate_registration(&body)?;
    tracing::debug!("Registering account {}", account.username);

    let credential = Credential::derive(password, state.config.security.salt_length);
    let account = state.store.create_account(account, credential).await?;

    let claims = state
        .tokens
        .claims_for(account.id, account.firstname.clone(), account.role);
    let access_token = state.tokens.issue(&claims)?;

    tracing::info!("Registered account {} ({})", account.id, account.username);
    Ok(ApiResponse::created(AccessGrant {
        access_token,
        user: account,
    }))
}

/// Field checks in a fixed order; the first failure decides the message
fn validate_registration(body: &Value) -> Result<(NewAccount, &str), ApiError> {
    let (Some(firstname), Some(lastname), Some(username), Some(email), Some(phone), Some(password)) = (
        provided_str(&body["firstname"]),
        provided_str(&body["lastname"]),
        provided_str(&body["username"]),
        provided_str(&body["email"]),
        provided_str(&body["phone"]),
        provided_str(&body["password"]),
    ) else {
        return Err(ApiError::bad_request("Missing required information"));
    };

    if !is_valid_phone(phone) {
        return Err(ApiError::bad_request("Invalid or missing phone number"));
    }
    if !is_valid_password(password) {
        return Err(ApiError::bad_request("Invalid or missing password"));
    }
    if !is_valid_email(email) {
        return Err(ApiError::bad_request("Invalid or missing email"));
    }
    let role = signed_int(&body["role"])
        .filter(|role| is_valid_role(*role))
        .ok_or_else(|| ApiError::bad_request("Invalid or missing role - must be between 1 and 5"))?;

    let account = NewAccount {
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        role,
    };
    Ok((account, password))
}
