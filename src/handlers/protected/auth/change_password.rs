// handlers/protected/auth/change_password.rs - PATCH /change-password handler

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::auth::Credential;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthAccount};
use crate::state::AppState;
use crate::validation::{is_valid_password, provided_str};

/**
 * PATCH /change-password (alias /changePassword) - Replace the caller's password
 *
 * Expected Input:
 * ```json
 * { "currentPassword": "old secret", "newPassword": "new secret" }
 * ```
 * `oldPassword` is accepted in place of `currentPassword`.
 *
 * The stored salt and hash are both replaced; the old salt is never reused.
 */
pub async fn change_password_patch(
    State(state): State<AppState>,
    account: AuthAccount,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let current = provided_str(&body["currentPassword"]).or_else(|| provided_str(&body["oldPassword"]));
    let (Some(current), Some(new)) = (current, provided_str(&body["newPassword"])) else {
        return Err(ApiError::bad_request(
            "Missing required fields: currentPassword and/or newPassword",
        ));
    };

    if !is_valid_password(new) {
        return Err(ApiError::bad_request("Invalid new password - must be at least 8 characters"));
    }
    if new == current {
        return Err(ApiError::bad_request(
            "New password must be different from the current password",
        ));
    }

    let Some(stored) = state.store.credential_for(account.id).await? else {
        return Err(ApiError::not_found("User not found"));
    };

    if !stored.verify(current) {
        tracing::warn!(
            request_id = %account.request_id,
            "Password change rejected for account {}: current password mismatch",
            account.id
        );
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let replacement = Credential::derive(new, state.config.security.salt_length);
    state.store.replace_credential(account.id, replacement).await?;

    tracing::info!(request_id = %account.request_id, "Account {} changed password", account.id);
    Ok(ApiResponse::success(json!({ "message": "Password updated successfully" })))
}
