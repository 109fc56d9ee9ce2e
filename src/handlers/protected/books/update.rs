use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::api::format::BookView;
use crate::database::models::RatingDelta;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthAccount};
use crate::state::AppState;
use crate::validation::signed_int;

use super::{require_isbn, BOOK_NOT_FOUND};

/**
 * PATCH /c/books/:isbn13 - Adjust rating bucket counts
 *
 * Expected Input (any subset, values are signed deltas):
 * ```json
 * { "rating_1": -1, "rating_5": 2 }
 * ```
 * A delta that would take any bucket below zero rejects the whole patch
 * with 422 and leaves every bucket unchanged.
 */
pub async fn patch_ratings(
    State(state): State<AppState>,
    account: AuthAccount,
    Path(isbn): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<BookView> {
    let isbn = require_isbn(&isbn)?;
    let delta = rating_delta(&body)?;
    tracing::debug!(request_id = %account.request_id, ?delta, "Patching ratings for {}", isbn);

    let book = state
        .store
        .apply_rating_delta(&isbn, delta)
        .await?
        .ok_or_else(|| ApiError::not_found(BOOK_NOT_FOUND))?;

    Ok(ApiResponse::success(BookView::from(book)))
}

fn rating_delta(body: &Value) -> Result<RatingDelta, ApiError> {
    let mut delta = RatingDelta::default();
    for (i, slot) in delta.0.iter_mut().enumerate() {
        let field = format!("rating_{}", i + 1);
        match &body[field.as_str()] {
            Value::Null => {}
            value => {
                *slot = signed_int(value).ok_or_else(|| {
                    ApiError::bad_request(format!("Invalid {} - must be an integer", field))
                })?;
            }
        }
    }

    if delta.is_zero() {
        return Err(ApiError::bad_request(
            "No rating changes supplied - provide at least one of rating_1..rating_5",
        ));
    }
    Ok(delta)
}
