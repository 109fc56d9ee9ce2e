use axum::extract::{Path, State};

use crate::api::format::BookView;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthAccount};
use crate::state::AppState;

use super::{require_isbn, BOOK_NOT_FOUND};

/// GET /c/books/:isbn13 - one book by ISBN
pub async fn get_by_isbn(
    State(state): State<AppState>,
    account: AuthAccount,
    Path(isbn): Path<String>,
) -> ApiResult<BookView> {
    let isbn = require_isbn(&isbn)?;
    tracing::debug!(request_id = %account.request_id, "Fetching book {}", isbn);

    let book = state
        .store
        .find_by_isbn(&isbn)
        .await?
        .ok_or_else(|| ApiError::not_found(BOOK_NOT_FOUND))?;

    Ok(ApiResponse::success(BookView::from(book)))
}
