use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::api::format::BookView;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthAccount};
use crate::state::AppState;
use crate::validation::is_string_provided;

use super::{require_isbn, BOOK_NOT_FOUND};

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: Option<String>,
}

/// Confirmation plus the removed book
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: String,
    pub entry: BookView,
}

/// DELETE /c/books/:isbn13
pub async fn delete_by_isbn(
    State(state): State<AppState>,
    account: AuthAccount,
    Path(isbn): Path<String>,
) -> ApiResult<Deleted> {
    let isbn = require_isbn(&isbn)?;

    let book = state
        .store
        .delete_by_isbn(&isbn)
        .await?
        .ok_or_else(|| ApiError::not_found(BOOK_NOT_FOUND))?;

    tracing::info!(request_id = %account.request_id, "Account {} deleted book {}", account.id, isbn);
    Ok(ApiResponse::success(Deleted {
        message: format!("Deleted book with ISBN {}", isbn),
        entry: BookView::from(book),
    }))
}

/// DELETE /c/books/title?title= - the title must match exactly one book
pub async fn delete_by_title(
    State(state): State<AppState>,
    account: AuthAccount,
    Query(query): Query<TitleQuery>,
) -> ApiResult<Deleted> {
    let Some(title) = query.title.filter(|t| is_string_provided(t)) else {
        return Err(ApiError::bad_request("Invalid or missing title"));
    };

    let book = state
        .store
        .delete_by_title(&title)
        .await?
        .ok_or_else(|| ApiError::not_found("No book with that title"))?;

    tracing::info!(
        request_id = %account.request_id,
        "Account {} deleted book {} by title",
        account.id,
        book.isbn13
    );
    Ok(ApiResponse::success(Deleted {
        message: format!("Deleted book titled {}", title),
        entry: BookView::from(book),
    }))
}
