use axum::extract::{Query, State};
use serde::Deserialize;

use crate::api::format::{book_views, BookPage, PageInfo};
use crate::config::ApiConfig;
use crate::database::models::Book;
use crate::middleware::{ApiResponse, ApiResult, AuthAccount};
use crate::state::AppState;
use crate::validation::{non_negative_int, signed_int, valid_rating_or_year};

#[derive(Debug, Deserialize)]
pub struct CursorQuery {
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OffsetQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// GET /c/books/cursor?limit=&cursor= - keyset page ordered by id
pub async fn page_by_cursor(
    State(state): State<AppState>,
    account: AuthAccount,
    Query(query): Query<CursorQuery>,
) -> ApiResult<BookPage> {
    let limit = resolve_limit(&query.limit, &state.config.api);
    let cursor = resolve_cursor(&query.cursor);
    tracing::debug!(request_id = %account.request_id, limit, cursor, "Cursor page");

    let books = state.store.page_after(cursor, limit).await?;
    let total_records = state.store.count().await?;
    let next = next_cursor(&books, cursor);

    Ok(ApiResponse::success(BookPage {
        entries: book_views(books),
        pagination: PageInfo {
            total_records,
            limit,
            cursor: Some(next),
            offset: None,
        },
    }))
}

/// GET /c/books/offset?limit=&offset= - LIMIT/OFFSET page ordered by id
pub async fn page_by_offset(
    State(state): State<AppState>,
    account: AuthAccount,
    Query(query): Query<OffsetQuery>,
) -> ApiResult<BookPage> {
    let limit = resolve_limit(&query.limit, &state.config.api);
    let offset = resolve_offset(&query.offset);
    tracing::debug!(request_id = %account.request_id, limit, offset, "Offset page");

    let books = state.store.page_at_offset(offset, limit).await?;
    let total_records = state.store.count().await?;

    Ok(ApiResponse::success(BookPage {
        entries: book_views(books),
        pagination: PageInfo {
            total_records,
            limit,
            cursor: None,
            offset: Some(offset + limit),
        },
    }))
}

/// Requested page size; non-positive or non-numeric falls back to the default,
/// anything above the configured maximum is capped
fn resolve_limit(raw: &Option<String>, api: &ApiConfig) -> i64 {
    non_negative_int(raw)
        .map(i64::from)
        .filter(|limit| *limit > 0)
        .unwrap_or(api.default_page_limit)
        .min(api.max_page_limit)
}

/// Ids are INT, so a cursor past `i32::MAX` is clamped and yields an empty page
fn resolve_cursor(raw: &Option<String>) -> i32 {
    match non_negative_int(raw) {
        Some(cursor) => cursor,
        None if valid_rating_or_year(raw) => i32::MAX,
        None => 0,
    }
}

fn resolve_offset(raw: &Option<String>) -> i64 {
    signed_int(raw).map(|offset| i64::from(offset.max(0))).unwrap_or(0)
}

/// Highest id on the page, or the requested cursor when the page is empty
fn next_cursor(page: &[Book], requested: i32) -> i32 {
    page.iter().map(|book| book.id).max().unwrap_or(requested)
}
