use axum::extract::{Query, State};
use serde::Deserialize;
use std::ops::RangeInclusive;

use crate::api::format::book_views;
use crate::database::models::BookSearch;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthAccount};
use crate::state::AppState;
use crate::validation::{is_string_provided, non_negative_int};

use super::BookList;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub author: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    #[serde(rename = "beginningYear")]
    pub beginning_year: Option<String>,
    #[serde(rename = "endingYear")]
    pub ending_year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RatingCountQuery {
    #[serde(rename = "ratingCountBegin")]
    pub begin: Option<String>,
    #[serde(rename = "ratingCountEnd")]
    pub end: Option<String>,
}

/// GET /c/books?author=&title= - case-insensitive substring search
///
/// Both filters are ANDed when present; at least one is required.
pub async fn search_books(
    State(state): State<AppState>,
    account: AuthAccount,
    Query(query): Query<SearchQuery>,
) -> ApiResult<BookList> {
    let search = BookSearch {
        author: query.author.filter(|a| is_string_provided(a)),
        title: query.title.filter(|t| is_string_provided(t)),
    };
    if search.author.is_none() && search.title.is_none() {
        return Err(ApiError::bad_request(
            "Missing search parameters - provide author and/or title",
        ));
    }
    tracing::debug!(request_id = %account.request_id, ?search, "Searching books");

    let books = state.store.search(&search).await?;
    if books.is_empty() {
        return Err(ApiError::not_found("No books matched the search"));
    }
    Ok(ApiResponse::success(BookList {
        entries: book_views(books),
    }))
}

/// GET /c/books/year?beginningYear=&endingYear= - publication year range, inclusive
pub async fn by_year(
    State(state): State<AppState>,
    account: AuthAccount,
    Query(query): Query<YearQuery>,
) -> ApiResult<BookList> {
    let years = inclusive_range(&query.beginning_year, &query.ending_year).map_err(|problem| {
        ApiError::bad_request(match problem {
            RangeProblem::Missing => {
                "Invalid or missing year - beginningYear and endingYear must be non-negative integers"
            }
            RangeProblem::Reversed => "endingYear must not be before beginningYear",
        })
    })?;
    tracing::debug!(request_id = %account.request_id, ?years, "Books by publication year");

    let books = state.store.by_publication_year(years).await?;
    if books.is_empty() {
        return Err(ApiError::not_found("No books published in that range"));
    }
    Ok(ApiResponse::success(BookList {
        entries: book_views(books),
    }))
}

/// GET /c/books/rating?ratingCountBegin=&ratingCountEnd= - total ratings range, inclusive
pub async fn by_rating_count(
    State(state): State<AppState>,
    account: AuthAccount,
    Query(query): Query<RatingCountQuery>,
) -> ApiResult<BookList> {
    let counts = inclusive_range(&query.begin, &query.end).map_err(|problem| {
        ApiError::bad_request(match problem {
            RangeProblem::Missing => {
                "Invalid or missing rating count - ratingCountBegin and ratingCountEnd must be non-negative integers"
            }
            RangeProblem::Reversed => "ratingCountEnd must not be less than ratingCountBegin",
        })
    })?;
    tracing::debug!(request_id = %account.request_id, ?counts, "Books by rating count");

    let books = state.store.by_rating_count(counts).await?;
    if books.is_empty() {
        return Err(ApiError::not_found("No books with a rating count in that range"));
    }
    Ok(ApiResponse::success(BookList {
        entries: book_views(books),
    }))
}

#[derive(Debug, PartialEq, Eq)]
enum RangeProblem {
    Missing,
    Reversed,
}

/// Both bounds required; no defaults are substituted
fn inclusive_range(
    begin: &Option<String>,
    end: &Option<String>,
) -> Result<RangeInclusive<i32>, RangeProblem> {
    let (Some(begin), Some(end)) = (non_negative_int(begin), non_negative_int(end)) else {
        return Err(RangeProblem::Missing);
    };
    if end < begin {
        return Err(RangeProblem::Reversed);
    }
    Ok(begin..=end)
}
