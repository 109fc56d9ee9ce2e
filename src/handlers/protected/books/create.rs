use axum::{extract::State, Json};
use serde_json::Value;

use crate::api::format::BookView;
use crate::database::models::{NewBook, RatingBuckets};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthAccount};
use crate::state::AppState;
use crate::validation::{isbn13, non_negative_int, provided_str};

use super::INVALID_ISBN;

/**
 * POST /c/books - Add a book across Books, BookAuthors and Ratings
 *
 * Expected Input:
 * ```json
 * {
 *   "isbn13": "9780000000002",
 *   "authors": "A. Writer, B. Writer",
 *   "publication_year": 1999,
 *   "original_title": "Original",
 *   "title": "Title",
 *   "image_url": null,
 *   "image_small_url": null,
 *   "rating_1": 0, "rating_2": 0, "rating_3": 0, "rating_4": 0, "rating_5": 0
 * }
 * ```
 * Rating buckets default to 0. Images are given together or not at all.
 * Responds 201 with the stored book, including computed rating_count/rating_avg.
 */
pub async fn create_book(
    State(state): State<AppState>,
    account: AuthAccount,
    Json(body): Json<Value>,
) -> ApiResult<BookView> {
    let book = validate_new_book(&body)?;
    tracing::debug!(request_id = %account.request_id, "Creating book {}", book.isbn13);

    let created = state.store.create(book).await?;
    tracing::info!(
        request_id = %account.request_id,
        "Account {} added book {} (id {})",
        account.id,
        created.isbn13,
        created.id
    );
    Ok(ApiResponse::created(BookView::from(created)))
}

fn validate_new_book(body: &Value) -> Result<NewBook, ApiError> {
    let isbn13 = isbn13(&body["isbn13"]).ok_or_else(|| ApiError::bad_request(INVALID_ISBN))?;

    let authors = provided_str(&body["authors"])
        .ok_or_else(|| ApiError::bad_request("Invalid or missing authors"))?;
    let publication_year = non_negative_int(&body["publication_year"])
        .ok_or_else(|| ApiError::bad_request("Invalid or missing publication_year"))?;
    let original_title = provided_str(&body["original_title"])
        .ok_or_else(|| ApiError::bad_request("Invalid or missing original_title"))?;
    let title = provided_str(&body["title"])
        .ok_or_else(|| ApiError::bad_request("Invalid or missing title"))?;

    let (image_url, image_small_url) = images(body)?;

    let mut ratings = RatingBuckets::default();
    for (i, slot) in ratings.0.iter_mut().enumerate() {
        let field = format!("rating_{}", i + 1);
        match &body[field.as_str()] {
            Value::Null => {}
            value => {
                *slot = non_negative_int(value).ok_or_else(|| {
                    ApiError::bad_request(format!("Invalid {} - must be a non-negative integer", field))
                })?;
            }
        }
    }
    ratings.total()?;

    Ok(NewBook {
        isbn13,
        authors: authors.to_string(),
        publication_year,
        original_title: original_title.to_string(),
        title: title.to_string(),
        image_url,
        image_small_url,
        ratings,
    })
}

/// Both image URLs, or neither
fn images(body: &Value) -> Result<(Option<String>, Option<String>), ApiError> {
    let large = &body["image_url"];
    let small = &body["image_small_url"];
    match (large, small) {
        (Value::Null, Value::Null) => Ok((None, None)),
        _ => match (provided_str(large), provided_str(small)) {
            (Some(large), Some(small)) => Ok((Some(large.to_string()), Some(small.to_string()))),
            _ => Err(ApiError::bad_request(
                "image_url and image_small_url must both be provided or both omitted",
            )),
        },
    }
}
