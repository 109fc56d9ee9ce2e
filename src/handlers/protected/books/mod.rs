// handlers/protected/books/mod.rs - Book catalog endpoints under /c/books
//
// Every handler validates its inputs first (answering 400 before any I/O),
// then makes one store call and maps the rows into `BookView`s.

use serde::Serialize;

use crate::api::format::BookView;
use crate::error::ApiError;
use crate::validation::isbn13;

pub mod create;     // POST   /c/books
pub mod delete;     // DELETE /c/books/:isbn13, /c/books/title
pub mod get;        // GET    /c/books/:isbn13
pub mod pagination; // GET    /c/books/cursor, /c/books/offset
pub mod search;     // GET    /c/books, /c/books/year, /c/books/rating
pub mod update;     // PATCH  /c/books/:isbn13

pub use create::create_book;
pub use delete::{delete_by_isbn, delete_by_title};
pub use get::get_by_isbn;
pub use pagination::{page_by_cursor, page_by_offset};
pub use search::{by_rating_count, by_year, search_books};
pub use update::patch_ratings;

const INVALID_ISBN: &str = "Invalid or missing ISBN - must be 13 digits";
const BOOK_NOT_FOUND: &str = "Book not found";

/// Validated ISBN-13 from a path segment
pub(crate) fn require_isbn(raw: &str) -> Result<String, ApiError> {
    isbn13(raw).ok_or_else(|| ApiError::bad_request(INVALID_ISBN))
}

/// Response body for searches that return every match
#[derive(Debug, Serialize)]
pub struct BookList {
    pub entries: Vec<BookView>,
}
