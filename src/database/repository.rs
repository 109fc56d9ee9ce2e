//! Persistence seams used by the handlers.
//!
//! `PgStore` implements these against PostgreSQL; handler tests swap in an
//! in-memory implementation.

use async_trait::async_trait;
use std::ops::RangeInclusive;

use crate::auth::Credential;
use crate::database::manager::DatabaseError;
use crate::database::models::{Account, Book, BookSearch, NewAccount, NewBook, RatingDelta};

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert the account and its credential together
    async fn create_account(
        &self,
        account: NewAccount,
        credential: Credential,
    ) -> Result<Account, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<(Account, Credential)>, DatabaseError>;

    async fn credential_for(&self, account_id: i32) -> Result<Option<Credential>, DatabaseError>;

    /// Replace salt and hash in one statement; exactly one row must change
    async fn replace_credential(
        &self,
        account_id: i32,
        credential: Credential,
    ) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn find_by_isbn(&self, isbn13: &str) -> Result<Option<Book>, DatabaseError>;

    /// Case-insensitive substring match on authors and/or title, id order
    async fn search(&self, search: &BookSearch) -> Result<Vec<Book>, DatabaseError>;

    async fn by_publication_year(&self, years: RangeInclusive<i32>) -> Result<Vec<Book>, DatabaseError>;

    async fn by_rating_count(&self, counts: RangeInclusive<i32>) -> Result<Vec<Book>, DatabaseError>;

    /// Up to `limit` books with `id > cursor`, id ascending
    async fn page_after(&self, cursor: i32, limit: i64) -> Result<Vec<Book>, DatabaseError>;

    /// Up to `limit` books skipping the first `offset`, id ascending
    async fn page_at_offset(&self, offset: i64, limit: i64) -> Result<Vec<Book>, DatabaseError>;

    async fn count(&self) -> Result<i64, DatabaseError>;

    /// Insert into Books, BookAuthors and Ratings in one transaction
    async fn create(&self, book: NewBook) -> Result<Book, DatabaseError>;

    /// Add `delta` to the rating buckets; `None` when the ISBN is unknown
    async fn apply_rating_delta(
        &self,
        isbn13: &str,
        delta: RatingDelta,
    ) -> Result<Option<Book>, DatabaseError>;

    /// Remove the book from all three tables, returning what was removed
    async fn delete_by_isbn(&self, isbn13: &str) -> Result<Option<Book>, DatabaseError>;

    /// Like `delete_by_isbn`, but the title must identify exactly one book
    async fn delete_by_title(&self, title: &str) -> Result<Option<Book>, DatabaseError>;
}

/// Everything the HTTP layer needs from persistence
#[async_trait]
pub trait Store: AccountStore + BookStore {
    async fn health_check(&self) -> Result<(), DatabaseError>;
}
