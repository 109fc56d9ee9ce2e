//! In-memory store and router harness for handler tests.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, MutexGuard};
use tower::ServiceExt;

use crate::auth::{Credential, TokenService};
use crate::config::AppConfig;
use crate::database::models::{
    Account, Book, BookSearch, NewAccount, NewBook, RatingBuckets, RatingDelta,
};
use crate::database::{AccountStore, BookStore, DatabaseError, Store};
use crate::state::AppState;

/// Book row with the computed columns filled in the way the database does
pub fn sample_book(id: i32, isbn13: &str) -> Book {
    materialize(
        id,
        NewBook {
            isbn13: isbn13.to_string(),
            authors: "Sample Author".to_string(),
            publication_year: 2000,
            original_title: "Sample".to_string(),
            title: "Sample".to_string(),
            image_url: None,
            image_small_url: None,
            ratings: RatingBuckets::default(),
        },
    )
    .expect("empty buckets fit")
}

fn materialize(id: i32, book: NewBook) -> Result<Book, DatabaseError> {
    let mut row = Book {
        id,
        isbn13: book.isbn13,
        authors: book.authors,
        publication_year: book.publication_year,
        original_title: book.original_title,
        title: book.title,
        image_url: book.image_url,
        image_small_url: book.image_small_url,
        rating_1: 0,
        rating_2: 0,
        rating_3: 0,
        rating_4: 0,
        rating_5: 0,
        rating_count: 0,
        rating_avg: Default::default(),
    };
    set_ratings(&mut row, book.ratings)?;
    Ok(row)
}

fn set_ratings(book: &mut Book, buckets: RatingBuckets) -> Result<(), DatabaseError> {
    let [r1, r2, r3, r4, r5] = buckets.0;
    book.rating_1 = r1;
    book.rating_2 = r2;
    book.rating_3 = r3;
    book.rating_4 = r4;
    book.rating_5 = r5;
    book.rating_count = buckets.total()?;
    book.rating_avg = buckets.average();
    Ok(())
}

#[derive(Default)]
struct Tables {
    accounts: Vec<(Account, Credential)>,
    books: Vec<Book>,
    last_account_id: i32,
    last_book_id: i32,
}

/// Store backed by vectors behind a mutex; mirrors the unique constraints and
/// the all-or-nothing writes of the PostgreSQL store
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn book_count(&self) -> usize {
        self.tables().books.len()
    }
}

fn duplicate(constraint: &str) -> DatabaseError {
    DatabaseError::Duplicate {
        constraint: constraint.to_string(),
    }
}

fn sorted(mut books: Vec<Book>) -> Vec<Book> {
    books.sort_by_key(|b| b.id);
    books
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(
        &self,
        account: NewAccount,
        credential: Credential,
    ) -> Result<Account, DatabaseError> {
        let mut tables = self.tables();
        if tables.accounts.iter().any(|(a, _)| a.username == account.username) {
            return Err(duplicate("account_username_key"));
        }
        if tables.accounts.iter().any(|(a, _)| a.email == account.email) {
            return Err(duplicate("account_email_key"));
        }
        tables.last_account_id += 1;
        let created = Account {
            id: tables.last_account_id,
            firstname: account.firstname,
            lastname: account.lastname,
            username: account.username,
            email: account.email,
            phone: account.phone,
            role: account.role,
        };
        tables.accounts.push((created.clone(), credential));
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<(Account, Credential)>, DatabaseError> {
        Ok(self.tables().accounts.iter().find(|(a, _)| a.email == email).cloned())
    }

    async fn credential_for(&self, account_id: i32) -> Result<Option<Credential>, DatabaseError> {
        Ok(self
            .tables()
            .accounts
            .iter()
            .find(|(a, _)| a.id == account_id)
            .map(|(_, c)| c.clone()))
    }

    async fn replace_credential(
        &self,
        account_id: i32,
        credential: Credential,
    ) -> Result<(), DatabaseError> {
        let mut tables = self.tables();
        let affected = match tables.accounts.iter_mut().find(|(a, _)| a.id == account_id) {
            Some((_, stored)) => {
                *stored = credential;
                1
            }
            None => 0,
        };
        DatabaseError::expect_rows(1, affected)
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn find_by_isbn(&self, isbn13: &str) -> Result<Option<Book>, DatabaseError> {
        Ok(self.tables().books.iter().find(|b| b.isbn13 == isbn13).cloned())
    }

    async fn search(&self, search: &BookSearch) -> Result<Vec<Book>, DatabaseError> {
        let matches = |haystack: &str, needle: &Option<String>| {
            needle
                .as_ref()
                .map_or(true, |n| haystack.to_lowercase().contains(&n.to_lowercase()))
        };
        let found = self
            .tables()
            .books
            .iter()
            .filter(|b| matches(&b.authors, &search.author) && matches(&b.title, &search.title))
            .cloned()
            .collect();
        Ok(sorted(found))
    }

    async fn by_publication_year(&self, years: RangeInclusive<i32>) -> Result<Vec<Book>, DatabaseError> {
        let found = self
            .tables()
            .books
            .iter()
            .filter(|b| years.contains(&b.publication_year))
            .cloned()
            .collect();
        Ok(sorted(found))
    }

    async fn by_rating_count(&self, counts: RangeInclusive<i32>) -> Result<Vec<Book>, DatabaseError> {
        let found = self
            .tables()
            .books
            .iter()
            .filter(|b| counts.contains(&b.rating_count))
            .cloned()
            .collect();
        Ok(sorted(found))
    }

    async fn page_after(&self, cursor: i32, limit: i64) -> Result<Vec<Book>, DatabaseError> {
        let books = sorted(self.tables().books.clone());
        Ok(books
            .into_iter()
            .filter(|b| b.id > cursor)
            .take(limit as usize)
            .collect())
    }

    async fn page_at_offset(&self, offset: i64, limit: i64) -> Result<Vec<Book>, DatabaseError> {
        let books = sorted(self.tables().books.clone());
        Ok(books
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(self.tables().books.len() as i64)
    }

    async fn create(&self, book: NewBook) -> Result<Book, DatabaseError> {
        let mut tables = self.tables();
        if tables.books.iter().any(|b| b.isbn13 == book.isbn13) {
            return Err(duplicate("books_isbn13_key"));
        }
        let row = materialize(tables.last_book_id + 1, book)?;
        tables.last_book_id = row.id;
        tables.books.push(row.clone());
        Ok(row)
    }

    async fn apply_rating_delta(
        &self,
        isbn13: &str,
        delta: RatingDelta,
    ) -> Result<Option<Book>, DatabaseError> {
        let mut tables = self.tables();
        let Some(book) = tables.books.iter_mut().find(|b| b.isbn13 == isbn13) else {
            return Ok(None);
        };
        let next = book.buckets().apply(&delta)?;
        set_ratings(book, next)?;
        Ok(Some(book.clone()))
    }

    async fn delete_by_isbn(&self, isbn13: &str) -> Result<Option<Book>, DatabaseError> {
        let mut tables = self.tables();
        let position = tables.books.iter().position(|b| b.isbn13 == isbn13);
        Ok(position.map(|i| tables.books.remove(i)))
    }

    async fn delete_by_title(&self, title: &str) -> Result<Option<Book>, DatabaseError> {
        let mut tables = self.tables();
        let positions: Vec<usize> = tables
            .books
            .iter()
            .enumerate()
            .filter(|(_, b)| b.title == title)
            .map(|(i, _)| i)
            .collect();
        match positions.as_slice() {
            [] => Ok(None),
            [i] => Ok(Some(tables.books.remove(*i))),
            many => Err(DatabaseError::Ambiguous {
                what: format!("Title '{}'", title),
                count: many.len() as i64,
            }),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// Router wired to a fresh `MemoryStore`
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let tokens = TokenService::new("test-secret", 1).expect("token service");
        let state = AppState::new(AppConfig::development(), tokens.clone(), store.clone());
        Self {
            router: crate::app(state),
            store,
            tokens,
        }
    }

    /// Token for an account that exists only in the claims
    pub fn token_for(&self, id: i32) -> String {
        self.tokens
            .issue(&self.tokens.claims_for(id, "Tester", 1))
            .expect("issue token")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_book(isbn: &str, title: &str, authors: &str, year: i32) -> Value {
        json!({
            "isbn13": isbn,
            "authors": authors,
            "publication_year": year,
            "original_title": title,
            "title": title,
            "image_url": null,
            "image_small_url": null
        })
    }

    #[tokio::test]
    async fn create_book_echoes_fields_with_zero_ratings() {
        let app = TestApp::new();
        let token = app.token_for(1);

        let (status, body) = app
            .send(
                Method::POST,
                "/c/books",
                Some(&token),
                Some(new_book("9780000000002", "Dune", "Frank Herbert", 1965)),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        let data = &body["data"];
        assert_eq!(data["isbn13"], "9780000000002");
        assert_eq!(data["title"], "Dune");
        assert_eq!(data["authors"], "Frank Herbert");
        assert_eq!(data["publication_year"], 1965);
        assert_eq!(data["image_url"], Value::Null);
        assert_eq!(data["rating_count"], 0);
        assert_eq!(data["rating_avg"], 0.0);
        assert!(data["formatted"].as_str().unwrap().contains("Dune"));
    }

    #[tokio::test]
    async fn created_book_reports_computed_ratings() {
        let app = TestApp::new();
        let token = app.token_for(1);
        let mut book = new_book("9780000000019", "Rated", "Someone", 2001);
        book["rating_1"] = json!(1);
        book["rating_5"] = json!(2);

        let (status, body) = app.send(Method::POST, "/c/books", Some(&token), Some(book)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["rating_count"], 3);
        assert_eq!(body["data"]["rating_avg"], 3.67);
    }

    #[tokio::test]
    async fn duplicate_isbn_is_rejected_without_second_row() {
        let app = TestApp::new();
        let token = app.token_for(1);
        let book = new_book("9780000000002", "Dune", "Frank Herbert", 1965);

        let (first, _) = app.send(Method::POST, "/c/books", Some(&token), Some(book.clone())).await;
        assert_eq!(first, StatusCode::CREATED);

        let (status, body) = app.send(Method::POST, "/c/books", Some(&token), Some(book)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Book with that ISBN already exists");
        assert_eq!(app.store.book_count(), 1);
    }

    #[tokio::test]
    async fn negative_rating_patch_is_unprocessable_and_changes_nothing() {
        let app = TestApp::new();
        let token = app.token_for(1);
        let mut book = new_book("9780000000002", "Dune", "Frank Herbert", 1965);
        book["rating_2"] = json!(4);
        app.send(Method::POST, "/c/books", Some(&token), Some(book)).await;

        let (status, body) = app
            .send(
                Method::PATCH,
                "/c/books/9780000000002",
                Some(&token),
                Some(json!({ "rating_1": -1, "rating_2": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["field_errors"]["rating_1"].is_string());

        let (_, body) = app.send(Method::GET, "/c/books/9780000000002", Some(&token), None).await;
        assert_eq!(body["data"]["rating_1"], 0);
        assert_eq!(body["data"]["rating_2"], 4);
    }

    #[tokio::test]
    async fn rating_totals_past_the_count_column_are_unprocessable() {
        let app = TestApp::new();
        let token = app.token_for(1);

        let mut heavy = new_book("9780000000026", "Heavy", "Someone", 2001);
        heavy["rating_5"] = json!(500_000_000);
        let (status, body) = app.send(Method::POST, "/c/books", Some(&token), Some(heavy)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["rating_count"], 500_000_000);
        assert_eq!(body["data"]["rating_avg"], 5.0);

        let mut book = new_book("9780000000002", "Dune", "Frank Herbert", 1965);
        book["rating_1"] = json!(2_000_000_000);
        let (status, _) = app.send(Method::POST, "/c/books", Some(&token), Some(book)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = app
            .send(
                Method::PATCH,
                "/c/books/9780000000002",
                Some(&token),
                Some(json!({ "rating_2": 2_000_000_000 })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["field_errors"]["rating_count"].is_string());

        let (_, body) = app.send(Method::GET, "/c/books/9780000000002", Some(&token), None).await;
        assert_eq!(body["data"]["rating_2"], 0);
        assert_eq!(body["data"]["rating_count"], 2_000_000_000);
    }

    #[tokio::test]
    async fn rating_patch_is_additive() {
        let app = TestApp::new();
        let token = app.token_for(1);
        app.send(
            Method::POST,
            "/c/books",
            Some(&token),
            Some(new_book("9780000000002", "Dune", "Frank Herbert", 1965)),
        )
        .await;

        let patch = json!({ "rating_4": 2 });
        app.send(Method::PATCH, "/c/books/9780000000002", Some(&token), Some(patch.clone()))
            .await;
        let (status, body) = app
            .send(Method::PATCH, "/c/books/9780000000002", Some(&token), Some(patch))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rating_4"], 4);
        assert_eq!(body["data"]["rating_count"], 4);
        assert_eq!(body["data"]["rating_avg"], 4.0);

        let (status, _) = app
            .send(Method::PATCH, "/c/books/9780000000099", Some(&token), Some(json!({ "rating_1": 1 })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let app = TestApp::new();
        let token = app.token_for(1);
        app.send(
            Method::POST,
            "/c/books",
            Some(&token),
            Some(new_book("9780000000002", "Dune", "Frank Herbert", 1965)),
        )
        .await;

        let (status, body) = app
            .send(Method::DELETE, "/c/books/9780000000002", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["message"].as_str().unwrap().contains("9780000000002"));
        assert_eq!(body["data"]["entry"]["title"], "Dune");

        let (status, body) = app.send(Method::GET, "/c/books/9780000000002", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn delete_by_title_requires_a_unique_match() {
        let app = TestApp::new();
        let token = app.token_for(1);
        for isbn in ["9780000000002", "9780000000019"] {
            app.send(
                Method::POST,
                "/c/books",
                Some(&token),
                Some(new_book(isbn, "Twin", "Someone", 1990)),
            )
            .await;
        }
        app.send(
            Method::POST,
            "/c/books",
            Some(&token),
            Some(new_book("9780000000026", "Only Child", "Someone", 1990)),
        )
        .await;

        let (status, _) = app
            .send(Method::DELETE, "/c/books/title?title=Twin", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.store.book_count(), 3);

        let (status, body) = app
            .send(Method::DELETE, "/c/books/title?title=Only%20Child", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["entry"]["isbn13"], "9780000000026");

        let (status, _) = app
            .send(Method::DELETE, "/c/books/title?title=Nothing", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.send(Method::DELETE, "/c/books/title", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn isbn_path_is_validated_before_lookup() {
        let app = TestApp::new();
        let token = app.token_for(1);

        let (status, body) = app.send(Method::GET, "/c/books/12345", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "BAD_REQUEST");

        let (status, _) = app.send(Method::GET, "/c/books/9780000000002", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cursor_pages_never_repeat() {
        let app = TestApp::new();
        let token = app.token_for(1);
        for isbn in ["9780000000002", "9780000000019", "9780000000026"] {
            app.send(Method::POST, "/c/books", Some(&token), Some(new_book(isbn, "T", "A", 2000)))
                .await;
        }

        let (status, first) = app
            .send(Method::GET, "/c/books/cursor?limit=2", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let entries = first["data"]["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(first["data"]["pagination"]["totalRecords"], 3);
        assert_eq!(first["data"]["pagination"]["limit"], 2);
        let cursor = first["data"]["pagination"]["cursor"].as_i64().unwrap();
        assert_eq!(cursor, entries[1]["id"].as_i64().unwrap());

        let (_, second) = app
            .send(
                Method::GET,
                &format!("/c/books/cursor?limit=2&cursor={}", cursor),
                Some(&token),
                None,
            )
            .await;
        let rest = second["data"]["entries"].as_array().unwrap();
        assert_eq!(rest.len(), 1);
        assert!(rest[0]["id"].as_i64().unwrap() > cursor);

        let (_, bad_limit) = app
            .send(Method::GET, "/c/books/cursor?limit=abc", Some(&token), None)
            .await;
        assert_eq!(bad_limit["data"]["pagination"]["limit"], 10);

        let (status, past_end) = app
            .send(Method::GET, "/c/books/cursor?cursor=3000000000", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(past_end["data"]["entries"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn offset_pages_advance_by_limit() {
        let app = TestApp::new();
        let token = app.token_for(1);
        for isbn in ["9780000000002", "9780000000019", "9780000000026"] {
            app.send(Method::POST, "/c/books", Some(&token), Some(new_book(isbn, "T", "A", 2000)))
                .await;
        }

        let (status, body) = app
            .send(Method::GET, "/c/books/offset?limit=2&offset=2", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["entries"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["entries"][0]["isbn13"], "9780000000026");
        assert_eq!(body["data"]["pagination"]["offset"], 4);
        assert!(body["data"]["pagination"].get("cursor").is_none());
    }

    #[tokio::test]
    async fn search_and_ranges() {
        let app = TestApp::new();
        let token = app.token_for(1);
        app.send(
            Method::POST,
            "/c/books",
            Some(&token),
            Some(new_book("9780000000002", "The Hobbit", "J.R.R. Tolkien", 1937)),
        )
        .await;
        app.send(
            Method::POST,
            "/c/books",
            Some(&token),
            Some(new_book("9780000000019", "Dune", "Frank Herbert", 1965)),
        )
        .await;

        let (status, body) = app
            .send(Method::GET, "/c/books?author=tolkien", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["entries"][0]["title"], "The Hobbit");

        let (status, _) = app
            .send(Method::GET, "/c/books?author=tolkien&title=dune", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.send(Method::GET, "/c/books", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send(Method::GET, "/c/books/year?beginningYear=1900&endingYear=1950", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["entries"].as_array().unwrap().len(), 1);

        let (status, _) = app
            .send(Method::GET, "/c/books/year?beginningYear=1950&endingYear=1900", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .send(Method::GET, "/c/books/year?beginningYear=1950", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send(Method::GET, "/c/books/rating?ratingCountBegin=0&ratingCountEnd=0", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["entries"].as_array().unwrap().len(), 2);

        let (status, _) = app
            .send(Method::GET, "/c/books/rating?ratingCountBegin=5&ratingCountEnd=10", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn closed_routes_require_a_valid_token() {
        let app = TestApp::new();

        let (status, body) = app.send(Method::GET, "/c/books/9780000000002", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Auth token is not supplied");

        let (status, body) = app
            .send(Method::GET, "/c/books/9780000000002", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Token is not valid");

        let (status, _) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    fn registration(username: &str, email: &str) -> Value {
        json!({
            "firstname": "Ada",
            "lastname": "Lovelace",
            "username": username,
            "email": email,
            "phone": "2065550100",
            "password": "first-password",
            "role": 2
        })
    }

    #[tokio::test]
    async fn register_then_login() {
        let app = TestApp::new();

        let (status, body) = app
            .send(Method::POST, "/register", None, Some(registration("ada", "ada@example.com")))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["data"]["accessToken"].is_string());
        assert_eq!(body["data"]["user"]["username"], "ada");
        assert_eq!(body["data"]["user"]["role"], 2);

        let (status, body) = app
            .send(Method::POST, "/register", None, Some(registration("ada", "other@example.com")))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Username exists");

        let (status, body) = app
            .send(Method::POST, "/register", None, Some(registration("other", "ada@example.com")))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email exists");

        let (status, body) = app
            .send(
                Method::POST,
                "/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": "first-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["data"]["accessToken"].as_str().unwrap();
        let claims = app.tokens.verify(token).unwrap();
        assert_eq!(claims.name, "Ada");

        for (email, password) in [("ada@example.com", "wrong-password"), ("nobody@example.com", "first-password")] {
            let (status, body) = app
                .send(Method::POST, "/login", None, Some(json!({ "email": email, "password": password })))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "Credentials did not match");
        }
    }

    #[tokio::test]
    async fn change_password_flow() {
        let app = TestApp::new();
        let (_, body) = app
            .send(Method::POST, "/register", None, Some(registration("ada", "ada@example.com")))
            .await;
        let token = body["data"]["accessToken"].as_str().unwrap().to_string();

        let (status, _) = app
            .send(
                Method::PATCH,
                "/change-password",
                Some(&token),
                Some(json!({ "currentPassword": "not-my-password", "newPassword": "second-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .send(
                Method::PATCH,
                "/change-password",
                Some(&token),
                Some(json!({ "currentPassword": "first-password", "newPassword": "first-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .send(
                Method::PATCH,
                "/change-password",
                Some(&token),
                Some(json!({ "newPassword": "second-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send(
                Method::PATCH,
                "/changePassword",
                Some(&token),
                Some(json!({ "oldPassword": "first-password", "newPassword": "second-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message"], "Password updated successfully");

        let login = |password: &str| json!({ "email": "ada@example.com", "password": password });
        let (status, _) = app.send(Method::POST, "/login", None, Some(login("first-password"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = app.send(Method::POST, "/login", None, Some(login("second-password"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn change_password_for_missing_account_is_not_found() {
        let app = TestApp::new();
        let token = app.token_for(42);
        let (status, body) = app
            .send(
                Method::PATCH,
                "/change-password",
                Some(&token),
                Some(json!({ "currentPassword": "first-password", "newPassword": "second-password" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");
    }
}
