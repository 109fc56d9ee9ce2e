use async_trait::async_trait;
use sqlx::PgExecutor;
use std::ops::RangeInclusive;
use tracing::debug;

use crate::database::manager::DatabaseError;
use crate::database::models::{Book, BookSearch, NewBook, RatingBuckets, RatingDelta};
use crate::database::repository::BookStore;
use crate::database::transaction::{with_transaction, PgTransaction};
use crate::database::PgStore;

const BOOK_SELECT: &str = "SELECT b.id, b.isbn13, a.authors, b.publication_year, \
                           b.original_title, b.title, b.image_url, b.image_small_url, \
                           r.rating_1, r.rating_2, r.rating_3, r.rating_4, r.rating_5, \
                           r.rating_count, r.rating_avg \
                           FROM Books b \
                           JOIN BookAuthors a ON a.id = b.id \
                           JOIN Ratings r ON r.id = b.id";

/// `%term%` for ILIKE, with the pattern metacharacters escaped
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

async fn select_by_id<'e, E>(executor: E, id: i32) -> Result<Book, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let sql = format!("{BOOK_SELECT} WHERE b.id = $1");
    let book = sqlx::query_as::<_, Book>(&sql)
        .bind(id)
        .fetch_one(executor)
        .await?;
    Ok(book)
}

/// Remove one book from BookAuthors, Ratings and Books, in that order
async fn delete_rows(tx: &mut PgTransaction, id: i32) -> Result<(), DatabaseError> {
    for table in ["BookAuthors", "Ratings", "Books"] {
        let sql = format!("DELETE FROM {table} WHERE id = $1");
        let result = sqlx::query(&sql).bind(id).execute(&mut **tx).await?;
        DatabaseError::expect_rows(1, result.rows_affected())?;
    }
    Ok(())
}

#[async_trait]
impl BookStore for PgStore {
    async fn find_by_isbn(&self, isbn13: &str) -> Result<Option<Book>, DatabaseError> {
        let sql = format!("{BOOK_SELECT} WHERE b.isbn13 = $1");
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(isbn13)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn search(&self, search: &BookSearch) -> Result<Vec<Book>, DatabaseError> {
        let sql = format!(
            "{BOOK_SELECT}
             WHERE ($1::TEXT IS NULL OR a.authors ILIKE $1)
               AND ($2::TEXT IS NULL OR b.title ILIKE $2)
             ORDER BY b.id"
        );
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(search.author.as_deref().map(contains_pattern))
            .bind(search.title.as_deref().map(contains_pattern))
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn by_publication_year(&self, years: RangeInclusive<i32>) -> Result<Vec<Book>, DatabaseError> {
        let sql = format!("{BOOK_SELECT} WHERE b.publication_year BETWEEN $1 AND $2 ORDER BY b.id");
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(*years.start())
            .bind(*years.end())
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn by_rating_count(&self, counts: RangeInclusive<i32>) -> Result<Vec<Book>, DatabaseError> {
        let sql = format!("{BOOK_SELECT} WHERE r.rating_count BETWEEN $1 AND $2 ORDER BY b.id");
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(*counts.start())
            .bind(*counts.end())
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn page_after(&self, cursor: i32, limit: i64) -> Result<Vec<Book>, DatabaseError> {
        let sql = format!("{BOOK_SELECT} WHERE b.id > $1 ORDER BY b.id LIMIT $2");
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn page_at_offset(&self, offset: i64, limit: i64) -> Result<Vec<Book>, DatabaseError> {
        let sql = format!("{BOOK_SELECT} ORDER BY b.id LIMIT $1 OFFSET $2");
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Books")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn create(&self, book: NewBook) -> Result<Book, DatabaseError> {
        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let (id,): (i32,) = sqlx::query_as(
                    "INSERT INTO Books (isbn13, publication_year, original_title, title,
                                        image_url, image_small_url)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     RETURNING id",
                )
                .bind(&book.isbn13)
                .bind(book.publication_year)
                .bind(&book.original_title)
                .bind(&book.title)
                .bind(&book.image_url)
                .bind(&book.image_small_url)
                .fetch_one(&mut **tx)
                .await
                .map_err(DatabaseError::classify)?;

                sqlx::query("INSERT INTO BookAuthors (id, authors) VALUES ($1, $2)")
                    .bind(id)
                    .bind(&book.authors)
                    .execute(&mut **tx)
                    .await?;

                book.ratings.total()?;
                let [r1, r2, r3, r4, r5] = book.ratings.0;
                sqlx::query(
                    "INSERT INTO Ratings (id, rating_1, rating_2, rating_3, rating_4, rating_5)
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(id)
                .bind(r1)
                .bind(r2)
                .bind(r3)
                .bind(r4)
                .bind(r5)
                .execute(&mut **tx)
                .await?;

                debug!("Inserted book {} with id {}", book.isbn13, id);
                select_by_id(&mut **tx, id).await
            })
        })
        .await
    }

    async fn apply_rating_delta(
        &self,
        isbn13: &str,
        delta: RatingDelta,
    ) -> Result<Option<Book>, DatabaseError> {
        let isbn13 = isbn13.to_string();
        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let current: Option<(i32, i32, i32, i32, i32, i32)> = sqlx::query_as(
                    "SELECT r.id, r.rating_1, r.rating_2, r.rating_3, r.rating_4, r.rating_5
                     FROM Ratings r
                     JOIN Books b ON b.id = r.id
                     WHERE b.isbn13 = $1
                     FOR UPDATE OF r",
                )
                .bind(&isbn13)
                .fetch_optional(&mut **tx)
                .await?;

                let Some((id, r1, r2, r3, r4, r5)) = current else {
                    return Ok(None);
                };

                // Rejects before any write when a bucket would go negative
                RatingBuckets([r1, r2, r3, r4, r5]).apply(&delta)?;

                let [d1, d2, d3, d4, d5] = delta.0;
                let result = sqlx::query(
                    "UPDATE Ratings
                     SET rating_1 = rating_1 + $2,
                         rating_2 = rating_2 + $3,
                         rating_3 = rating_3 + $4,
                         rating_4 = rating_4 + $5,
                         rating_5 = rating_5 + $6
                     WHERE id = $1",
                )
                .bind(id)
                .bind(d1)
                .bind(d2)
                .bind(d3)
                .bind(d4)
                .bind(d5)
                .execute(&mut **tx)
                .await?;
                DatabaseError::expect_rows(1, result.rows_affected())?;

                select_by_id(&mut **tx, id).await.map(Some)
            })
        })
        .await
    }

    async fn delete_by_isbn(&self, isbn13: &str) -> Result<Option<Book>, DatabaseError> {
        let isbn13 = isbn13.to_string();
        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let sql = format!("{BOOK_SELECT} WHERE b.isbn13 = $1 FOR UPDATE OF b");
                let found = sqlx::query_as::<_, Book>(&sql)
                    .bind(&isbn13)
                    .fetch_optional(&mut **tx)
                    .await?;

                let Some(book) = found else {
                    return Ok(None);
                };
                delete_rows(tx, book.id).await?;
                Ok(Some(book))
            })
        })
        .await
    }

    async fn delete_by_title(&self, title: &str) -> Result<Option<Book>, DatabaseError> {
        let title = title.to_string();
        with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let sql = format!("{BOOK_SELECT} WHERE b.title = $1 FOR UPDATE OF b");
                let mut found = sqlx::query_as::<_, Book>(&sql)
                    .bind(&title)
                    .fetch_all(&mut **tx)
                    .await?;

                if found.len() > 1 {
                    return Err(DatabaseError::Ambiguous {
                        what: format!("Title '{}'", title),
                        count: found.len() as i64,
                    });
                }
                let Some(book) = found.pop() else {
                    return Ok(None);
                };
                delete_rows(tx, book.id).await?;
                Ok(Some(book))
            })
        })
        .await
    }
}
