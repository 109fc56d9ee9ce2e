//! Scoped transactions.
//!
//! `with_transaction` acquires a dedicated connection, issues `BEGIN`, and hands
//! the open transaction to the caller's closure. An `Ok` result commits; an
//! `Err` rolls back before the error is returned. The connection goes back to
//! the pool on every path, including panics and cancelled futures, because
//! dropping an uncommitted `sqlx::Transaction` rolls it back.
//!
//! ```text
//! let book = with_transaction(&pool, move |tx| Box::pin(async move {
//!     let id = insert_book(tx, &new_book).await?;
//!     insert_authors(tx, id, &new_book.authors).await?;
//!     insert_ratings(tx, id, &new_book.ratings).await?;
//!     Ok(id)
//! })).await?;
//! ```

use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, error};

use super::manager::DatabaseError;

pub type PgTransaction = Transaction<'static, Postgres>;

/// Run `work` inside one transaction on one pooled connection
pub async fn with_transaction<T, F>(pool: &PgPool, work: F) -> Result<T, DatabaseError>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut PgTransaction) -> BoxFuture<'c, Result<T, DatabaseError>>,
{
    let mut tx = pool.begin().await?;
    debug!("Transaction started");

    match work(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            debug!("Transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!("Transaction rollback failed: {}", rollback_err);
            } else {
                debug!("Transaction rolled back: {}", err);
            }
            Err(err)
        }
    }
}
