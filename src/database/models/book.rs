use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::manager::DatabaseError;

/// A book joined across `Books`, `BookAuthors` and `Ratings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub isbn13: String,
    pub authors: String,
    pub publication_year: i32,
    pub original_title: String,
    pub title: String,
    pub image_url: Option<String>,
    pub image_small_url: Option<String>,
    pub rating_1: i32,
    pub rating_2: i32,
    pub rating_3: i32,
    pub rating_4: i32,
    pub rating_5: i32,
    pub rating_count: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating_avg: Decimal,
}

impl Book {
    pub fn buckets(&self) -> RatingBuckets {
        RatingBuckets([
            self.rating_1,
            self.rating_2,
            self.rating_3,
            self.rating_4,
            self.rating_5,
        ])
    }
}

/// Validated input for the three-table insert
#[derive(Debug, Clone)]
pub struct NewBook {
    pub isbn13: String,
    pub authors: String,
    pub publication_year: i32,
    pub original_title: String,
    pub title: String,
    pub image_url: Option<String>,
    pub image_small_url: Option<String>,
    pub ratings: RatingBuckets,
}

/// Substring filters for author/title search; absent filters match everything
#[derive(Debug, Clone, Default)]
pub struct BookSearch {
    pub author: Option<String>,
    pub title: Option<String>,
}

/// Star-bucket counters, index 0 holds `rating_1`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingBuckets(pub [i32; 5]);

/// Additive change per star bucket, index 0 applies to `rating_1`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingDelta(pub [i32; 5]);

impl RatingDelta {
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|d| *d == 0)
    }
}

impl RatingBuckets {
    pub fn count(&self) -> i64 {
        self.0.iter().map(|n| i64::from(*n)).sum()
    }

    /// `count` as stored in `Ratings.rating_count`, which is a 32-bit column
    pub fn total(&self) -> Result<i32, DatabaseError> {
        let total = self.count();
        i32::try_from(total).map_err(|_| DatabaseError::RatingTotalOverflow { total })
    }

    /// Weighted mean of the star values, rounded half away from zero to two
    /// decimals; zero when there are no ratings
    pub fn average(&self) -> Decimal {
        let count = self.count();
        if count == 0 {
            return Decimal::ZERO;
        }
        let weighted: i64 = self
            .0
            .iter()
            .zip(1i64..)
            .map(|(n, stars)| i64::from(*n) * stars)
            .sum();
        (Decimal::from(weighted) / Decimal::from(count))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Buckets after applying `delta`. Every bucket is checked before any is
    /// changed, so a rejected delta leaves nothing half-applied.
    pub fn apply(&self, delta: &RatingDelta) -> Result<RatingBuckets, DatabaseError> {
        let mut next = [0i32; 5];
        for (i, (current, change)) in self.0.iter().zip(delta.0.iter()).enumerate() {
            let bucket = (i + 1) as u8;
            let value = current
                .checked_add(*change)
                .ok_or(DatabaseError::RatingOverflow { bucket })?;
            if value < 0 {
                return Err(DatabaseError::NegativeRating {
                    bucket,
                    current: *current,
                    delta: *change,
                });
            }
            next[i] = value;
        }
        let next = RatingBuckets(next);
        next.total()?;
        Ok(next)
    }
}
