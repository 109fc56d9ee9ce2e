pub mod account;
pub mod book;

pub use account::{Account, NewAccount};
pub use book::{Book, BookSearch, NewBook, RatingBuckets, RatingDelta};
