pub mod format;

pub use format::{AccessGrant, BookPage, BookView, PageInfo};
