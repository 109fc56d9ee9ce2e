use serde::Serialize;

use crate::database::models::{Account, Book};

/// Book as returned by the API: every selected column plus a readable summary
#[derive(Debug, Clone, Serialize)]
pub struct BookView {
    #[serde(flatten)]
    pub book: Book,
    pub formatted: String,
}

impl From<Book> for BookView {
    fn from(book: Book) -> Self {
        let formatted = format_book(&book);
        Self { book, formatted }
    }
}

pub fn book_views(books: Vec<Book>) -> Vec<BookView> {
    books.into_iter().map(BookView::from).collect()
}

/// One-paragraph human readable rendering of a book row
pub fn format_book(book: &Book) -> String {
    let mut out = format!(
        "{{{}}} - {} ({}) by {}; original title: {}.",
        book.isbn13, book.title, book.publication_year, book.authors, book.original_title
    );

    out.push_str(&format!(
        " Rated {:.2} from {} rating(s) [1: {}, 2: {}, 3: {}, 4: {}, 5: {}].",
        book.rating_avg,
        book.rating_count,
        book.rating_1,
        book.rating_2,
        book.rating_3,
        book.rating_4,
        book.rating_5
    ));

    if let (Some(large), Some(small)) = (&book.image_url, &book.image_small_url) {
        out.push_str(&format!(" Cover: {} (small: {}).", large, small));
    }
    out
}

/// Login and registration payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub access_token: String,
    pub user: Account,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total_records: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

/// A page of books plus where to continue from
#[derive(Debug, Serialize)]
pub struct BookPage {
    pub entries: Vec<BookView>,
    pub pagination: PageInfo,
}
