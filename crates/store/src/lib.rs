//! Record store for the folio catalog.
//!
//! Query capabilities are expressed as typed parameters on [`BookQuery`] rather
//! than ad-hoc predicates, and every backend implements [`BookRepository`].

pub mod memory;
pub mod seed;

use time::Date;

pub use memory::MemoryBookStore;

/// Opaque, stable, auto-assigned record identifier.
pub type BookId = u64;

/// A book record.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub publication_date: Date,
    pub available: bool,
    /// Mean of all rating submissions for this book, 0.0 when unrated.
    pub rating: f64,
}

/// A single rating submission associated with a book.
#[derive(Debug, Clone, PartialEq)]
pub struct BookRating {
    pub book_id: BookId,
    pub value: f64,
}

/// Fields for inserting a new book.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publication_date: Date,
    pub available: bool,
    pub rating: f64,
}

/// Named-field overwrite for an existing book. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_date: Option<Date>,
    pub available: Option<bool>,
    pub rating: Option<f64>,
}

/// Author matching mode; both variants compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorFilter {
    Exact(String),
    Contains(String),
}

/// Result ordering for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookOrder {
    #[default]
    IdAsc,
    RatingDesc,
}

/// Typed query parameters consumed by [`BookRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    pub available_only: bool,
    pub author: Option<AuthorFilter>,
    pub publication_year: Option<i32>,
    /// Keep only books with `rating >` this value.
    pub min_rating_exclusive: Option<f64>,
    pub order: BookOrder,
}

impl BookQuery {
    /// Query scoped to available books, as every browse endpoint requires.
    pub fn available() -> Self {
        Self {
            available_only: true,
            ..Self::default()
        }
    }

    pub fn with_author(mut self, filter: AuthorFilter) -> Self {
        self.author = Some(filter);
        self
    }

    pub fn with_publication_year(mut self, year: i32) -> Self {
        self.publication_year = Some(year);
        self
    }

    pub fn with_min_rating_exclusive(mut self, rating: f64) -> Self {
        self.min_rating_exclusive = Some(rating);
        self
    }

    pub fn order_by(mut self, order: BookOrder) -> Self {
        self.order = order;
        self
    }
}

/// Store-level failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown book id {0}")]
    UnknownBook(BookId),
}

/// Query interface over the persistent collection of books.
pub trait BookRepository: Send + Sync {
    /// Insert a new record, assigning the next identifier.
    fn insert(&self, book: NewBook) -> Result<Book, StoreError>;

    /// Bulk insert, preserving input order. Used by the seed path.
    fn insert_many(&self, books: Vec<NewBook>) -> Result<Vec<Book>, StoreError>;

    /// Overwrite named fields on an existing record.
    fn update(&self, id: BookId, patch: BookPatch) -> Result<Book, StoreError>;

    /// Fetch a record by identifier.
    fn get(&self, id: BookId) -> Result<Option<Book>, StoreError>;

    /// List records matching the query, ordered per `query.order`.
    fn list(&self, query: &BookQuery) -> Result<Vec<Book>, StoreError>;

    /// Case-insensitive substring lookup on title. Multiple matches resolve to
    /// the record with the lowest identifier.
    fn find_by_title(&self, fragment: &str) -> Result<Option<Book>, StoreError>;

    /// Record a rating submission and recompute the book's aggregate rating as
    /// the mean of all submissions. The recompute happens in the same write
    /// critical section as the insert, so concurrent submissions cannot lose
    /// updates.
    fn submit_rating(&self, id: BookId, value: f64) -> Result<Book, StoreError>;

    /// All rating submissions recorded for a book, in submission order.
    fn ratings_for(&self, id: BookId) -> Result<Vec<BookRating>, StoreError>;

    /// Number of records in the store.
    fn count(&self) -> Result<usize, StoreError>;
}
