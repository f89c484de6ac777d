//! In-memory [`BookRepository`] backend.
//!
//! Backs the service in local and test environments. All mutation happens under
//! a single `RwLock` write guard, which is what makes the aggregate-rating
//! recompute atomic with the submission that triggered it.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    AuthorFilter, Book, BookId, BookOrder, BookPatch, BookQuery, BookRating, BookRepository,
    NewBook, StoreError,
};

#[derive(Default)]
struct Inner {
    next_id: BookId,
    books: BTreeMap<BookId, Book>,
    ratings: BTreeMap<BookId, Vec<BookRating>>,
}

/// Thread-safe in-memory book store.
pub struct MemoryBookStore {
    inner: RwLock<Inner>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn insert(&mut self, book: NewBook) -> Book {
        self.next_id += 1;
        let record = Book {
            id: self.next_id,
            title: book.title,
            author: book.author,
            publication_date: book.publication_date,
            available: book.available,
            rating: book.rating,
        };
        self.books.insert(record.id, record.clone());
        record
    }
}

fn author_matches(filter: &AuthorFilter, author: &str) -> bool {
    let author = author.to_lowercase();
    match filter {
        AuthorFilter::Exact(pattern) => author == pattern.to_lowercase(),
        AuthorFilter::Contains(pattern) => author.contains(&pattern.to_lowercase()),
    }
}

fn matches(query: &BookQuery, book: &Book) -> bool {
    if query.available_only && !book.available {
        return false;
    }
    if let Some(filter) = &query.author {
        if !author_matches(filter, &book.author) {
            return false;
        }
    }
    if let Some(year) = query.publication_year {
        if book.publication_date.year() != year {
            return false;
        }
    }
    if let Some(min) = query.min_rating_exclusive {
        if book.rating <= min {
            return false;
        }
    }
    true
}

impl BookRepository for MemoryBookStore {
    fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        Ok(self.write().insert(book))
    }

    fn insert_many(&self, books: Vec<NewBook>) -> Result<Vec<Book>, StoreError> {
        let mut inner = self.write();
        Ok(books.into_iter().map(|book| inner.insert(book)).collect())
    }

    fn update(&self, id: BookId, patch: BookPatch) -> Result<Book, StoreError> {
        let mut inner = self.write();
        let book = inner.books.get_mut(&id).ok_or(StoreError::UnknownBook(id))?;

        if let Some(title) = patch.title {
            book.title = title;
        }
        if let Some(author) = patch.author {
            book.author = author;
        }
        if let Some(publication_date) = patch.publication_date {
            book.publication_date = publication_date;
        }
        if let Some(available) = patch.available {
            book.available = available;
        }
        if let Some(rating) = patch.rating {
            book.rating = rating;
        }

        Ok(book.clone())
    }

    fn get(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        Ok(self.read().books.get(&id).cloned())
    }

    fn list(&self, query: &BookQuery) -> Result<Vec<Book>, StoreError> {
        let inner = self.read();
        // BTreeMap iteration gives ascending id; the rating sort is stable, so
        // equal ratings keep that order.
        let mut books: Vec<Book> = inner
            .books
            .values()
            .filter(|book| matches(query, book))
            .cloned()
            .collect();

        match query.order {
            BookOrder::IdAsc => {}
            BookOrder::RatingDesc => books.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        }

        Ok(books)
    }

    fn find_by_title(&self, fragment: &str) -> Result<Option<Book>, StoreError> {
        let fragment = fragment.to_lowercase();
        let inner = self.read();
        // Ascending id iteration makes the lowest id win on multiple matches.
        Ok(inner
            .books
            .values()
            .find(|book| book.title.to_lowercase().contains(&fragment))
            .cloned())
    }

    fn submit_rating(&self, id: BookId, value: f64) -> Result<Book, StoreError> {
        let mut inner = self.write();
        if !inner.books.contains_key(&id) {
            return Err(StoreError::UnknownBook(id));
        }

        let submissions = inner.ratings.entry(id).or_default();
        submissions.push(BookRating {
            book_id: id,
            value,
        });
        let mean = submissions.iter().map(|r| r.value).sum::<f64>() / submissions.len() as f64;

        let book = inner.books.get_mut(&id).ok_or(StoreError::UnknownBook(id))?;
        book.rating = mean;
        Ok(book.clone())
    }

    fn ratings_for(&self, id: BookId) -> Result<Vec<BookRating>, StoreError> {
        let inner = self.read();
        if !inner.books.contains_key(&id) {
            return Err(StoreError::UnknownBook(id));
        }
        Ok(inner.ratings.get(&id).cloned().unwrap_or_default())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read().books.len())
    }
}
