//! Sample catalog used to populate an empty store at startup.

use time::macros::date;

use crate::{Book, BookRepository, NewBook, StoreError};

fn sample(title: &str, author: &str, publication_date: time::Date, available: bool, rating: f64) -> NewBook {
    NewBook {
        title: title.to_string(),
        author: author.to_string(),
        publication_date,
        available,
        rating,
    }
}

/// Bulk-insert the sample catalog and return the created records.
pub fn seed_catalog(repo: &dyn BookRepository) -> Result<Vec<Book>, StoreError> {
    let books = vec![
        sample(
            "The Great Gatsby",
            "F. Scott Fitzgerald",
            date!(1925 - 04 - 10),
            true,
            4.5,
        ),
        sample(
            "To Kill a Mockingbird",
            "Harper Lee",
            date!(1960 - 07 - 11),
            true,
            4.5,
        ),
        sample("1984", "George Orwell", date!(1949 - 06 - 08), false, 4.8),
        sample(
            "Pride and Prejudice",
            "Jane Austen",
            date!(1813 - 01 - 28),
            true,
            3.9,
        ),
        sample(
            "Moby-Dick",
            "Herman Melville",
            date!(1851 - 10 - 18),
            false,
            2.5,
        ),
        sample(
            "War and Peace",
            "Leo Tolstoy",
            date!(1869 - 01 - 01),
            true,
            1.6,
        ),
        sample(
            "The Catcher in the Rye",
            "J.D. Salinger",
            date!(1951 - 07 - 16),
            true,
            3.6,
        ),
        sample(
            "The Hobbit",
            "J.R.R. Tolkien",
            date!(1937 - 09 - 21),
            true,
            1.6,
        ),
        sample(
            "Brave New World",
            "Aldous Huxley",
            date!(1932 - 08 - 30),
            false,
            0.0,
        ),
        sample(
            "Jane Eyre",
            "Charlotte Brontë",
            date!(1847 - 10 - 16),
            true,
            5.0,
        ),
    ];

    let created = repo.insert_many(books)?;
    tracing::info!(count = created.len(), "seeded sample catalog");
    Ok(created)
}
