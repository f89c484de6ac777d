//! Page slicing over an ordered, fully materialized result sequence.

use thiserror::Error;

/// Page number failures, surfaced to clients as 400 responses.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("That page number is not an integer")]
    NotAnInteger,
    #[error("That page number is less than 1")]
    LessThanOne,
    #[error("That page contains no results")]
    NoResults,
}

/// One page of results plus the counts every list envelope reports.
#[derive(Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: usize,
    pub total_pages: usize,
    pub number: usize,
}

/// Splits an ordered sequence into pages of `per_page` items.
///
/// An empty sequence still has one page: page 1 is valid and empty.
pub struct Paginator<T> {
    items: Vec<T>,
    per_page: usize,
}

impl<T> Paginator<T> {
    /// Callers must have validated `per_page >= 1`.
    pub fn new(items: Vec<T>, per_page: usize) -> Self {
        debug_assert!(per_page >= 1, "per_page must be positive");
        Self { items, per_page }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn num_pages(&self) -> usize {
        self.count().div_ceil(self.per_page).max(1)
    }

    /// Extract page `number` (1-based).
    pub fn page(mut self, number: usize) -> Result<Page<T>, PageError> {
        if number < 1 {
            return Err(PageError::LessThanOne);
        }

        let total_items = self.count();
        let total_pages = self.num_pages();
        if number > total_pages {
            return Err(PageError::NoResults);
        }

        let start = (number - 1) * self.per_page;
        let end = (start + self.per_page).min(total_items);
        let items = if start < end {
            self.items.drain(start..end).collect()
        } else {
            Vec::new()
        };

        Ok(Page {
            items,
            total_items,
            total_pages,
            number,
        })
    }
}

/// Coerce a raw `page` query parameter to a 1-based page number.
pub fn parse_page_number(raw: &str) -> Result<usize, PageError> {
    let number: i64 = raw.trim().parse().map_err(|_| PageError::NotAnInteger)?;
    if number < 1 {
        return Err(PageError::LessThanOne);
    }
    Ok(number as usize)
}
