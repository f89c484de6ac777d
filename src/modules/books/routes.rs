//! HTTP handlers for the books module.
//!
//! Every list handler follows the same pipeline: validate method, coerce
//! paging parameters, build a typed store query, paginate, serialize.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use folio_http::error::AppError;
use folio_http::page::{parse_page_number, Paginator};
use folio_store::{AuthorFilter, Book, BookOrder, BookQuery, StoreError};

use super::models::{ListParams, PageEnvelope, PageParams};
use super::serializer::BookSerializer;
use super::BooksState;

pub(crate) fn router(state: BooksState) -> Router {
    Router::new()
        .route("/books/", get(list_books).fallback(require_get))
        .route(
            "/books/author/{author}/",
            get(books_by_author).fallback(require_get),
        )
        .route(
            "/books/year/{year}/",
            get(books_by_year).fallback(require_get),
        )
        .route("/books/{title}/", get(get_book).fallback(require_get))
        .route(
            "/books-by-rating/",
            get(books_by_rating).fallback(require_get),
        )
        .with_state(state)
}

/// Fallback for non-GET methods on every books route.
async fn require_get() -> AppError {
    AppError::method_not_allowed("GET request required")
}

fn store_error(error: StoreError) -> AppError {
    AppError::Internal(error.into())
}

/// Coerce paging parameters, slice out one page, and wrap it in the envelope.
fn paginate_and_wrap(
    books: Vec<Book>,
    page: Option<&str>,
    page_size: Option<&str>,
    default_page_size: usize,
) -> Result<PageEnvelope, AppError> {
    let per_page = match page_size {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 1)
            .map(|n| n as usize)
            .ok_or_else(|| AppError::bad_request("Invalid page_size parameter"))?,
        None => default_page_size,
    };

    let number = match page {
        Some(raw) => parse_page_number(raw).map_err(|e| AppError::bad_request(e.to_string()))?,
        None => 1,
    };

    let page = Paginator::new(books, per_page)
        .page(number)
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    Ok(PageEnvelope {
        total_items: page.total_items,
        total_pages: page.total_pages,
        current_page: page.number,
        page_size: page.items.len(),
        data: BookSerializer::represent_many(&page.items),
    })
}

/// `GET /books/`: available books, best-rated first, with optional author and
/// publication-year filters.
async fn list_books(
    State(state): State<BooksState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageEnvelope>, AppError> {
    let mut query = BookQuery::available().order_by(BookOrder::RatingDesc);

    if let Some(author) = &params.author {
        query = query.with_author(AuthorFilter::Contains(author.clone()));
    }
    if let Some(raw) = &params.publication_year {
        let year = raw
            .trim()
            .parse::<i32>()
            .map_err(|_| AppError::bad_request("Invalid publication_year parameter"))?;
        query = query.with_publication_year(year);
    }

    let books = state.repo.list(&query).map_err(store_error)?;
    let envelope = paginate_and_wrap(
        books,
        params.page.as_deref(),
        params.page_size.as_deref(),
        state.default_page_size,
    )?;
    Ok(Json(envelope))
}

/// `GET /books/author/{author}/`: available books whose author matches the
/// segment exactly, case-insensitively.
async fn books_by_author(
    State(state): State<BooksState>,
    Path(author): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageEnvelope>, AppError> {
    let query = BookQuery::available().with_author(AuthorFilter::Exact(author));

    let books = state.repo.list(&query).map_err(store_error)?;
    let envelope = paginate_and_wrap(
        books,
        params.page.as_deref(),
        params.page_size.as_deref(),
        state.default_page_size,
    )?;
    Ok(Json(envelope))
}

/// `GET /books/year/{year}/`: available books published in the given year.
async fn books_by_year(
    State(state): State<BooksState>,
    Path(year): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageEnvelope>, AppError> {
    let year: i32 = year
        .parse()
        .map_err(|_| AppError::bad_request("Invalid year parameter"))?;
    let query = BookQuery::available().with_publication_year(year);

    let books = state.repo.list(&query).map_err(store_error)?;
    let envelope = paginate_and_wrap(
        books,
        params.page.as_deref(),
        params.page_size.as_deref(),
        state.default_page_size,
    )?;
    Ok(Json(envelope))
}

/// `GET /books/{title}/`: single record by case-insensitive title substring.
async fn get_book(
    State(state): State<BooksState>,
    Path(title): Path<String>,
) -> Result<Json<Value>, AppError> {
    let book = state
        .repo
        .find_by_title(&title)
        .map_err(store_error)?
        .ok_or_else(|| AppError::not_found("Book not found"))?;

    Ok(Json(Value::Object(BookSerializer::represent(&book))))
}

/// `GET /books-by-rating/`: rated books grouped into integer buckets 1-5,
/// buckets sorted by descending population.
async fn books_by_rating(
    State(state): State<BooksState>,
) -> Result<Json<Vec<(u8, Vec<Value>)>>, AppError> {
    let query = BookQuery::default()
        .with_min_rating_exclusive(0.0)
        .order_by(BookOrder::RatingDesc);
    let books = state.repo.list(&query).map_err(store_error)?;

    let mut buckets: Vec<(u8, Vec<Value>)> = (1u8..=5).map(|label| (label, Vec::new())).collect();
    for book in &books {
        let label = book.rating.trunc() as i64;
        // Ratings in (0, 1) truncate below the bucket range and are skipped.
        if let Some((_, members)) = buckets.iter_mut().find(|(l, _)| i64::from(*l) == label) {
            members.push(Value::Object(BookSerializer::represent(book)));
        }
    }

    // Stable sort: equally populated buckets keep ascending label order.
    buckets.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    Ok(Json(buckets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use folio_store::{BookRepository, MemoryBookStore, NewBook};
    use serde_json::json;
    use std::sync::Arc;
    use time::macros::date;
    use tower::ServiceExt;

    fn sample(title: &str, author: &str, publication_date: time::Date, available: bool) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            publication_date,
            available,
            rating: 0.0,
        }
    }

    fn test_router() -> Router {
        let repo = Arc::new(MemoryBookStore::new());
        repo.insert_many(vec![
            sample("Book One", "Author A", date!(2021 - 01 - 01), true),
            sample("Book Two", "Author B", date!(2022 - 06 - 15), false),
            sample("Another Book", "Author A", date!(2021 - 05 - 20), true),
        ])
        .unwrap();

        router(BooksState {
            repo,
            default_page_size: 10,
        })
    }

    async fn get_response(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn list_returns_only_available_books() {
        let (status, body) = get_response(test_router(), "/books/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["total_items"], json!(2));
    }

    #[tokio::test]
    async fn list_filters_by_author_query_param() {
        let (status, body) = get_response(test_router(), "/books/?author=Author%20A").await;

        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        for book in data {
            assert!(book["author"].as_str().unwrap().contains("Author A"));
        }
    }

    #[tokio::test]
    async fn list_filters_by_publication_year_query_param() {
        let (status, body) = get_response(test_router(), "/books/?publication_year=2021").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (status, body) = get_response(test_router(), "/books/?publication_year=1999").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn list_paginates() {
        let (status, body) = get_response(test_router(), "/books/?page=1&page_size=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["total_items"], json!(2));
        assert_eq!(body["total_pages"], json!(1));
        assert_eq!(body["current_page"], json!(1));
        assert_eq!(body["page_size"], json!(2));
    }

    #[tokio::test]
    async fn list_rejects_invalid_page_size() {
        let (status, body) = get_response(test_router(), "/books/?page_size=invalid").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Invalid page_size parameter"));
    }

    #[tokio::test]
    async fn list_rejects_nonexistent_page() {
        let (status, body) = get_response(test_router(), "/books/?page=10").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("no results"));
    }

    #[tokio::test]
    async fn list_rejects_non_get() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/books/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], json!("GET request required"));
    }

    #[tokio::test]
    async fn author_endpoint_matches_exactly_case_insensitive() {
        let (status, body) = get_response(test_router(), "/books/author/author%20a/").await;

        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        for book in data {
            assert_eq!(book["author"], json!("Author A"));
        }
    }

    #[tokio::test]
    async fn year_endpoint_filters_available_books() {
        let (status, body) = get_response(test_router(), "/books/year/2022/").await;

        // Book Two matches the year but is unavailable.
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 0);

        let (_, body) = get_response(test_router(), "/books/year/2021/").await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn year_endpoint_rejects_non_numeric_segment() {
        let (status, body) = get_response(test_router(), "/books/year/abc/").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Invalid year parameter"));
    }

    #[tokio::test]
    async fn title_lookup_returns_flat_record() {
        let (status, body) = get_response(test_router(), "/books/Book%20One/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], json!("Book One"));
        assert_eq!(body["author"], json!("Author A"));
        assert_eq!(body["publication_date"], json!("2021-01-01"));
    }

    #[tokio::test]
    async fn title_lookup_miss_is_404() {
        let (status, body) = get_response(test_router(), "/books/Nonexistent%20Book/").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("Book not found"));
    }

    #[tokio::test]
    async fn rating_groups_sort_by_population() {
        let repo = Arc::new(MemoryBookStore::new());
        repo.insert_many(vec![
            NewBook {
                rating: 4.5,
                ..sample("Highly Rated", "A", date!(2020 - 01 - 01), true)
            },
            NewBook {
                rating: 4.8,
                ..sample("Also Highly Rated", "B", date!(2020 - 01 - 01), false)
            },
            NewBook {
                rating: 3.6,
                ..sample("Decent", "C", date!(2020 - 01 - 01), true)
            },
            NewBook {
                rating: 5.0,
                ..sample("Perfect", "D", date!(2020 - 01 - 01), true)
            },
            NewBook {
                rating: 0.0,
                ..sample("Unrated", "E", date!(2020 - 01 - 01), true)
            },
        ])
        .unwrap();
        let router = router(BooksState {
            repo,
            default_page_size: 10,
        });

        let (status, body) = get_response(router, "/books-by-rating/").await;

        assert_eq!(status, StatusCode::OK);
        let groups = body.as_array().unwrap();
        assert_eq!(groups.len(), 5);

        // Bucket 4 holds two books; singly-populated buckets 3 and 5 follow in
        // ascending label order, then the empty buckets 1 and 2.
        let labels: Vec<i64> = groups.iter().map(|g| g[0].as_i64().unwrap()).collect();
        assert_eq!(labels, vec![4, 3, 5, 1, 2]);
        assert_eq!(groups[0][1].as_array().unwrap().len(), 2);
        // Within bucket 4, the better-rated book comes first.
        assert_eq!(groups[0][1][0]["title"], json!("Also Highly Rated"));
        assert_eq!(groups[1][1].as_array().unwrap().len(), 1);
        assert_eq!(groups[3][1].as_array().unwrap().len(), 0);
    }
}
