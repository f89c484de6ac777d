pub mod models;
pub mod routes;
pub mod serializer;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;

use folio_kernel::settings::Settings;
use folio_kernel::{InitCtx, Module};
use folio_store::{seed, BookRepository, MemoryBookStore};

/// Shared state handed to every books handler.
#[derive(Clone)]
pub struct BooksState {
    pub repo: Arc<dyn BookRepository>,
    pub default_page_size: usize,
}

/// Books module: the catalog's record store, serializer, and HTTP surface.
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(settings: &Settings) -> Self {
        Self {
            state: BooksState {
                repo: Arc::new(MemoryBookStore::new()),
                default_page_size: settings.api.default_page_size,
            },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.catalog.seed_on_start && self.state.repo.count()? == 0 {
            seed::seed_catalog(self.state.repo.as_ref())?;
        }

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module.
pub fn create_module(settings: &Settings) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(settings))
}

fn openapi_fragment() -> serde_json::Value {
    let paging_params = json!([
        {
            "name": "page",
            "in": "query",
            "schema": { "type": "integer", "default": 1 }
        },
        {
            "name": "page_size",
            "in": "query",
            "schema": { "type": "integer" }
        }
    ]);
    let page_response = json!({
        "200": {
            "description": "One page of books",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookPage" }
                }
            }
        },
        "400": {
            "description": "Invalid page_size or out-of-range page",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        },
        "405": {
            "description": "Non-GET request",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        }
    });

    json!({
        "paths": {
            "/books/": {
                "get": {
                    "summary": "List available books, best-rated first",
                    "tags": ["Books"],
                    "parameters": [
                        {
                            "name": "author",
                            "in": "query",
                            "description": "Case-insensitive author substring",
                            "schema": { "type": "string" }
                        },
                        {
                            "name": "publication_year",
                            "in": "query",
                            "schema": { "type": "integer" }
                        },
                        paging_params[0],
                        paging_params[1]
                    ],
                    "responses": page_response
                }
            },
            "/books/author/{author}/": {
                "get": {
                    "summary": "List available books by exact author (case-insensitive)",
                    "tags": ["Books"],
                    "parameters": [
                        {
                            "name": "author",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        },
                        paging_params[0],
                        paging_params[1]
                    ],
                    "responses": page_response
                }
            },
            "/books/year/{year}/": {
                "get": {
                    "summary": "List available books by publication year",
                    "tags": ["Books"],
                    "parameters": [
                        {
                            "name": "year",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "integer" }
                        },
                        paging_params[0],
                        paging_params[1]
                    ],
                    "responses": page_response
                }
            },
            "/books/{title}/": {
                "get": {
                    "summary": "Fetch one book by title substring",
                    "tags": ["Books"],
                    "parameters": [
                        {
                            "name": "title",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }
                    ],
                    "responses": {
                        "200": {
                            "description": "The matching book",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Book" }
                                }
                            }
                        },
                        "404": {
                            "description": "No title contains the given substring",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                }
                            }
                        }
                    }
                }
            },
            "/books-by-rating/": {
                "get": {
                    "summary": "Rated books grouped into rating buckets 1-5",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "Buckets sorted by descending population, each `[label, [books]]`",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "type": "array" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "publication_date": {
                            "type": "string",
                            "format": "date",
                            "description": "YYYY-MM-DD"
                        },
                        "available": { "type": "boolean" }
                    },
                    "required": ["title", "author", "publication_date", "available"]
                },
                "BookPage": {
                    "type": "object",
                    "properties": {
                        "total_items": { "type": "integer" },
                        "total_pages": { "type": "integer" },
                        "current_page": { "type": "integer" },
                        "page_size": {
                            "type": "integer",
                            "description": "Number of items returned on this page"
                        },
                        "data": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/Book" }
                        }
                    },
                    "required": ["total_items", "total_pages", "current_page", "page_size", "data"]
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_fragment_covers_every_route() {
        let fragment = openapi_fragment();
        let paths = fragment["paths"].as_object().unwrap();

        for path in [
            "/books/",
            "/books/author/{author}/",
            "/books/year/{year}/",
            "/books/{title}/",
            "/books-by-rating/",
        ] {
            assert!(paths.contains_key(path), "missing path {path}");
        }
    }

    #[tokio::test]
    async fn init_seeds_an_empty_store_once() {
        let settings = Settings::default();
        let module = BooksModule::new(&settings);
        let ctx = InitCtx {
            settings: &settings,
        };

        module.init(&ctx).await.unwrap();
        assert_eq!(module.state.repo.count().unwrap(), 10);

        // A second init must not duplicate the catalog.
        module.init(&ctx).await.unwrap();
        assert_eq!(module.state.repo.count().unwrap(), 10);
    }
}
