use serde::{Deserialize, Serialize};

/// Query parameters accepted by the paging-only list endpoints.
///
/// Values stay raw strings here; coercion (and the 400s it can produce) is the
/// handlers' job.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Query parameters accepted by the browse endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub author: Option<String>,
    pub publication_year: Option<String>,
}

/// Envelope shared by every paginated list response.
#[derive(Debug, Serialize)]
pub struct PageEnvelope {
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
    /// Number of items actually returned on this page.
    pub page_size: usize,
    pub data: Vec<serde_json::Value>,
}
