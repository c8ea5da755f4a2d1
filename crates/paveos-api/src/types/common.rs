//! Envelope and pagination types shared by every endpoint.

use serde::{Deserialize, Serialize};

/// The `{success, data}` wrapper around every backend response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,

    #[serde(default = "Option::default")]
    pub data: Option<T>,

    /// Error text on failures.
    #[serde(default)]
    pub error: Option<String>,

    /// Human readable message (some endpoints use this instead of `error`).
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// The most specific failure text the backend gave us.
    pub fn failure_text(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Paginated list responses carry the page next to `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedEnvelope<T> {
    #[serde(default)]
    pub success: bool,

    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    #[serde(default)]
    pub pagination: Pagination,

    #[serde(default)]
    pub error: Option<String>,
}

/// A page of records.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Pagination metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

/// Error body shape used by non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}
