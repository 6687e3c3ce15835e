//! crates/bookshelf_core/src/pagination.rs
//!
//! Page requests and page results shared by every listing operation.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_SORT: &str = "id desc";

/// A normalized pagination request. Zero limit/page and an empty sort are
/// replaced with the defaults at construction, so every accessor is safe to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    page: u32,
    sort: String,
}

impl PageRequest {
    pub fn new(limit: u32, page: u32, sort: impl Into<String>) -> Self {
        let sort = sort.into();
        let sort = sort.trim();
        Self {
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
            page: if page == 0 { DEFAULT_PAGE } else { page },
            sort: if sort.is_empty() {
                DEFAULT_SORT.to_string()
            } else {
                sort.to_lowercase()
            },
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn sort(&self) -> &str {
        &self.sort
    }

    /// Number of rows to skip before this page starts.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Total number of pages needed for `total_rows` at this limit.
    pub fn total_pages(&self, total_rows: u64) -> u64 {
        total_rows.div_ceil(u64::from(self.limit))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_PAGE, DEFAULT_SORT)
    }
}

/// One page of rows plus the totals a client needs to walk the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub limit: u32,
    pub page: u32,
    pub sort: String,
    pub total_rows: u64,
    pub total_pages: u64,
    pub rows: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: &PageRequest, rows: Vec<T>, total_rows: u64) -> Self {
        Self {
            limit: request.limit(),
            page: request.page(),
            sort: request.sort().to_string(),
            total_rows,
            total_pages: request.total_pages(total_rows),
            rows,
        }
    }

    /// Converts every row while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            limit: self.limit,
            page: self.page,
            sort: self.sort,
            total_rows: self.total_rows,
            total_pages: self.total_pages,
            rows: self.rows.into_iter().map(f).collect(),
        }
    }
}
