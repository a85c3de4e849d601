use crate::error::{AppError, Result};
use serde::Serialize;

/// A validated `page`/`limit` pair. Both are 1-based and at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Builds a page request, clamping `limit` to `max_limit`.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if `page` or `limit` is zero.
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32, max_limit: u32) -> Result<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(default_limit);
        if page == 0 {
            return Err(AppError::bad_request("page must be at least 1"));
        }
        if limit == 0 {
            return Err(AppError::bad_request("limit must be at least 1"));
        }
        Ok(Self { page, limit: limit.min(max_limit.max(1)) })
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }

    /// Slices an already fully materialized result set.
    #[must_use]
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let items = items.into_iter().skip(self.offset()).take(self.limit as usize).collect();
        Page {
            items,
            pagination: Pagination {
                page: self.page,
                limit: self.limit,
                total,
                pages: total.div_ceil(self.limit as usize),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub pages: usize,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page { items: self.items.into_iter().map(f).collect(), pagination: self.pagination }
    }
}
