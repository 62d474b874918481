//! Page-number pagination.
//!
//! Pages are 1-based. A request past the last page is an error, except when the result
//! set is empty: then there are zero pages and any page yields an empty list.
//!
//! ```rust,ignore
//! let request = PageRequest::new(2, 25);
//! let page = paginate(items, request)?;
//! assert_eq!(page.page, 2);
//! ```

use serde::Serialize;

use super::error::{AppError, AppResult};

/// Validated page request (both values are >= 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    pub fn new(page: usize, per_page: usize) -> Self {
        debug_assert!(page >= 1 && per_page >= 1);
        Self { page, per_page }
    }

    fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// Page count bookkeeping for one result set.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total_items: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(total_items: usize, per_page: usize) -> Self {
        Self {
            total_items,
            per_page: per_page.max(1),
        }
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn num_pages(&self) -> usize {
        self.total_items.div_ceil(self.per_page)
    }

    /// Whether `page` is servable. An empty result set serves every page (as empty).
    pub fn contains(&self, page: usize) -> bool {
        let pages = self.num_pages();
        pages == 0 || page <= pages
    }

    pub fn ensure_contains(&self, page: usize) -> AppResult<()> {
        if self.contains(page) {
            Ok(())
        } else {
            Err(AppError::PageOutOfRange)
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            total_pages: self.total_pages,
            total_items: self.total_items,
            items: self.items.into_iter().map(f).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Slice `items` for `request` without checking the page range.
///
/// Used by views that paginate several lists with one page number and apply a joint
/// range check afterwards.
pub fn slice_page<T>(items: Vec<T>, request: PageRequest) -> (Page<T>, Paginator) {
    let paginator = Paginator::new(items.len(), request.per_page);
    let items = items
        .into_iter()
        .skip(request.offset())
        .take(request.per_page)
        .collect();

    (
        Page {
            page: request.page,
            total_pages: paginator.num_pages(),
            total_items: paginator.total_items(),
            items,
        },
        paginator,
    )
}

/// Slice `items` for `request`, rejecting pages past the end.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> AppResult<Page<T>> {
    let (page, paginator) = slice_page(items, request);
    paginator.ensure_contains(request.page)?;
    Ok(page)
}
