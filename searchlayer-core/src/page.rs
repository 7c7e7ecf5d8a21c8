//! Page-based windows over search results.
//!
//! [`PaginationParams`] translate a 1-indexed page number into the `limit`/`skip` window of a
//! [`Criteria`]; [`Page`] carries one window of results together with the total match count.

use serde::{Deserialize, Serialize};

use crate::criteria::Criteria;

/// A single page of results.
///
/// # Example
///
/// ```ignore
/// use searchlayer_core::page::Page;
///
/// let page: Page<String> = Page::builder(vec!["item1".to_string()])
///     .with_count(100)
///     .with_next_page(Some(2))
///     .build();
///
/// assert_eq!(page.items.len(), 1);
/// assert_eq!(page.count, 100);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub items: Vec<T>,
    /// Total number of matches across all pages.
    pub count: u64,
    /// The next page number, if more matches exist.
    pub next_page: Option<u64>,
    /// The previous page number, unless this is the first page.
    pub previous_page: Option<u64>,
}

impl<T> Page<T> {
    pub fn builder(items: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(items)
    }

    /// Converts the items of this page, keeping the navigation metadata.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `convert`.
    pub fn try_map<U, E>(self, convert: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self
                .items
                .into_iter()
                .map(convert)
                .collect::<Result<Vec<_>, E>>()?,
            count: self.count,
            next_page: self.next_page,
            previous_page: self.previous_page,
        })
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            next_page: None,
            previous_page: None,
        }
    }
}

/// Builder for [`Page`].
pub struct PageBuilder<T> {
    items: Vec<T>,
    count: u64,
    next_page: Option<u64>,
    previous_page: Option<u64>,
}

impl<T> PageBuilder<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            count: 0,
            next_page: None,
            previous_page: None,
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    pub fn with_next_page(mut self, next_page: Option<u64>) -> Self {
        self.next_page = next_page;
        self
    }

    pub fn with_previous_page(mut self, previous_page: Option<u64>) -> Self {
        self.previous_page = previous_page;
        self
    }

    pub fn build(self) -> Page<T> {
        Page {
            items: self.items,
            count: self.count,
            next_page: self.next_page,
            previous_page: self.previous_page,
        }
    }
}

/// Which page to fetch and how large pages are. Pages are 1-indexed.
///
/// # Example
///
/// ```ignore
/// use searchlayer_core::page::PaginationParams;
///
/// let params = PaginationParams::new(3, 20);
/// assert_eq!(params.offset(), 40);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// The page number; `0` is treated as the first page.
    pub page: u64,
    /// Number of items per page.
    pub per_page: u64,
}

impl PaginationParams {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// The number of matches to skip before this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Restricts `criteria` to this page's window.
    pub fn window(&self, mut criteria: Criteria) -> Criteria {
        criteria.limit = Some(self.per_page);
        criteria.skip = Some(self.offset());
        criteria
    }

    /// Wraps one window of items, deriving navigation from the total match count.
    pub fn page<T>(&self, items: Vec<T>, count: u64) -> Page<T> {
        let page = self.page.max(1);
        let end = self.offset().saturating_add(self.per_page);

        Page::builder(items)
            .with_count(count)
            .with_next_page(if end < count { Some(page + 1) } else { None })
            .with_previous_page(if page > 1 { Some(page - 1) } else { None })
            .build()
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window() {
        let criteria = PaginationParams::new(3, 20).window(Criteria::new());

        assert_eq!(criteria.limit, Some(20));
        assert_eq!(criteria.skip, Some(40));
        assert_eq!(PaginationParams::new(0, 20).offset(), 0);
    }

    #[test]
    fn test_page_navigation() {
        let params = PaginationParams::new(2, 10);

        let middle = params.page(vec![1; 10], 35);
        assert_eq!(middle.next_page, Some(3));
        assert_eq!(middle.previous_page, Some(1));

        let last = PaginationParams::new(4, 10).page(vec![1; 5], 35);
        assert_eq!(last.next_page, None);
        assert_eq!(last.previous_page, Some(3));

        let first = PaginationParams::default().page(Vec::<u8>::new(), 0);
        assert_eq!(first, Page::default());
    }
}
