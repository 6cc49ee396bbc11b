//! Deterministic pagination.
//!
//! Pages are 1-based. Page `p` of size `s` is the slice `[(p-1)*s, p*s)`
//! of an already ordered result; a page past the end is empty.

use serde::{Deserialize, Serialize};

/// A validated page request (both numbers are at least 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: usize,
    size: usize,
}

impl PageRequest {
    /// `None` when either number is zero
    pub fn new(page: usize, size: usize) -> Option<Self> {
        (page >= 1 && size >= 1).then_some(Self { page, size })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.size)
    }
}

/// One page of an ordered result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_results: usize,
}

impl<T> Page<T> {
    /// Cut one page out of the full, ordered result
    pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let total_results = all.len();
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(request.size())
            .collect();

        Self {
            items,
            page: request.page(),
            total_pages: total_results.div_ceil(request.size()),
            total_results,
        }
    }

    /// An empty first-and-only page
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            page: request.page(),
            total_pages: 0,
            total_results: 0,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_page_or_size_is_rejected() {
        assert!(PageRequest::new(0, 10).is_none());
        assert!(PageRequest::new(1, 0).is_none());
        assert!(PageRequest::new(1, 1).is_some());
    }

    #[test]
    fn test_slices_are_contiguous() {
        let all: Vec<u32> = (1..=25).collect();

        let first = Page::slice(all.clone(), PageRequest::new(1, 10).unwrap());
        let last = Page::slice(all, PageRequest::new(3, 10).unwrap());

        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(last.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_results, 25);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let all: Vec<u32> = (1..=5).collect();
        let page = Page::slice(all, PageRequest::new(4, 5).unwrap());

        assert!(page.items.is_empty());
        assert_eq!(page.page, 4);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_results, 5);
    }

    #[test]
    fn test_huge_page_number_does_not_overflow() {
        let page = Page::slice(vec![1, 2, 3], PageRequest::new(usize::MAX, usize::MAX).unwrap());
        assert!(page.items.is_empty());
    }
}
