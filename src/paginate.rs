use crate::error::{Result, SpendError};

pub const DEFAULT_PAGE_SIZE: usize = 60;

/// `ceil(len / page_size)`; zero for an empty list.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Half-open slice `[(page-1)*size, page*size)` clipped to the input. Page
/// numbers start at 1; page 0 or a page past the end yields an empty slice.
pub fn paginate<T>(items: &[T], page_size: usize, page_number: usize) -> &[T] {
    if page_size == 0 || page_number == 0 {
        return &[];
    }
    let start = (page_number - 1).saturating_mul(page_size).min(items.len());
    let end = page_number.saturating_mul(page_size).min(items.len());
    &items[start..end]
}

/// Page-navigation state over a list owned elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    current: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            current: 1,
        }
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Result<Self> {
        check_page_size(page_size)?;
        Ok(Self { page_size, current: 1 })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn total_pages(&self, len: usize) -> usize {
        total_pages(len, self.page_size)
    }

    pub fn page<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        paginate(items, self.page_size, self.current)
    }

    /// Returns false (and stays put) when already on the last page.
    pub fn next(&mut self, len: usize) -> bool {
        if self.current < self.total_pages(len) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Returns false (and stays put) when already on page 1.
    pub fn prev(&mut self) -> bool {
        if self.current > 1 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page`; out-of-range targets are ignored.
    pub fn go_to(&mut self, page: usize, len: usize) -> bool {
        if page >= 1 && page <= self.total_pages(len) {
            self.current = page;
            true
        } else {
            false
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        check_page_size(page_size)?;
        self.page_size = page_size;
        self.reset();
        Ok(())
    }

    /// Back to page 1. Called whenever the underlying list changes.
    pub fn reset(&mut self) {
        self.current = 1;
    }
}

fn check_page_size(page_size: usize) -> Result<()> {
    if page_size == 0 {
        return Err(SpendError::validation("Page size must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_125_records_at_60_per_page() {
        let items: Vec<usize> = (0..125).collect();
        assert_eq!(total_pages(items.len(), 60), 3);
        assert_eq!(paginate(&items, 60, 3).len(), 5);
        assert_eq!(paginate(&items, 60, 3)[0], 120);
    }

    #[test]
    fn test_pages_reconstruct_list() {
        let items: Vec<usize> = (0..37).collect();
        for size in 1..=40 {
            let pages = total_pages(items.len(), size);
            let mut joined = Vec::new();
            for p in 1..=pages {
                let page = paginate(&items, size, p);
                assert!(page.len() <= size);
                joined.extend_from_slice(page);
            }
            assert_eq!(joined, items, "page size {size}");
        }
    }

    #[test]
    fn test_out_of_range_pages_are_empty() {
        let items = [1, 2, 3];
        assert!(paginate(&items, 2, 0).is_empty());
        assert!(paginate(&items, 2, 3).is_empty());
        assert_eq!(total_pages(0, 60), 0);
    }

    #[test]
    fn test_navigation_clamps() {
        let mut p = Paginator::new(10).unwrap();
        assert!(!p.prev());
        assert_eq!(p.current_page(), 1);
        assert!(p.next(25));
        assert!(p.next(25));
        assert!(!p.next(25));
        assert_eq!(p.current_page(), 3);
        assert!(!p.go_to(4, 25));
        assert!(p.go_to(2, 25));
        assert_eq!(p.current_page(), 2);
    }

    #[test]
    fn test_page_size_change_resets_to_first_page() {
        let mut p = Paginator::new(10).unwrap();
        p.next(100);
        p.next(100);
        p.set_page_size(20).unwrap();
        assert_eq!(p.current_page(), 1);
        assert_eq!(p.page_size(), 20);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(Paginator::new(0).is_err());
        let mut p = Paginator::default();
        assert!(p.set_page_size(0).is_err());
        assert_eq!(p.page_size(), DEFAULT_PAGE_SIZE);
    }
}
