//! Page bookkeeping
//!
//! [`PageState`] tracks a server-paginated listing, [`LocalPager`] pages a
//! collection that was fetched whole and filtered in memory. Both clamp an
//! out-of-range page back to the first page.

use std::ops::Range;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Maximum number of page buttons the listings render.
pub const DEFAULT_PAGE_BUTTONS: u32 = 10;

/// Zero-based position within a paginated listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageState {
    pub current: u32,
    pub total_pages: u32,
}

impl PageState {
    /// Builds a state whose `current` is already clamped.
    pub fn new(current: u32, total_pages: u32) -> Self {
        let mut state = Self {
            current: 0,
            total_pages,
        };
        state.current = state.clamp(current);
        state
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    /// Index of the last page (0 for an empty listing).
    pub fn last_page(&self) -> u32 {
        self.total_pages.saturating_sub(1)
    }

    /// `page` if it exists, otherwise the first page.
    pub fn clamp(&self, page: u32) -> u32 {
        if page < self.total_pages {
            page
        } else {
            0
        }
    }

    pub fn window(&self, max_buttons: u32) -> Range<u32> {
        page_window(self.current, self.total_pages, max_buttons)
    }
}

/// Contiguous page indices to render as buttons: up to `max_buttons`,
/// centred on `current`, shifted to stay inside `[0, total_pages)`.
pub fn page_window(current: u32, total_pages: u32, max_buttons: u32) -> Range<u32> {
    let mut start = current.saturating_sub(max_buttons / 2);
    let mut end = start + max_buttons;
    if end > total_pages {
        end = total_pages;
        start = end.saturating_sub(max_buttons);
    }
    start..end
}

/// One page of an in-memory collection.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPage<'a, T> {
    pub items: &'a [T],
    pub state: PageState,
    pub total_items: usize,
}

/// Pages an already-filtered collection held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPager {
    page_size: usize,
    current: u32,
}

impl Default for LocalPager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl LocalPager {
    /// A zero page size is treated as one.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn go_to(&mut self, page: u32) {
        self.current = page;
    }

    pub fn total_pages(&self, total_items: usize) -> u32 {
        u32::try_from(total_items.div_ceil(self.page_size)).unwrap_or(u32::MAX)
    }

    /// Slice out the current page. If the collection shrank below the
    /// current page (new filter, refresh), the pager resets to page 0.
    pub fn page<'a, T>(&mut self, items: &'a [T]) -> LocalPage<'a, T> {
        let state = PageState::new(self.current, self.total_pages(items.len()));
        self.current = state.current;

        let start = (state.current as usize) * self.page_size;
        let end = (start + self.page_size).min(items.len());
        LocalPage {
            items: items.get(start..end).unwrap_or(&[]),
            state,
            total_items: items.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_of_three_pages() {
        let state = PageState::new(0, 3);
        assert!(state.has_next());
        assert!(!state.has_previous());
        assert_eq!(state.last_page(), 2);
    }

    #[test]
    fn clamp_resets_to_first_page() {
        let state = PageState::new(0, 2);
        assert_eq!(state.clamp(1), 1);
        assert_eq!(state.clamp(2), 0);
        assert_eq!(PageState::new(5, 2).current, 0);
        assert_eq!(PageState::new(3, 0).current, 0);
    }

    #[test]
    fn empty_listing_has_no_neighbours() {
        let state = PageState::default();
        assert!(!state.has_next());
        assert!(!state.has_previous());
        assert_eq!(state.last_page(), 0);
    }

    #[test]
    fn window_centres_and_shifts() {
        assert_eq!(page_window(0, 3, 10), 0..3);
        assert_eq!(page_window(0, 30, 10), 0..10);
        assert_eq!(page_window(12, 30, 10), 7..17);
        assert_eq!(page_window(28, 30, 10), 20..30);
        assert_eq!(page_window(0, 0, 10), 0..0);
    }

    #[test]
    fn local_pager_slices_and_clamps() {
        let items: Vec<u32> = (0..25).collect();
        let mut pager = LocalPager::new(10);

        pager.go_to(2);
        let page = pager.page(&items);
        assert_eq!(page.items, &[20, 21, 22, 23, 24]);
        assert_eq!(page.state.total_pages, 3);
        assert!(!page.state.has_next());

        let filtered: Vec<u32> = items.iter().copied().filter(|n| n % 5 == 0).collect();
        let page = pager.page(&filtered);
        assert_eq!(page.state.current, 0);
        assert_eq!(page.items, &[0, 5, 10, 15, 20]);
        assert_eq!(pager.current(), 0);
    }

    #[test]
    fn local_pager_on_empty_collection() {
        let items: Vec<u32> = Vec::new();
        let mut pager = LocalPager::default();
        let page = pager.page(&items);
        assert!(page.items.is_empty());
        assert_eq!(page.state.total_pages, 0);
        assert_eq!(page.total_items, 0);
    }
}
