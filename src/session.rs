//! Caller-held pagination state, one entry per source.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::models::SourceType;
use crate::paginate::total_pages;
use rustc_hash::FxHashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaginationState {
    pages: FxHashMap<SourceType, PageState>,
    default_page_size: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl PaginationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources seen for the first time start on page 1 of `page_size` rows.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            pages: FxHashMap::default(),
            default_page_size: page_size.max(1),
        }
    }

    /// State for `source`, created with defaults on first access.
    pub fn get_or_init(&mut self, source: SourceType) -> &mut PageState {
        let page_size = self.default_page_size;
        self.pages
            .entry(source)
            .or_insert(PageState { page: 1, page_size })
    }

    pub fn get(&self, source: SourceType) -> Option<PageState> {
        self.pages.get(&source).copied()
    }

    pub fn set_page(&mut self, source: SourceType, page: usize) {
        self.get_or_init(source).page = page.max(1);
    }

    /// Changing the page size returns to the first page.
    pub fn set_page_size(&mut self, source: SourceType, page_size: usize) {
        let state = self.get_or_init(source);
        state.page_size = page_size.max(1);
        state.page = 1;
    }

    /// Pulls the stored page into `1..=total_pages` for `item_count` rows and
    /// returns the clamped state.
    pub fn clamp(&mut self, source: SourceType, item_count: usize) -> PageState {
        let state = self.get_or_init(source);
        let last = total_pages(item_count, state.page_size);
        state.page = state.page.clamp(1, last);
        *state
    }

    /// Drops state for sources not in `active`. Returns how many were removed.
    pub fn retain_sources(&mut self, active: &[SourceType]) -> usize {
        let before = self.pages.len();
        self.pages.retain(|source, _| active.contains(source));
        let purged = before - self.pages.len();
        if purged > 0 {
            debug!(purged, "Purged pagination state");
        }
        purged
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
