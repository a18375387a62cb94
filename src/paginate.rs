use crate::dataset::Dataset;

/// One page of a dataset. Indices are 1-based and inclusive; an empty page
/// reports `0..=0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Dataset,
    pub start_index: usize,
    pub end_index: usize,
    pub total_pages: usize,
}

/// `max(1, ceil(count / page_size))`
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Slices page `page` (1-based) of `page_size` rows. Out-of-range pages are
/// empty; clamping is left to the caller.
pub fn get_page(dataset: &Dataset, page: usize, page_size: usize) -> Page {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let end = start.saturating_add(page_size).min(dataset.len());
    let items = dataset.slice(start..end);

    let (start_index, end_index) = if items.is_empty() {
        (0, 0)
    } else {
        (start + 1, end)
    };

    Page {
        items,
        start_index,
        end_index,
        total_pages: total_pages(dataset.len(), page_size),
    }
}
