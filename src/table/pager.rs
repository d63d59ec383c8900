//! Page arithmetic (pages are 1-based)

/// `ceil(count / page_size)`; zero rows means zero pages.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Up to `window` consecutive page numbers centred on `current`, shifted to
/// stay inside `1..=total`.
pub fn page_window(current: usize, total: usize, window: usize) -> Vec<usize> {
    if total == 0 || window == 0 {
        return Vec::new();
    }
    let mut start = current.saturating_sub(window / 2).max(1);
    let end = (start + window - 1).min(total);
    if end + 1 - start < window {
        start = (end + 1).saturating_sub(window).max(1);
    }
    (start..=end).collect()
}
