use std::ops::RangeInclusive;

/// Page arithmetic over the projected list. Pages are 1-based.
#[derive(Debug, Clone)]
pub struct PaginationController {
    page_size: usize,
    window_size: usize,
    current: usize,
    wanted: Option<usize>,
}

impl PaginationController {
    pub fn new(page_size: usize, window_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            window_size: window_size.max(1),
            current: 1,
            wanted: None,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// A page the user asked for that is waiting on data still in flight.
    pub fn wanted(&self) -> Option<usize> {
        self.wanted
    }

    pub fn set_wanted(&mut self, page: Option<usize>) {
        self.wanted = page;
    }

    /// Back to page 1 with nothing pending.
    pub fn reset(&mut self) {
        self.current = 1;
        self.wanted = None;
    }

    /// Pages over the projection, plus one virtual page while the server
    /// has more that is not cached yet.
    pub fn total_pages(&self, projected: usize, has_more: bool) -> usize {
        projected.div_ceil(self.page_size) + usize::from(has_more)
    }

    pub fn go_to(&mut self, page: usize, total_pages: usize) -> usize {
        self.current = page.clamp(1, total_pages.max(1));
        self.current
    }

    /// Slice of `projected` for `page`; empty past the end.
    pub fn page_slice<'a, T>(&self, projected: &'a [T], page: usize) -> &'a [T] {
        let start = page.saturating_sub(1).saturating_mul(self.page_size);
        if start >= projected.len() {
            return &[];
        }
        let end = (start + self.page_size).min(projected.len());
        &projected[start..end]
    }

    /// Whether showing `page` needs more raw data than is cached.
    pub fn exceeds_cached(&self, page: usize, cached: usize) -> bool {
        page.saturating_mul(self.page_size) > cached
    }

    /// Page buttons to show: a fixed-width window around the current page,
    /// starting `window_size / 2` pages before it and shifted back to stay
    /// within `[1, total_pages]`.
    pub fn window(&self, total_pages: usize) -> RangeInclusive<usize> {
        window(self.current, total_pages, self.window_size)
    }
}

pub fn window(current: usize, total_pages: usize, width: usize) -> RangeInclusive<usize> {
    if total_pages == 0 {
        return 1..=0;
    }
    let width = width.max(1);
    let mut start = current.saturating_sub(width / 2).max(1);
    let mut end = start + width - 1;
    if end > total_pages {
        end = total_pages;
        start = (end + 1).saturating_sub(width).max(1);
    }
    start..=end
}
