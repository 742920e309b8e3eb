//! Page windows over newest-first listings.
//!
//! A bad `?page=` value never fails a request: anything unparsable serves the
//! first page, numbers below one serve the first page and numbers past the
//! end serve the last page.

use serde::Serialize;
use std::num::IntErrorKind;

/// Resolves page numbers against a known item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: usize,
    per_page: usize,
}

/// The slice of a listing that one page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub offset: usize,
    pub limit: usize,
}

/// One served page plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
}

impl Paginator {
    /// `per_page` of zero is treated as one so a misconfiguration cannot
    /// divide by zero.
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// An empty listing still has one (empty) page.
    pub fn num_pages(&self) -> usize {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Clamp a requested page number into `1..=num_pages`.
    pub fn clamp(&self, requested: i64) -> usize {
        let last = self.num_pages();
        if requested < 1 {
            1
        } else {
            usize::try_from(requested).map_or(last, |n| n.min(last))
        }
    }

    /// Window for a raw `?page=` query value.
    pub fn window(&self, raw: Option<&str>) -> PageWindow {
        let number = self.clamp(parse_page_number(raw));
        let offset = (number - 1) * self.per_page;
        let limit = self.per_page.min(self.count.saturating_sub(offset));

        PageWindow {
            number,
            num_pages: self.num_pages(),
            offset,
            limit,
        }
    }

    /// Wrap the items fetched for `window` into a page.
    pub fn page<T>(&self, window: PageWindow, items: Vec<T>) -> Page<T> {
        let has_next = window.number < window.num_pages;
        let has_previous = window.number > 1;

        Page {
            items,
            number: window.number,
            num_pages: window.num_pages,
            count: self.count,
            has_next,
            has_previous,
            next_page_number: has_next.then(|| window.number + 1),
            previous_page_number: has_previous.then(|| window.number - 1),
        }
    }
}

/// Slice an already ordered listing into the page named by `raw`.
pub fn paginate<T>(items: Vec<T>, raw: Option<&str>, per_page: usize) -> Page<T> {
    let paginator = Paginator::new(items.len(), per_page);
    let window = paginator.window(raw);
    let served = items
        .into_iter()
        .skip(window.offset)
        .take(window.limit)
        .collect();
    paginator.page(window, served)
}

/// Parse a `?page=` value; missing or garbage input means page 1.
///
/// Out-of-range numbers saturate so they still clamp to the nearest page.
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return 1;
    };

    match raw.parse::<i64>() {
        Ok(number) => number,
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            _ => 1,
        },
    }
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 1-based index of the first item on this page (0 for an empty listing).
    pub fn start_index(&self, per_page: usize) -> usize {
        if self.count == 0 {
            0
        } else {
            (self.number - 1) * per_page.max(1) + 1
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next,
            has_previous: self.has_previous,
            next_page_number: self.next_page_number,
            previous_page_number: self.previous_page_number,
        }
    }
}
