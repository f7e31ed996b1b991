//! Windowing and ordering of filtered result sets.
//!
//! A [`Pageable`] bundles the normalized page index, page size, sort key and
//! direction. Repositories turn it into `ORDER BY ... LIMIT ... OFFSET ...`
//! (or into an in-memory sort and slice via [`paginate`]) and hand back a
//! [`Page`] of raw entities, which is finally wrapped into the caller-facing
//! [`Paginated`] envelope.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Number of items per page when the caller supplies none (or a non-positive size).
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A field an entity may be ordered by.
///
/// Implementors are closed enums, so only audited columns ever reach an
/// `ORDER BY` clause.
pub trait SortKey<T>: Copy + std::fmt::Debug {
    /// Fully qualified column used in SQL ordering.
    fn column(&self) -> &'static str;
    /// In-memory ordering equivalent to [`SortKey::column`].
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// Pagination spec: which window of the ordered result set to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pageable<K> {
    page: u32,
    size: u32,
    sort: K,
    direction: SortDirection,
}

impl<K: Copy> Pageable<K> {
    /// Builds a pagination spec. A zero `size` is replaced by [`DEFAULT_PAGE_SIZE`],
    /// so the window is never empty by construction.
    pub fn of(page: u32, size: u32, sort: K, direction: SortDirection) -> Self {
        Self {
            page,
            size: if size == 0 { DEFAULT_PAGE_SIZE } else { size },
            sort,
            direction,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> K {
        self.sort
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Number of rows preceding this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One window of raw entities plus the size of the whole filtered population.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl<T> Page<T> {
    pub fn new<K: Copy>(items: Vec<T>, total: u64, pageable: &Pageable<K>) -> Self {
        Self {
            items,
            total,
            page: pageable.page(),
            size: pageable.size(),
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.size))
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

/// Uniform paginated response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub number_of_elements: usize,
    pub current_page: u32,
    pub page_size: u32,
}

impl<T> From<Page<T>> for Paginated<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        Self {
            number_of_elements: page.items.len(),
            total_items: page.total,
            total_pages,
            current_page: page.page,
            page_size: page.size,
            data: page.items,
        }
    }
}

/// Sorts `rows` by the pageable's key and cuts out the requested window.
///
/// The sort is stable, so rows that compare equal keep their incoming order
/// (insertion order for the in-memory store), mirroring the `id` tie-breaker
/// used in SQL.
pub fn paginate<T, K: SortKey<T>>(mut rows: Vec<T>, pageable: &Pageable<K>) -> Page<T> {
    let key = pageable.sort();
    rows.sort_by(|a, b| match pageable.direction() {
        SortDirection::Asc => key.compare(a, b),
        SortDirection::Desc => key.compare(b, a),
    });

    let total = rows.len() as u64;
    let offset = usize::try_from(pageable.offset()).unwrap_or(usize::MAX);
    let items = rows
        .into_iter()
        .skip(offset)
        .take(pageable.size() as usize)
        .collect();

    Page::new(items, total, pageable)
}
