//! Caller-supplied filter criteria.
//!
//! Every field is optional. Absent fields impose no constraint and malformed
//! paging values degrade to defaults instead of failing the request.

pub mod task;
pub mod user;

pub use task::TaskFilters;
pub use user::UserFilters;

use serde::{Deserialize, Serialize};

use crate::pagination::{SortDirection, DEFAULT_PAGE_SIZE};

/// Sort field used when none (or a blank one) is supplied.
pub const DEFAULT_SORT_FIELD: &str = "id";

/// Paging and ordering fields shared by every filter object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort_by: Option<String>,
    pub order_by: Option<SortDirection>,
}

impl PageRequest {
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        Self {
            page,
            size,
            ..Default::default()
        }
    }

    /// Raw page if non-negative, else 0.
    pub fn page_index(&self) -> u32 {
        match self.page {
            Some(page) if page > 0 => u32::try_from(page).unwrap_or(u32::MAX),
            _ => 0,
        }
    }

    /// Raw size if positive, else [`DEFAULT_PAGE_SIZE`].
    pub fn page_size(&self) -> u32 {
        match self.size {
            Some(size) if size > 0 => u32::try_from(size).unwrap_or(u32::MAX),
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    /// Raw sort field if non-blank, else [`DEFAULT_SORT_FIELD`].
    pub fn sort_field(&self) -> &str {
        match self.sort_by.as_deref() {
            Some(field) if !field.trim().is_empty() => field,
            _ => DEFAULT_SORT_FIELD,
        }
    }

    /// Raw direction if present, else ascending.
    pub fn sort_direction(&self) -> SortDirection {
        self.order_by.unwrap_or_default()
    }
}
