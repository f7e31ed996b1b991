use serde::{Deserialize, Serialize};

use super::PageRequest;
use crate::models::TaskStatus;
use crate::pagination::Pageable;
use crate::specification::task::TaskSortField;

/// Optional criteria for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilters {
    #[serde(flatten)]
    pub paging: PageRequest,
    /// Case-insensitive substring of the task uuid.
    pub uuid: Option<String>,
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Any of these statuses. An empty list is no constraint.
    #[serde(alias = "taskStatus")]
    pub status: Option<Vec<TaskStatus>>,
    /// Owner's active flag.
    pub user_is_active: Option<bool>,
    /// Owner's uuid.
    pub user_uuid: Option<String>,
}

impl TaskFilters {
    /// Filters that only restrict the owner, as used by the per-user listings.
    pub fn for_user(user_uuid: impl Into<String>, paging: PageRequest) -> Self {
        Self {
            paging,
            user_uuid: Some(user_uuid.into()),
            ..Default::default()
        }
    }

    /// Pagination spec for these filters. Unknown sort fields fall back to `id`.
    pub fn pageable(&self) -> Pageable<TaskSortField> {
        let sort = TaskSortField::parse(self.paging.sort_field()).unwrap_or(TaskSortField::Id);
        Pageable::of(
            self.paging.page_index(),
            self.paging.page_size(),
            sort,
            self.paging.sort_direction(),
        )
    }
}
