use sqlx::{Postgres, QueryBuilder};
use std::cmp::Ordering;

use super::{contains_ignore_case, like_pattern, Condition, Specification};
use crate::filters::TaskFilters;
use crate::models::{Task, TaskStatus};
use crate::pagination::SortKey;

pub type TaskSpecification = Specification<TaskCondition>;

/// Task fields open to substring matching. Anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Uuid,
    Title,
}

impl TaskField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "uuid" => Some(TaskField::Uuid),
            "title" => Some(TaskField::Title),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            TaskField::Uuid => "t.uuid",
            TaskField::Title => "t.title",
        }
    }

    fn value<'a>(&self, task: &'a Task) -> &'a str {
        match self {
            TaskField::Uuid => &task.uuid,
            TaskField::Title => &task.title,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskCondition {
    /// Case-insensitive substring match on an allow-listed field.
    FieldLike { field: TaskField, needle: String },
    StatusIn(Vec<TaskStatus>),
    /// Owner's active flag, read through the owner join.
    UserIsActive(bool),
    /// Owner's uuid, read through the owner join.
    UserUuid(String),
}

impl Condition for TaskCondition {
    type Record = Task;

    fn matches(&self, task: &Task) -> bool {
        match self {
            TaskCondition::FieldLike { field, needle } => {
                contains_ignore_case(field.value(task), needle)
            }
            TaskCondition::StatusIn(statuses) => statuses.contains(&task.status),
            TaskCondition::UserIsActive(active) => task
                .owner
                .as_ref()
                .is_some_and(|owner| owner.is_active == *active),
            TaskCondition::UserUuid(uuid) => task
                .owner
                .as_ref()
                .is_some_and(|owner| &owner.uuid == uuid),
        }
    }

    fn push_sql(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            TaskCondition::FieldLike { field, needle } => {
                builder
                    .push(format!("UPPER({}) LIKE ", field.column()))
                    .push_bind(like_pattern(needle));
            }
            TaskCondition::StatusIn(statuses) => {
                builder.push("t.status IN (");
                let mut separated = builder.separated(", ");
                for status in statuses {
                    separated.push_bind(status.as_str());
                }
                separated.push_unseparated(")");
            }
            TaskCondition::UserIsActive(active) => {
                builder.push("u.is_active = ").push_bind(*active);
            }
            TaskCondition::UserUuid(uuid) => {
                builder.push("u.uuid = ").push_bind(uuid.clone());
            }
        }
    }
}

/// Substring match on `field`. Unknown field names and blank values are neutral.
pub fn tasks_field_like(field: &str, value: &str) -> Option<TaskCondition> {
    let field = TaskField::parse(field)?;
    if value.trim().is_empty() {
        return None;
    }
    Some(TaskCondition::FieldLike {
        field,
        needle: value.to_string(),
    })
}

/// Membership in `statuses`. An empty list is neutral, not "match nothing".
pub fn task_status_in(statuses: &[TaskStatus]) -> Option<TaskCondition> {
    if statuses.is_empty() {
        return None;
    }
    Some(TaskCondition::StatusIn(statuses.to_vec()))
}

pub fn tasks_user_is_active(active: bool) -> Option<TaskCondition> {
    Some(TaskCondition::UserIsActive(active))
}

pub fn tasks_user_uuid(uuid: &str) -> Option<TaskCondition> {
    Some(TaskCondition::UserUuid(uuid.to_string()))
}

/// Composes the conjunction of every condition whose filter field is present,
/// in a fixed order: uuid, title, status, owner active flag, owner uuid.
pub fn from_filters(filters: &TaskFilters) -> TaskSpecification {
    let mut spec = TaskSpecification::always();
    if let Some(uuid) = &filters.uuid {
        spec = spec.and(tasks_field_like("uuid", uuid));
    }
    if let Some(title) = &filters.title {
        spec = spec.and(tasks_field_like("title", title));
    }
    if let Some(statuses) = &filters.status {
        spec = spec.and(task_status_in(statuses));
    }
    if let Some(active) = filters.user_is_active {
        spec = spec.and(tasks_user_is_active(active));
    }
    if let Some(user_uuid) = &filters.user_uuid {
        spec = spec.and(tasks_user_uuid(user_uuid));
    }
    spec
}

/// Columns tasks may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortField {
    Id,
    Uuid,
    Title,
    Status,
}

impl TaskSortField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(TaskSortField::Id),
            "uuid" => Some(TaskSortField::Uuid),
            "title" => Some(TaskSortField::Title),
            "status" => Some(TaskSortField::Status),
            _ => None,
        }
    }
}

impl SortKey<Task> for TaskSortField {
    fn column(&self) -> &'static str {
        match self {
            TaskSortField::Id => "t.id",
            TaskSortField::Uuid => "t.uuid",
            TaskSortField::Title => "t.title",
            TaskSortField::Status => "t.status",
        }
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            TaskSortField::Id => a.id.cmp(&b.id),
            TaskSortField::Uuid => a.uuid.cmp(&b.uuid),
            TaskSortField::Title => a.title.cmp(&b.title),
            TaskSortField::Status => a.status.as_str().cmp(b.status.as_str()),
        }
    }
}
