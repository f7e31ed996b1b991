use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::AppError;
use crate::models::user::Role;

/// Lifecycle state of a task. Stored and serialised as its upper-case name.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    #[default]
    Open,
    Ongoing,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "OPEN",
            TaskStatus::Ongoing => "ONGOING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(TaskStatus::Open),
            "ONGOING" => Ok(TaskStatus::Ongoing),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "FAILED" => Ok(TaskStatus::Failed),
            "CANCELLED" => Ok(TaskStatus::Cancelled),
            other => Err(AppError::BadRequest(format!("Unknown task status: {}", other))),
        }
    }
}

/// The owning user's columns, read through the `tasks -> users` join.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOwner {
    pub uuid: String,
    pub username: String,
    pub is_active: bool,
    pub role: Role,
}

/// A task row together with its owner.
///
/// `owner` is `None` when the join finds no user; predicates on owner
/// fields simply do not match such a row.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: i64,
    pub uuid: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: Option<TaskOwner>,
}

impl<'r> FromRow<'r, PgRow> for Task {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let owner_uuid: Option<String> = row.try_get("owner_uuid")?;
        let owner = match owner_uuid {
            Some(uuid) => {
                let role: String = row.try_get("owner_role")?;
                Some(TaskOwner {
                    uuid,
                    username: row.try_get("owner_username")?,
                    is_active: row.try_get("owner_is_active")?,
                    role: role.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
                })
            }
            None => None,
        };

        Ok(Self {
            id: row.try_get("id")?,
            uuid: row.try_get("uuid")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            status: status.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            owner,
        })
    }
}

/// Values needed to persist a new task for an existing user.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub user_id: i64,
}

/// Partial changes to an existing task; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

/// Payload for creating a task. `status` defaults to `OPEN`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInsert {
    #[validate(length(min = 2, message = "Title must contain at least 2 characters"))]
    pub title: String,
    #[validate(length(min = 2, message = "Description must contain at least 2 characters"))]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
}

/// Payload for a partial task update.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 2, message = "Title must contain at least 2 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 2, message = "Description must contain at least 2 characters"))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

impl From<TaskUpdate> for TaskChanges {
    fn from(update: TaskUpdate) -> Self {
        Self {
            title: update.title,
            description: update.description,
            status: update.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_insert_defaults_to_open() {
        let input: TaskInsert =
            serde_json::from_str(r#"{"title":"Write report","description":"Quarterly"}"#).unwrap();
        assert_eq!(input.status, TaskStatus::Open);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_task_insert_validation() {
        let invalid_input = TaskInsert {
            title: "x".to_string(),
            description: "Valid Description".to_string(),
            status: TaskStatus::Open,
        };
        assert!(invalid_input.validate().is_err());

        let invalid_input = TaskInsert {
            title: "Valid title".to_string(),
            description: "".to_string(),
            status: TaskStatus::Open,
        };
        assert!(invalid_input.validate().is_err());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&TaskStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
        assert_eq!("ONGOING".parse::<TaskStatus>().unwrap(), TaskStatus::Ongoing);
        assert!(serde_json::from_str::<TaskStatus>("\"DONE\"").is_err());
    }
}
