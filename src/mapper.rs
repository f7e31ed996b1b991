//! Caller-facing read-only views of the entities.
//!
//! Views carry the public `uuid` only; storage ids stay inside the process.

use serde::{Deserialize, Serialize};

use crate::models::{Role, Task, TaskOwner, TaskStatus, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReadOnly {
    pub uuid: String,
    pub username: String,
    pub is_active: bool,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReadOnly {
    pub uuid: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub user: Option<UserReadOnly>,
}

impl From<User> for UserReadOnly {
    fn from(user: User) -> Self {
        Self {
            uuid: user.uuid,
            username: user.username,
            is_active: user.is_active,
            role: user.role,
        }
    }
}

impl From<TaskOwner> for UserReadOnly {
    fn from(owner: TaskOwner) -> Self {
        Self {
            uuid: owner.uuid,
            username: owner.username,
            is_active: owner.is_active,
            role: owner.role,
        }
    }
}

impl From<Task> for TaskReadOnly {
    fn from(task: Task) -> Self {
        Self {
            uuid: task.uuid,
            title: task.title,
            description: task.description,
            status: task.status,
            user: task.owner.map(UserReadOnly::from),
        }
    }
}
