use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TaskRepository, UserRepository};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskChanges, TaskOwner, User, UserChanges};
use crate::pagination::{paginate, Page, Pageable};
use crate::specification::task::{TaskSortField, TaskSpecification};
use crate::specification::user::{UserSortField, UserSpecification};

#[derive(Default)]
struct State {
    users: Vec<User>,
    // Stored without the owner; the join happens on read.
    tasks: Vec<Task>,
    next_user_id: i64,
    next_task_id: i64,
}

impl State {
    fn owner_of(&self, user_id: i64) -> Option<TaskOwner> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| TaskOwner {
                uuid: u.uuid.clone(),
                username: u.username.clone(),
                is_active: u.is_active,
                role: u.role,
            })
    }

    fn joined_tasks(&self) -> impl Iterator<Item = Task> + '_ {
        self.tasks.iter().map(|task| Task {
            owner: self.owner_of(task.user_id),
            ..task.clone()
        })
    }
}

/// Process-local store implementing both repositories. Rows are kept in id
/// order; each call takes the lock once, so a page and its total are read
/// from the same snapshot.
#[derive(Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryRepository {
    async fn find_page(
        &self,
        spec: &TaskSpecification,
        pageable: &Pageable<TaskSortField>,
    ) -> Result<Page<Task>, AppError> {
        let state = self.state.read().await;
        let matching: Vec<Task> = state.joined_tasks().filter(|t| spec.matches(t)).collect();
        Ok(paginate(matching, pageable))
    }

    async fn find_all(&self, spec: &TaskSpecification) -> Result<Vec<Task>, AppError> {
        let state = self.state.read().await;
        Ok(state.joined_tasks().filter(|t| spec.matches(t)).collect())
    }

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Task>, AppError> {
        let state = self.state.read().await;
        let found = state.joined_tasks().find(|t| t.uuid == uuid);
        Ok(found)
    }

    async fn find_by_title_and_user(
        &self,
        title: &str,
        user_id: i64,
    ) -> Result<Option<Task>, AppError> {
        let state = self.state.read().await;
        let found = state
            .joined_tasks()
            .find(|t| t.title == title && t.user_id == user_id);
        Ok(found)
    }

    async fn insert(&self, task: NewTask) -> Result<Task, AppError> {
        let mut state = self.state.write().await;
        if !state.users.iter().any(|u| u.id == task.user_id) {
            return Err(AppError::StorageFailure(format!(
                "tasks.user_id references unknown user {}",
                task.user_id
            )));
        }

        state.next_task_id += 1;
        let now = Utc::now();
        let stored = Task {
            id: state.next_task_id,
            uuid: Uuid::new_v4().to_string(),
            title: task.title,
            description: task.description,
            status: task.status,
            user_id: task.user_id,
            created_at: now,
            updated_at: now,
            owner: None,
        };
        state.tasks.push(stored.clone());
        Ok(Task {
            owner: state.owner_of(stored.user_id),
            ..stored
        })
    }

    async fn update(&self, id: i64, changes: TaskChanges) -> Result<Option<Task>, AppError> {
        let mut state = self.state.write().await;
        let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        task.updated_at = Utc::now();

        let updated = task.clone();
        Ok(Some(Task {
            owner: state.owner_of(updated.user_id),
            ..updated
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        Ok(state.tasks.len() < before)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let removed = state.tasks.len() as u64;
        state.tasks.clear();
        Ok(removed)
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.user_id != user_id);
        Ok((before - state.tasks.len()) as u64)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn find_page(
        &self,
        spec: &UserSpecification,
        pageable: &Pageable<UserSortField>,
    ) -> Result<Page<User>, AppError> {
        let state = self.state.read().await;
        let matching: Vec<User> = state
            .users
            .iter()
            .filter(|u| spec.matches(u))
            .cloned()
            .collect();
        Ok(paginate(matching, pageable))
    }

    async fn find_all(&self, spec: &UserSpecification) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| spec.matches(u))
            .cloned()
            .collect())
    }

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.uuid == uuid).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::StorageFailure(format!(
                "users.username must be unique: {}",
                user.username
            )));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let stored = User {
            id: state.next_user_id,
            uuid: Uuid::new_v4().to_string(),
            username: user.username,
            password_hash: user.password_hash,
            is_active: user.is_active,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        state.users.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Ok(false);
        }
        state.tasks.retain(|t| t.user_id != id);
        Ok(true)
    }

    async fn delete_all_except(&self, keep_id: i64) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let before = state.users.len();
        state.users.retain(|u| u.id == keep_id);
        state.tasks.retain(|t| t.user_id == keep_id);
        Ok((before - state.users.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::TaskFilters;
    use crate::models::{Role, TaskStatus};
    use crate::pagination::SortDirection;
    use crate::specification::task::from_filters;

    async fn seed_user(repo: &InMemoryRepository, username: &str, active: bool) -> User {
        UserRepository::insert(
            repo,
            NewUser {
                username: username.to_string(),
                password_hash: "hash".to_string(),
                is_active: active,
                role: Role::User,
            },
        )
        .await
        .unwrap()
    }

    #[actix_rt::test]
    async fn test_task_reads_carry_current_owner() {
        let repo = InMemoryRepository::new();
        let owner = seed_user(&repo, "owner@example.com", true).await;
        let task = TaskRepository::insert(
            &repo,
            NewTask {
                title: "Title".to_string(),
                description: "Description".to_string(),
                status: TaskStatus::Open,
                user_id: owner.id,
            },
        )
        .await
        .unwrap();
        assert_eq!(task.owner.as_ref().unwrap().uuid, owner.uuid);

        UserRepository::update(
            &repo,
            owner.id,
            UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let spec = from_filters(&TaskFilters {
            user_is_active: Some(false),
            ..Default::default()
        });
        let found = TaskRepository::find_all(&repo, &spec).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(!found[0].owner.as_ref().unwrap().is_active);
    }

    #[actix_rt::test]
    async fn test_deleting_user_removes_its_tasks() {
        let repo = InMemoryRepository::new();
        let owner = seed_user(&repo, "gone@example.com", true).await;
        TaskRepository::insert(
            &repo,
            NewTask {
                title: "Doomed".to_string(),
                description: "Description".to_string(),
                status: TaskStatus::Open,
                user_id: owner.id,
            },
        )
        .await
        .unwrap();

        assert!(UserRepository::delete(&repo, owner.id).await.unwrap());

        let page = TaskRepository::find_page(
            &repo,
            &TaskSpecification::always(),
            &Pageable::of(0, 10, TaskSortField::Id, SortDirection::Asc),
        )
        .await
        .unwrap();
        assert_eq!(page.total, 0);
    }

    #[actix_rt::test]
    async fn test_insert_for_unknown_user_fails() {
        let repo = InMemoryRepository::new();
        let result = TaskRepository::insert(
            &repo,
            NewTask {
                title: "Orphan".to_string(),
                description: "Description".to_string(),
                status: TaskStatus::Open,
                user_id: 42,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::StorageFailure(_))));
    }

    #[actix_rt::test]
    async fn test_lookups_by_uuid_and_title() {
        let repo = InMemoryRepository::new();
        let owner = seed_user(&repo, "lookup@example.com", true).await;
        let other = seed_user(&repo, "other@example.com", true).await;
        let task = TaskRepository::insert(
            &repo,
            NewTask {
                title: "Find me".to_string(),
                description: "Description".to_string(),
                status: TaskStatus::Open,
                user_id: owner.id,
            },
        )
        .await
        .unwrap();

        let by_uuid = TaskRepository::find_by_uuid(&repo, &task.uuid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_uuid.id, task.id);
        assert_eq!(by_uuid.owner.unwrap().uuid, owner.uuid);
        assert!(TaskRepository::find_by_uuid(&repo, "missing")
            .await
            .unwrap()
            .is_none());

        let by_title = TaskRepository::find_by_title_and_user(&repo, "Find me", owner.id)
            .await
            .unwrap();
        assert_eq!(by_title.map(|t| t.id), Some(task.id));
        assert!(TaskRepository::find_by_title_and_user(&repo, "Find me", other.id)
            .await
            .unwrap()
            .is_none());
    }

    #[actix_rt::test]
    async fn test_delete_all_except_keeps_one_user_and_its_tasks() {
        let repo = InMemoryRepository::new();
        let keeper = seed_user(&repo, "keeper@example.com", true).await;
        let first = seed_user(&repo, "first@example.com", true).await;
        seed_user(&repo, "second@example.com", false).await;
        for (title, owner) in [("Kept", &keeper), ("Dropped", &first)] {
            TaskRepository::insert(
                &repo,
                NewTask {
                    title: title.to_string(),
                    description: "Description".to_string(),
                    status: TaskStatus::Open,
                    user_id: owner.id,
                },
            )
            .await
            .unwrap();
        }

        let removed = UserRepository::delete_all_except(&repo, keeper.id).await.unwrap();
        assert_eq!(removed, 2);

        let users = UserRepository::find_all(&repo, &UserSpecification::always())
            .await
            .unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].uuid, keeper.uuid);
        let tasks = TaskRepository::find_all(&repo, &TaskSpecification::always())
            .await
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Kept");
    }
}
