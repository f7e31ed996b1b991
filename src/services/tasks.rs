use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::AppError;
use crate::filters::{PageRequest, TaskFilters};
use crate::mapper::TaskReadOnly;
use crate::models::{NewTask, Task, TaskInsert, TaskUpdate, User};
use crate::pagination::Paginated;
use crate::repository::{TaskRepository, UserRepository};
use crate::specification::task::from_filters;

/// Task use cases: filtered listings plus owner-scoped CRUD.
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { tasks, users }
    }

    /// Runs the filters as one composed specification and returns the requested window.
    ///
    /// `totalItems` counts the filtered population, so an out-of-range page
    /// comes back empty with the real totals.
    pub async fn get_filtered_paginated(
        &self,
        filters: &TaskFilters,
    ) -> Result<Paginated<TaskReadOnly>, AppError> {
        let spec = from_filters(filters);
        let pageable = filters.pageable();
        debug!("task page {:?} for {:?}", pageable, spec);

        let page = self.tasks.find_page(&spec, &pageable).await?;
        Ok(page.map(TaskReadOnly::from).into())
    }

    /// Same predicate as [`TaskService::get_filtered_paginated`] without windowing.
    pub async fn get_filtered(&self, filters: &TaskFilters) -> Result<Vec<TaskReadOnly>, AppError> {
        let spec = from_filters(filters);
        debug!("all tasks for {:?}", spec);

        let tasks = self.tasks.find_all(&spec).await?;
        Ok(tasks.into_iter().map(TaskReadOnly::from).collect())
    }

    pub async fn get_paginated(&self, paging: PageRequest) -> Result<Paginated<TaskReadOnly>, AppError> {
        self.get_filtered_paginated(&TaskFilters {
            paging,
            ..Default::default()
        })
        .await
    }

    /// Paginated tasks of one user. The user must exist.
    pub async fn get_for_user_paginated(
        &self,
        user_uuid: &str,
        paging: PageRequest,
    ) -> Result<Paginated<TaskReadOnly>, AppError> {
        let owner = self.owner(user_uuid).await?;
        self.get_filtered_paginated(&TaskFilters::for_user(owner.uuid, paging))
            .await
    }

    pub async fn find_by_uuid(&self, uuid: &str) -> Result<TaskReadOnly, AppError> {
        self.task(uuid).await.map(TaskReadOnly::from)
    }

    /// A task of `user_uuid`. Tasks owned by someone else are reported as not found.
    pub async fn find_for_user(
        &self,
        user_uuid: &str,
        task_uuid: &str,
    ) -> Result<TaskReadOnly, AppError> {
        let owner = self.owner(user_uuid).await?;
        self.owned_task(&owner, task_uuid)
            .await
            .map(TaskReadOnly::from)
    }

    /// Creates a task for `user_uuid`. Titles are unique per owner.
    pub async fn create_for_user(
        &self,
        user_uuid: &str,
        input: TaskInsert,
    ) -> Result<TaskReadOnly, AppError> {
        let owner = self.owner(user_uuid).await?;
        if self
            .tasks
            .find_by_title_and_user(&input.title, owner.id)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyExists(format!(
                "Task with title '{}' already exists",
                input.title
            )));
        }

        let task = self
            .tasks
            .insert(NewTask {
                title: input.title,
                description: input.description,
                status: input.status,
                user_id: owner.id,
            })
            .await?;
        info!("created task {} for user {}", task.uuid, owner.uuid);
        Ok(TaskReadOnly::from(task))
    }

    /// Partially updates a task of `user_uuid`. A new title must not clash
    /// with another task of the same owner.
    pub async fn update_for_user(
        &self,
        user_uuid: &str,
        task_uuid: &str,
        input: TaskUpdate,
    ) -> Result<TaskReadOnly, AppError> {
        let owner = self.owner(user_uuid).await?;
        let task = self.owned_task(&owner, task_uuid).await?;

        if let Some(title) = &input.title {
            let clash = self.tasks.find_by_title_and_user(title, owner.id).await?;
            if clash.is_some_and(|other| other.id != task.id) {
                return Err(AppError::AlreadyExists(format!(
                    "Task with title '{}' already exists",
                    title
                )));
            }
        }

        self.tasks
            .update(task.id, input.into())
            .await?
            .map(TaskReadOnly::from)
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    pub async fn delete_by_uuid(&self, uuid: &str) -> Result<(), AppError> {
        let task = self.task(uuid).await?;
        self.remove(task).await
    }

    pub async fn delete_for_user(&self, user_uuid: &str, task_uuid: &str) -> Result<(), AppError> {
        let owner = self.owner(user_uuid).await?;
        let task = self.owned_task(&owner, task_uuid).await?;
        self.remove(task).await
    }

    pub async fn delete_all(&self) -> Result<u64, AppError> {
        let deleted = self.tasks.delete_all().await?;
        info!("deleted all {} tasks", deleted);
        Ok(deleted)
    }

    pub async fn delete_all_for_user(&self, user_uuid: &str) -> Result<u64, AppError> {
        let owner = self.owner(user_uuid).await?;
        let deleted = self.tasks.delete_by_user(owner.id).await?;
        info!("deleted {} tasks of user {}", deleted, owner.uuid);
        Ok(deleted)
    }

    async fn owner(&self, user_uuid: &str) -> Result<User, AppError> {
        self.users.find_by_uuid(user_uuid).await?.ok_or_else(|| {
            warn!("user {} not found", user_uuid);
            AppError::NotFound("User not found".into())
        })
    }

    async fn task(&self, uuid: &str) -> Result<Task, AppError> {
        self.tasks.find_by_uuid(uuid).await?.ok_or_else(|| {
            warn!("task {} not found", uuid);
            AppError::NotFound("Task not found".into())
        })
    }

    async fn owned_task(&self, owner: &User, task_uuid: &str) -> Result<Task, AppError> {
        match self.tasks.find_by_uuid(task_uuid).await? {
            Some(task) if task.user_id == owner.id => Ok(task),
            _ => {
                warn!("task {} not found for user {}", task_uuid, owner.uuid);
                Err(AppError::NotFound("Task not found".into()))
            }
        }
    }

    async fn remove(&self, task: Task) -> Result<(), AppError> {
        if self.tasks.delete(task.id).await? {
            info!("deleted task {}", task.uuid);
            Ok(())
        } else {
            Err(AppError::NotFound("Task not found".into()))
        }
    }
}
