//! Storage access.
//!
//! The services only talk to the [`TaskRepository`] and [`UserRepository`]
//! traits. [`PgRepository`] runs against PostgreSQL; [`InMemoryRepository`]
//! keeps everything in process and evaluates the same specifications
//! directly against the records.
//!
//! Failures are reported as `AppError::StorageFailure` and never retried.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskChanges, User, UserChanges};
use crate::pagination::{Page, Pageable};
use crate::specification::task::{TaskSortField, TaskSpecification};
use crate::specification::user::{UserSortField, UserSpecification};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Filtered, ordered window plus the size of the whole filtered population.
    async fn find_page(
        &self,
        spec: &TaskSpecification,
        pageable: &Pageable<TaskSortField>,
    ) -> Result<Page<Task>, AppError>;

    /// Every matching task, ordered by id.
    async fn find_all(&self, spec: &TaskSpecification) -> Result<Vec<Task>, AppError>;

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Task>, AppError>;

    async fn find_by_title_and_user(
        &self,
        title: &str,
        user_id: i64,
    ) -> Result<Option<Task>, AppError>;

    async fn insert(&self, task: NewTask) -> Result<Task, AppError>;

    /// Applies `changes` and returns the updated task, or `None` if `id` is unknown.
    async fn update(&self, id: i64, changes: TaskChanges) -> Result<Option<Task>, AppError>;

    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    async fn delete_all(&self) -> Result<u64, AppError>;

    async fn delete_by_user(&self, user_id: i64) -> Result<u64, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_page(
        &self,
        spec: &UserSpecification,
        pageable: &Pageable<UserSortField>,
    ) -> Result<Page<User>, AppError>;

    async fn find_all(&self, spec: &UserSpecification) -> Result<Vec<User>, AppError>;

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<User>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn insert(&self, user: NewUser) -> Result<User, AppError>;

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError>;

    /// Deletes the user together with the tasks it owns.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Deletes every user but `keep_id`, and their tasks. Returns how many went.
    async fn delete_all_except(&self, keep_id: i64) -> Result<u64, AppError>;
}
