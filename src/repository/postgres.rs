use async_trait::async_trait;
use log::debug;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::{TaskRepository, UserRepository};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskChanges, User, UserChanges};
use crate::pagination::{Page, Pageable, SortKey};
use crate::specification::task::{TaskSortField, TaskSpecification};
use crate::specification::user::{UserSortField, UserSpecification};

/// Every task query reads the owner through this join, so owner predicates
/// and the embedded owner view cost no extra round trip.
const TASK_SELECT: &str = "SELECT t.id, t.uuid, t.title, t.description, t.status, t.user_id, \
     t.created_at, t.updated_at, \
     u.uuid AS owner_uuid, u.username AS owner_username, \
     u.is_active AS owner_is_active, u.role AS owner_role \
     FROM tasks t LEFT JOIN users u ON u.id = t.user_id";

const TASK_COUNT: &str = "SELECT COUNT(*) FROM tasks t LEFT JOIN users u ON u.id = t.user_id";

const USER_SELECT: &str = "SELECT u.id, u.uuid, u.username, u.password_hash, u.is_active, \
     u.role, u.created_at, u.updated_at FROM users u";

const USER_COUNT: &str = "SELECT COUNT(*) FROM users u";

/// READ COMMITTED gives every statement its own snapshot; a page needs the
/// count and the window to share one.
const SNAPSHOT_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

/// PostgreSQL-backed repository for both entities.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Read-only transaction in which every statement sees the same snapshot.
    async fn begin_snapshot(&self) -> Result<Transaction<'static, Postgres>, AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(SNAPSHOT_ISOLATION).execute(&mut *tx).await?;
        Ok(tx)
    }

    async fn task_by_id(&self, id: i64) -> Result<Option<Task>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(TASK_SELECT);
        builder.push(" WHERE t.id = ").push_bind(id);
        Ok(builder
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?)
    }
}

/// Appends `ORDER BY <key> <dir>, <id> ASC LIMIT .. OFFSET ..`. The id tie-breaker
/// keeps windows stable when the sort key has duplicates.
fn push_window<T, K: SortKey<T>>(
    builder: &mut QueryBuilder<'_, Postgres>,
    pageable: &Pageable<K>,
    id_column: &str,
) {
    builder
        .push(format!(
            " ORDER BY {} {}, {} ASC",
            pageable.sort().column(),
            pageable.direction().as_sql(),
            id_column
        ))
        .push(" LIMIT ")
        .push_bind(i64::from(pageable.size()))
        .push(" OFFSET ")
        .push_bind(i64::try_from(pageable.offset()).unwrap_or(i64::MAX));
}

#[async_trait]
impl TaskRepository for PgRepository {
    async fn find_page(
        &self,
        spec: &TaskSpecification,
        pageable: &Pageable<TaskSortField>,
    ) -> Result<Page<Task>, AppError> {
        let mut tx = self.begin_snapshot().await?;

        let mut count = QueryBuilder::<Postgres>::new(TASK_COUNT);
        spec.push_where(&mut count);
        let (total,) = count
            .build_query_as::<(i64,)>()
            .fetch_one(&mut *tx)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(TASK_SELECT);
        spec.push_where(&mut select);
        push_window::<Task, _>(&mut select, pageable, "t.id");
        debug!("task page query: {}", select.sql());
        let items = select.build_query_as::<Task>().fetch_all(&mut *tx).await?;

        tx.commit().await?;
        Ok(Page::new(items, total.max(0) as u64, pageable))
    }

    async fn find_all(&self, spec: &TaskSpecification) -> Result<Vec<Task>, AppError> {
        let mut select = QueryBuilder::<Postgres>::new(TASK_SELECT);
        spec.push_where(&mut select);
        select.push(" ORDER BY t.id ASC");
        Ok(select.build_query_as::<Task>().fetch_all(&self.pool).await?)
    }

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Task>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(TASK_SELECT);
        builder.push(" WHERE t.uuid = ").push_bind(uuid.to_string());
        Ok(builder
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_title_and_user(
        &self,
        title: &str,
        user_id: i64,
    ) -> Result<Option<Task>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(TASK_SELECT);
        builder
            .push(" WHERE t.title = ")
            .push_bind(title.to_string())
            .push(" AND t.user_id = ")
            .push_bind(user_id);
        Ok(builder
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, task: NewTask) -> Result<Task, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO tasks (uuid, title, description, status, user_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.user_id)
        .fetch_one(&self.pool)
        .await?;

        self.task_by_id(id)
            .await?
            .ok_or_else(|| AppError::StorageFailure(format!("Inserted task {} vanished", id)))
    }

    async fn update(&self, id: i64, changes: TaskChanges) -> Result<Option<Task>, AppError> {
        let result = sqlx::query(
            "UPDATE tasks SET title = COALESCE($1, title), \
             description = COALESCE($2, description), \
             status = COALESCE($3, status), updated_at = NOW() \
             WHERE id = $4",
        )
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.task_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM tasks")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn find_page(
        &self,
        spec: &UserSpecification,
        pageable: &Pageable<UserSortField>,
    ) -> Result<Page<User>, AppError> {
        let mut tx = self.begin_snapshot().await?;

        let mut count = QueryBuilder::<Postgres>::new(USER_COUNT);
        spec.push_where(&mut count);
        let (total,) = count
            .build_query_as::<(i64,)>()
            .fetch_one(&mut *tx)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(USER_SELECT);
        spec.push_where(&mut select);
        push_window::<User, _>(&mut select, pageable, "u.id");
        debug!("user page query: {}", select.sql());
        let items = select.build_query_as::<User>().fetch_all(&mut *tx).await?;

        tx.commit().await?;
        Ok(Page::new(items, total.max(0) as u64, pageable))
    }

    async fn find_all(&self, spec: &UserSpecification) -> Result<Vec<User>, AppError> {
        let mut select = QueryBuilder::<Postgres>::new(USER_SELECT);
        spec.push_where(&mut select);
        select.push(" ORDER BY u.id ASC");
        Ok(select.build_query_as::<User>().fetch_all(&self.pool).await?)
    }

    async fn find_by_uuid(&self, uuid: &str) -> Result<Option<User>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(USER_SELECT);
        builder.push(" WHERE u.uuid = ").push_bind(uuid.to_string());
        Ok(builder
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(USER_SELECT);
        builder
            .push(" WHERE u.username = ")
            .push_bind(username.to_string());
        Ok(builder
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        Ok(sqlx::query_as::<_, User>(
            "INSERT INTO users AS u (uuid, username, password_hash, is_active, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING u.id, u.uuid, u.username, u.password_hash, u.is_active, u.role, \
             u.created_at, u.updated_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(
            "UPDATE users AS u SET username = COALESCE($1, u.username), \
             password_hash = COALESCE($2, u.password_hash), \
             is_active = COALESCE($3, u.is_active), \
             role = COALESCE($4, u.role), updated_at = NOW() \
             WHERE u.id = $5 \
             RETURNING u.id, u.uuid, u.username, u.password_hash, u.is_active, u.role, \
             u.created_at, u.updated_at",
        )
        .bind(changes.username)
        .bind(changes.password_hash)
        .bind(changes.is_active)
        .bind(changes.role.map(|r| r.as_str()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        // tasks.user_id cascades on delete.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_except(&self, keep_id: i64) -> Result<u64, AppError> {
        // tasks.user_id cascades on delete.
        let result = sqlx::query("DELETE FROM users WHERE id <> $1")
            .bind(keep_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
