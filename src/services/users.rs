use std::sync::Arc;

use log::{debug, info, warn};

use crate::auth::PasswordHasher;
use crate::error::AppError;
use crate::filters::{PageRequest, UserFilters};
use crate::mapper::UserReadOnly;
use crate::models::{NewUser, Role, User, UserChanges, UserInsert, UserRegister, UserUpdate};
use crate::pagination::Paginated;
use crate::repository::UserRepository;
use crate::specification::user::from_filters;

pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    pub async fn get_filtered_paginated(
        &self,
        filters: &UserFilters,
    ) -> Result<Paginated<UserReadOnly>, AppError> {
        let spec = from_filters(filters);
        let pageable = filters.pageable();
        debug!("user page {:?} for {:?}", pageable, spec);

        let page = self.users.find_page(&spec, &pageable).await?;
        Ok(page.map(UserReadOnly::from).into())
    }

    pub async fn get_filtered(&self, filters: &UserFilters) -> Result<Vec<UserReadOnly>, AppError> {
        let spec = from_filters(filters);
        debug!("all users for {:?}", spec);

        let users = self.users.find_all(&spec).await?;
        Ok(users.into_iter().map(UserReadOnly::from).collect())
    }

    pub async fn get_paginated(&self, paging: PageRequest) -> Result<Paginated<UserReadOnly>, AppError> {
        self.get_filtered_paginated(&UserFilters {
            paging,
            ..Default::default()
        })
        .await
    }

    pub async fn find_by_uuid(&self, uuid: &str) -> Result<UserReadOnly, AppError> {
        self.user(uuid).await.map(UserReadOnly::from)
    }

    /// Self-service sign-up: always an active `USER`.
    pub async fn register(&self, input: UserRegister) -> Result<UserReadOnly, AppError> {
        self.insert(input.username, &input.password, true, Role::User)
            .await
    }

    pub async fn create(&self, input: UserInsert) -> Result<UserReadOnly, AppError> {
        self.insert(input.username, &input.password, input.is_active, input.role)
            .await
    }

    /// Applies the present fields only. A new password is re-hashed and a new
    /// username must still be free.
    pub async fn update(&self, uuid: &str, input: UserUpdate) -> Result<UserReadOnly, AppError> {
        let user = self.user(uuid).await?;

        if let Some(username) = &input.username {
            if let Some(other) = self.users.find_by_username(username).await? {
                if other.id != user.id {
                    return Err(AppError::AlreadyExists(format!(
                        "User '{}' already exists",
                        username
                    )));
                }
            }
        }

        let password_hash = match &input.password {
            Some(password) => Some(self.hasher.hash_password(password)?),
            None => None,
        };
        let changes = UserChanges {
            username: input.username,
            password_hash,
            is_active: input.is_active,
            role: input.role,
        };

        self.users
            .update(user.id, changes)
            .await?
            .map(UserReadOnly::from)
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Self-service variant of [`UserService::update`]: only username and
    /// password can change, role and active flag stay as they are.
    pub async fn update_me(&self, uuid: &str, input: UserUpdate) -> Result<UserReadOnly, AppError> {
        self.update(
            uuid,
            UserUpdate {
                is_active: None,
                role: None,
                ..input
            },
        )
        .await
    }

    /// Closes the caller's own account. The row and its tasks are kept, but
    /// the user can no longer log in.
    pub async fn deactivate(&self, uuid: &str) -> Result<(), AppError> {
        let user = self.user(uuid).await?;
        let changes = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };
        if self.users.update(user.id, changes).await?.is_none() {
            return Err(AppError::NotFound("User not found".into()));
        }
        info!("deactivated user {}", user.uuid);
        Ok(())
    }

    /// Deletes the user and every task it owns.
    pub async fn delete_by_uuid(&self, uuid: &str) -> Result<(), AppError> {
        let user = self.user(uuid).await?;
        if self.users.delete(user.id).await? {
            info!("deleted user {}", user.uuid);
            Ok(())
        } else {
            Err(AppError::NotFound("User not found".into()))
        }
    }

    /// Deletes every user except `keep_uuid`, cascading to their tasks.
    pub async fn delete_all(&self, keep_uuid: &str) -> Result<u64, AppError> {
        let keep = self.user(keep_uuid).await?;
        let removed = self.users.delete_all_except(keep.id).await?;
        info!("deleted {} users, kept {}", removed, keep.uuid);
        Ok(removed)
    }

    /// Checks credentials. Unknown users, inactive users and wrong passwords
    /// are all `Unauthorized`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserReadOnly, AppError> {
        let user = match self.users.find_by_username(username).await? {
            Some(user) => user,
            None => {
                warn!("login attempt for unknown user {}", username);
                return Err(AppError::Unauthorized("Invalid credentials".into()));
            }
        };

        if !self.hasher.verify_password(password, &user.password_hash)? {
            warn!("wrong password for user {}", user.uuid);
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
        if !user.is_active {
            warn!("login attempt for inactive user {}", user.uuid);
            return Err(AppError::Unauthorized("User is not active".into()));
        }

        Ok(UserReadOnly::from(user))
    }

    async fn insert(
        &self,
        username: String,
        password: &str,
        is_active: bool,
        role: Role,
    ) -> Result<UserReadOnly, AppError> {
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "User '{}' already exists",
                username
            )));
        }

        let user = self
            .users
            .insert(NewUser {
                username,
                password_hash: self.hasher.hash_password(password)?,
                is_active,
                role,
            })
            .await?;
        info!("created user {} with role {}", user.uuid, user.role);
        Ok(UserReadOnly::from(user))
    }

    async fn user(&self, uuid: &str) -> Result<User, AppError> {
        self.users.find_by_uuid(uuid).await?.ok_or_else(|| {
            warn!("user {} not found", uuid);
            AppError::NotFound("User not found".into())
        })
    }
}
