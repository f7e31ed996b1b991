#![doc = "The `taskrest` library crate."]
#![doc = ""]
#![doc = "Task and user management over HTTP: filter objects are composed into"]
#![doc = "specifications, run against a repository with pagination and returned"]
#![doc = "in a uniform paginated envelope. The binary (`main.rs`) wires it to PostgreSQL."]

pub mod auth;
pub mod config;
pub mod error;
pub mod filters;
pub mod mapper;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod routes;
pub mod services;
pub mod specification;

use std::sync::Arc;

use actix_web::web;

use crate::auth::{AuthMiddleware, PasswordHasher, TokenService};
use crate::repository::{TaskRepository, UserRepository};
use crate::services::{TaskService, UserService};

/// Shared handles registered as application data.
///
/// Build one per process and call [`AppState::configure`] inside the
/// `HttpServer` factory; clones share the same services.
#[derive(Clone)]
pub struct AppState {
    tasks: web::Data<TaskService>,
    users: web::Data<UserService>,
    tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
        tokens: TokenService,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            tasks: web::Data::new(TaskService::new(tasks, Arc::clone(&users))),
            users: web::Data::new(UserService::new(users, hasher)),
            tokens: Arc::new(tokens),
        }
    }

    pub fn tasks(&self) -> &TaskService {
        &self.tasks
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Registers the services, the public health check and the token-guarded `/api/v1` scope.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.tasks.clone())
            .app_data(self.users.clone())
            .app_data(web::Data::from(Arc::clone(&self.tokens)))
            .service(routes::health::health)
            .service(
                web::scope("/api/v1")
                    .wrap(AuthMiddleware::new(Arc::clone(&self.tokens)))
                    .configure(routes::config),
            );
    }
}
