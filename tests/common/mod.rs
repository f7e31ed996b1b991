#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use taskrest::auth::{PasswordHasher, TokenService};
use taskrest::models::{NewTask, NewUser, Role, Task, TaskStatus, User};
use taskrest::repository::{InMemoryRepository, TaskRepository, UserRepository};
use taskrest::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

/// App state over a fresh in-memory store, plus the store itself for seeding.
pub fn state() -> (AppState, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::new());
    let state = AppState::new(
        repo.clone(),
        repo.clone(),
        TokenService::new(TEST_SECRET, 1),
        PasswordHasher::new(4),
    );
    (state, repo)
}

pub async fn seed_user(repo: &InMemoryRepository, username: &str, active: bool, role: Role) -> User {
    UserRepository::insert(
        repo,
        NewUser {
            username: username.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            is_active: active,
            role,
        },
    )
    .await
    .expect("Failed to seed user")
}

pub async fn seed_task(repo: &InMemoryRepository, owner: &User, title: &str, status: TaskStatus) -> Task {
    TaskRepository::insert(
        repo,
        NewTask {
            title: title.to_string(),
            description: format!("Description of {}", title),
            status,
            user_id: owner.id,
        },
    )
    .await
    .expect("Failed to seed task")
}

pub fn bearer(state: &AppState, user: &User) -> (&'static str, String) {
    let token = state
        .tokens()
        .generate_token(&user.uuid, user.role)
        .expect("Failed to issue token");
    ("Authorization", format!("Bearer {}", token))
}

/// Status of a request, whether the app answered with a response or failed
/// inside middleware.
pub async fn status_of<S, B>(app: &S, req: Request) -> StatusCode
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    }
}
