pub mod auth;
pub mod health;
pub mod me;
pub mod tasks;
pub mod users;

use actix_web::web;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::AppError;
use crate::filters::PageRequest;

/// Routes mounted under `/api/v1`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::get_filtered_tasks)
            .service(tasks::get_all_filtered_tasks)
            .service(tasks::delete_all_tasks)
            .service(tasks::get_task)
            .service(tasks::delete_task),
    )
    .service(
        web::scope("/users")
            .service(users::get_users)
            .service(users::create_user)
            .service(users::delete_all_users)
            .service(users::get_filtered_users)
            .service(users::get_all_filtered_users)
            .service(users::get_user_tasks)
            .service(users::create_user_task)
            .service(users::get_user_task)
            .service(users::update_user_task)
            .service(users::delete_user_task)
            .service(users::get_user)
            .service(users::update_user)
            .service(users::delete_user),
    )
    .service(
        web::scope("/me")
            .service(me::get_me)
            .service(me::update_me)
            .service(me::delete_me)
            .service(me::get_my_tasks)
            .service(me::create_my_task)
            .service(me::delete_my_tasks)
            .service(me::get_my_task)
            .service(me::update_my_task)
            .service(me::delete_my_task),
    );
}

/// `?page=&size=` on the plain listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl From<PageParams> for PageRequest {
    fn from(params: PageParams) -> Self {
        PageRequest::new(params.page, params.size)
    }
}

/// Decodes an optional JSON filter body. An empty body means "no filters";
/// anything else must be well-formed, including the enum values inside it.
pub(crate) fn filters_from_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid filters: {}", e)))
}
