use crate::{
    auth::AdminUser,
    error::AppError,
    filters::UserFilters,
    models::{TaskInsert, TaskUpdate, UserInsert, UserUpdate},
    routes::{filters_from_body, PageParams},
    services::{TaskService, UserService},
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use log::info;
use validator::Validate;

#[get("")]
pub async fn get_users(
    _admin: AdminUser,
    users: web::Data<UserService>,
    params: web::Query<PageParams>,
) -> Result<impl Responder, AppError> {
    let page = users.get_paginated(params.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Deletes every user except the calling admin, with their tasks.
#[delete("")]
pub async fn delete_all_users(
    admin: AdminUser,
    users: web::Data<UserService>,
) -> Result<impl Responder, AppError> {
    let removed = users.delete_all(&admin.0.uuid).await?;
    info!("admin {} deleted {} users", admin.0.uuid, removed);
    Ok(HttpResponse::NoContent().finish())
}

/// Creates a user with an explicit role and active flag.
///
/// ## Responses:
/// - `201 Created`: the new `UserReadOnly`.
/// - `409 Conflict`: the username is taken.
/// - `422 Unprocessable Entity`: invalid e-mail or weak password.
#[post("")]
pub async fn create_user(
    admin: AdminUser,
    users: web::Data<UserService>,
    user_data: web::Json<UserInsert>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;
    let user = users.create(user_data.into_inner()).await?;
    info!("admin {} created user {}", admin.0.uuid, user.uuid);
    Ok(HttpResponse::Created().json(user))
}

/// Lists users matching an optional JSON `UserFilters` body.
#[post("/filtered")]
pub async fn get_filtered_users(
    _admin: AdminUser,
    users: web::Data<UserService>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let filters: UserFilters = filters_from_body(&body)?;
    let page = users.get_filtered_paginated(&filters).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/filtered/all")]
pub async fn get_all_filtered_users(
    _admin: AdminUser,
    users: web::Data<UserService>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let filters: UserFilters = filters_from_body(&body)?;
    let all = users.get_filtered(&filters).await?;
    Ok(HttpResponse::Ok().json(all))
}

/// Paginated tasks owned by `user_uuid`.
#[get("/{user_uuid}/tasks")]
pub async fn get_user_tasks(
    _admin: AdminUser,
    tasks: web::Data<TaskService>,
    user_uuid: web::Path<String>,
    params: web::Query<PageParams>,
) -> Result<impl Responder, AppError> {
    let page = tasks
        .get_for_user_paginated(&user_uuid, params.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/{user_uuid}/tasks")]
pub async fn create_user_task(
    _admin: AdminUser,
    tasks: web::Data<TaskService>,
    user_uuid: web::Path<String>,
    task_data: web::Json<TaskInsert>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = tasks
        .create_for_user(&user_uuid, task_data.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(task))
}

/// ## Responses:
/// - `200 OK`: the task.
/// - `404 Not Found`: unknown user, unknown task, or the task has another owner.
#[get("/{user_uuid}/tasks/{task_uuid}")]
pub async fn get_user_task(
    _admin: AdminUser,
    tasks: web::Data<TaskService>,
    path: web::Path<(String, String)>,
) -> Result<impl Responder, AppError> {
    let (user_uuid, task_uuid) = path.into_inner();
    let task = tasks.find_for_user(&user_uuid, &task_uuid).await?;
    Ok(HttpResponse::Ok().json(task))
}

#[patch("/{user_uuid}/tasks/{task_uuid}")]
pub async fn update_user_task(
    _admin: AdminUser,
    tasks: web::Data<TaskService>,
    path: web::Path<(String, String)>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let (user_uuid, task_uuid) = path.into_inner();
    let task = tasks
        .update_for_user(&user_uuid, &task_uuid, task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{user_uuid}/tasks/{task_uuid}")]
pub async fn delete_user_task(
    admin: AdminUser,
    tasks: web::Data<TaskService>,
    path: web::Path<(String, String)>,
) -> Result<impl Responder, AppError> {
    let (user_uuid, task_uuid) = path.into_inner();
    tasks.delete_for_user(&user_uuid, &task_uuid).await?;
    info!("admin {} deleted task {} of {}", admin.0.uuid, task_uuid, user_uuid);
    Ok(HttpResponse::NoContent().finish())
}

#[get("/{uuid}")]
pub async fn get_user(
    _admin: AdminUser,
    users: web::Data<UserService>,
    uuid: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let user = users.find_by_uuid(&uuid).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[patch("/{uuid}")]
pub async fn update_user(
    _admin: AdminUser,
    users: web::Data<UserService>,
    uuid: web::Path<String>,
    user_data: web::Json<UserUpdate>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;
    let user = users.update(&uuid, user_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Deletes the user together with all of its tasks.
#[delete("/{uuid}")]
pub async fn delete_user(
    admin: AdminUser,
    users: web::Data<UserService>,
    uuid: web::Path<String>,
) -> Result<impl Responder, AppError> {
    users.delete_by_uuid(&uuid).await?;
    info!("admin {} deleted user {}", admin.0.uuid, uuid);
    Ok(HttpResponse::NoContent().finish())
}
