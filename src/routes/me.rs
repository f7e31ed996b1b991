//! Endpoints acting on the caller's own account and tasks.
//!
//! The owner is always taken from the token, never from the request.

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskInsert, TaskUpdate, UserUpdate},
    routes::PageParams,
    services::{TaskService, UserService},
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use validator::Validate;

#[get("")]
pub async fn get_me(
    user: AuthenticatedUser,
    users: web::Data<UserService>,
) -> Result<impl Responder, AppError> {
    let me = users.find_by_uuid(&user.uuid).await?;
    Ok(HttpResponse::Ok().json(me))
}

/// Changes the caller's username or password. Role and active flag in the
/// body are ignored.
#[patch("")]
pub async fn update_me(
    user: AuthenticatedUser,
    users: web::Data<UserService>,
    user_data: web::Json<UserUpdate>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;
    let me = users.update_me(&user.uuid, user_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(me))
}

/// Deactivates the caller's account. Logging in fails afterwards; tokens
/// already issued stay valid until they expire.
#[delete("")]
pub async fn delete_me(
    user: AuthenticatedUser,
    users: web::Data<UserService>,
) -> Result<impl Responder, AppError> {
    users.deactivate(&user.uuid).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// The caller's tasks, one page at a time.
#[get("/tasks")]
pub async fn get_my_tasks(
    user: AuthenticatedUser,
    tasks: web::Data<TaskService>,
    params: web::Query<PageParams>,
) -> Result<impl Responder, AppError> {
    let page = tasks
        .get_for_user_paginated(&user.uuid, params.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/tasks")]
pub async fn create_my_task(
    user: AuthenticatedUser,
    tasks: web::Data<TaskService>,
    task_data: web::Json<TaskInsert>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = tasks
        .create_for_user(&user.uuid, task_data.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(task))
}

#[delete("/tasks")]
pub async fn delete_my_tasks(
    user: AuthenticatedUser,
    tasks: web::Data<TaskService>,
) -> Result<impl Responder, AppError> {
    tasks.delete_all_for_user(&user.uuid).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// ## Responses:
/// - `200 OK`: the task.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[get("/tasks/{task_uuid}")]
pub async fn get_my_task(
    user: AuthenticatedUser,
    tasks: web::Data<TaskService>,
    task_uuid: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task = tasks.find_for_user(&user.uuid, &task_uuid).await?;
    Ok(HttpResponse::Ok().json(task))
}

#[patch("/tasks/{task_uuid}")]
pub async fn update_my_task(
    user: AuthenticatedUser,
    tasks: web::Data<TaskService>,
    task_uuid: web::Path<String>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = tasks
        .update_for_user(&user.uuid, &task_uuid, task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/tasks/{task_uuid}")]
pub async fn delete_my_task(
    user: AuthenticatedUser,
    tasks: web::Data<TaskService>,
    task_uuid: web::Path<String>,
) -> Result<impl Responder, AppError> {
    tasks.delete_for_user(&user.uuid, &task_uuid).await?;
    Ok(HttpResponse::NoContent().finish())
}
