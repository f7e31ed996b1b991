use crate::{
    auth::AdminUser,
    error::AppError,
    filters::TaskFilters,
    routes::{filters_from_body, PageParams},
    services::TaskService,
};
use actix_web::{delete, get, post, web, HttpResponse, Responder};

/// Lists every task, one page at a time.
///
/// ## Query Parameters:
/// - `page` (optional): zero-based page index, default 0.
/// - `size` (optional): page size, default 10.
///
/// ## Responses:
/// - `200 OK`: a paginated envelope of `TaskReadOnly`.
/// - `403 Forbidden`: the caller is not an admin.
#[get("")]
pub async fn get_tasks(
    _admin: AdminUser,
    tasks: web::Data<TaskService>,
    params: web::Query<PageParams>,
) -> Result<impl Responder, AppError> {
    let page = tasks.get_paginated(params.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Lists tasks matching an optional JSON `TaskFilters` body.
///
/// An absent body matches everything. Missing paging fields default to
/// page 0, size 10, sorted by `id` ascending.
#[post("/filtered")]
pub async fn get_filtered_tasks(
    _admin: AdminUser,
    tasks: web::Data<TaskService>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let filters: TaskFilters = filters_from_body(&body)?;
    let page = tasks.get_filtered_paginated(&filters).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Same filters as `/filtered`, returned as a plain array without paging.
#[post("/filtered/all")]
pub async fn get_all_filtered_tasks(
    _admin: AdminUser,
    tasks: web::Data<TaskService>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let filters: TaskFilters = filters_from_body(&body)?;
    let all = tasks.get_filtered(&filters).await?;
    Ok(HttpResponse::Ok().json(all))
}

#[delete("")]
pub async fn delete_all_tasks(
    _admin: AdminUser,
    tasks: web::Data<TaskService>,
) -> Result<impl Responder, AppError> {
    tasks.delete_all().await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/{uuid}")]
pub async fn get_task(
    _admin: AdminUser,
    tasks: web::Data<TaskService>,
    uuid: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task = tasks.find_by_uuid(&uuid).await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{uuid}")]
pub async fn delete_task(
    _admin: AdminUser,
    tasks: web::Data<TaskService>,
    uuid: web::Path<String>,
) -> Result<impl Responder, AppError> {
    tasks.delete_by_uuid(&uuid).await?;
    Ok(HttpResponse::NoContent().finish())
}
