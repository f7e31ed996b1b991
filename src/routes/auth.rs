use crate::{
    auth::{AuthResponse, LoginRequest, TokenService},
    error::AppError,
    models::UserRegister,
    services::UserService,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates an active `USER` account and returns an authentication token.
///
/// ## Responses:
/// - `201 Created`: `{token, uuid, role}`.
/// - `409 Conflict`: the username is taken.
/// - `422 Unprocessable Entity`: invalid e-mail or weak password.
#[post("/register")]
pub async fn register(
    users: web::Data<UserService>,
    tokens: web::Data<TokenService>,
    register_data: web::Json<UserRegister>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = users.register(register_data.into_inner()).await?;
    let token = tokens.generate_token(&user.uuid, user.role)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        uuid: user.uuid,
        role: user.role,
    }))
}

/// Login user
///
/// ## Responses:
/// - `200 OK`: `{token, uuid, role}`.
/// - `401 Unauthorized`: unknown user, wrong password or inactive account.
#[post("/login")]
pub async fn login(
    users: web::Data<UserService>,
    tokens: web::Data<TokenService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = users
        .authenticate(&login_data.username, &login_data.password)
        .await?;
    let token = tokens.generate_token(&user.uuid, user.role)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        uuid: user.uuid,
        role: user.role,
    }))
}
