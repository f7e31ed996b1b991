use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use log::warn;
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;
use crate::models::Role;

/// The caller identified by the bearer token.
///
/// Only usable on routes wrapped by `AuthMiddleware`, which puts the
/// verified [`Claims`] into the request extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub uuid: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticated(req).map_err(Into::into))
    }
}

/// An [`AuthenticatedUser`] whose role is `ADMIN`; anyone else gets 403.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = authenticated(req).and_then(|user| {
            if user.is_admin() {
                Ok(AdminUser(user))
            } else {
                warn!("user {} denied admin access to {}", user.uuid, req.path());
                Err(AppError::Forbidden("Admin role required".into()))
            }
        });
        ready(result.map_err(Into::into))
    }
}

fn authenticated(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    req.extensions()
        .get::<Claims>()
        .map(|claims| AuthenticatedUser {
            uuid: claims.sub.clone(),
            role: claims.role,
        })
        .ok_or_else(|| {
            AppError::Unauthorized(
                "Claims not found in request. Ensure AuthMiddleware is active.".to_string(),
            )
        })
}
