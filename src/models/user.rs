use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::error::AppError;

lazy_static! {
    static ref LOWERCASE: Regex = Regex::new(r"[a-z]").unwrap();
    static ref UPPERCASE: Regex = Regex::new(r"[A-Z]").unwrap();
    static ref DIGIT: Regex = Regex::new(r"[0-9]").unwrap();
    static ref SPECIAL: Regex = Regex::new(r"[@#$%!^&*]").unwrap();
}

/// Access level of a user. Stored and serialised as its upper-case name.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(AppError::BadRequest(format!("Unknown role: {}", other))),
        }
    }
}

/// A user as stored in the `users` table.
///
/// `id` is the storage-assigned key and never leaves the process;
/// `uuid` is the identifier callers see.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub uuid: String,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(Self {
            id: row.try_get("id")?,
            uuid: row.try_get("uuid")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            is_active: row.try_get("is_active")?,
            role: role.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Values needed to persist a new user. The store assigns `id`, `uuid` and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub role: Role,
}

/// Partial changes to an existing user; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub role: Option<Role>,
}

/// Self-service registration payload. New accounts are always active `USER`s.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UserRegister {
    /// Login name; must be an e-mail address.
    #[validate(email(message = "Invalid format of username"))]
    pub username: String,
    #[validate(custom = "validate_password_strength")]
    pub password: String,
}

/// Admin payload for creating a user with an explicit role and state.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserInsert {
    #[validate(email(message = "Invalid format of username"))]
    pub username: String,
    #[validate(custom = "validate_password_strength")]
    pub password: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default = "default_role")]
    pub role: Role,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[validate(email(message = "Invalid format of username"))]
    pub username: Option<String>,
    #[validate(custom = "validate_password_strength")]
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub role: Option<Role>,
}

fn default_active() -> bool {
    true
}

fn default_role() -> Role {
    Role::User
}

/// At least 8 characters with a lowercase letter, an uppercase letter,
/// a digit and one of `@#$%!^&*`.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let strong = password.chars().count() >= 8
        && LOWERCASE.is_match(password)
        && UPPERCASE.is_match(password)
        && DIGIT.is_match(password)
        && SPECIAL.is_match(password);
    if strong {
        Ok(())
    } else {
        let mut error = ValidationError::new("weak_password");
        error.message = Some("Invalid Password".into());
        Err(error)
    }
}
