use crate::error::AppError;
use crate::models::Role;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject of the token: the user's public uuid.
    pub sub: String,
    /// Role at the time the token was issued.
    pub role: Role,
    /// Expiration timestamp (seconds since epoch) for the token.
    pub exp: usize,
}

/// Issues and verifies HS256 tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    expiration_hours: i64,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, expiration_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours,
        }
    }

    /// Generates a token for `user_uuid` that expires after the configured number of hours.
    pub fn generate_token(&self, user_uuid: &str, role: Role) -> Result<String, AppError> {
        let expiration = chrono::Utc::now()
            .checked_add_signed(chrono::Duration::hours(self.expiration_hours))
            .ok_or_else(|| AppError::InternalServerError("Invalid token expiration".into()))?
            .timestamp() as usize;

        let claims = Claims {
            sub: user_uuid.to_string(),
            role,
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies the signature and expiry of `token` and returns its claims.
    ///
    /// Returns `AppError::Unauthorized` if the token is malformed, its signature is
    /// invalid, or it has expired.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        Ok(decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)?)
    }
}
