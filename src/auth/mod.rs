pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Role;

pub use extractors::{AdminUser, AuthenticatedUser};
pub use middleware::AuthMiddleware;
pub use password::PasswordHasher;
pub use token::{Claims, TokenService};

/// Represents the payload for a login request.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login name (an e-mail address).
    #[validate(email)]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response after successful authentication (login or registration).
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The JWT for session authentication.
    pub token: String,
    /// Public identifier of the authenticated user.
    pub uuid: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let valid_login = LoginRequest {
            username: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_login.validate().is_ok());

        let invalid_email_login = LoginRequest {
            username: "testexample.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_email_login.validate().is_err());

        let empty_password_login = LoginRequest {
            username: "test@example.com".to_string(),
            password: "".to_string(),
        };
        assert!(empty_password_login.validate().is_err());
    }
}
