use crate::error::AppError;
use bcrypt::{hash, verify};

/// bcrypt hashing with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(&self, password: &str, hashed_password: &str) -> Result<bool, AppError> {
        verify(password, hashed_password)
            .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
    }
}
