//! Credential error types.

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// JWT token error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Get a client-safe error message
    ///
    /// JWT errors are collapsed so token internals are not echoed back.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Jwt(_) => "Authentication failed".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for credential operations
pub type AuthResult<T> = Result<T, AuthError>;
