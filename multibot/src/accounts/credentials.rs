//! Password hashing and session token handling.

use super::{
    errors::{AuthError, AuthResult},
    models::{Account, PanelClaims},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Hashes account secrets and issues/verifies panel session tokens
#[derive(Clone)]
pub struct Credentials {
    pepper: String,
    jwt_secret: String,
    token_duration: Duration,
}

impl Credentials {
    /// Create a new credential helper
    ///
    /// # Arguments
    ///
    /// * `pepper` - Server-side pepper appended before hashing
    /// * `jwt_secret` - Secret key for JWT signing
    pub fn new(pepper: String, jwt_secret: String) -> Self {
        Self {
            pepper,
            jwt_secret,
            token_duration: Duration::hours(12),
        }
    }

    /// Hash a secret with Argon2id + pepper
    pub fn hash_secret(&self, secret: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", secret, self.pepper);
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        Ok(argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify a secret against a stored hash
    pub fn verify_secret(&self, secret: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", secret, self.pepper);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }

    /// Check a login attempt against an optional looked-up account.
    ///
    /// Unknown usernames and wrong passwords produce the same error.
    pub fn authenticate(&self, account: Option<&Account>, secret: &str) -> AuthResult<PanelClaims> {
        let account = account.ok_or(AuthError::InvalidCredentials)?;
        self.verify_secret(secret, &account.secret_hash)?;
        Ok(self.claims_for(account))
    }

    fn claims_for(&self, account: &Account) -> PanelClaims {
        let now = Utc::now();
        PanelClaims {
            sub: account.username.clone(),
            role: account.role,
            exp: (now + self.token_duration).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Sign claims into a JWT
    pub fn issue_token(&self, claims: &PanelClaims) -> AuthResult<String> {
        let token = encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Verify a JWT and return its claims
    pub fn verify_token(&self, token: &str) -> AuthResult<PanelClaims> {
        let token_data = decode::<PanelClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// Token lifetime in seconds, for cookie `Max-Age`
    pub fn token_lifetime_secs(&self) -> i64 {
        self.token_duration.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Role;

    fn credentials() -> Credentials {
        Credentials::new(
            "test_pepper_for_testing".to_string(),
            "test_secret_key_for_testing_only_0123456789".to_string(),
        )
    }

    #[test]
    fn test_hash_and_verify() {
        let creds = credentials();
        let hash = creds.hash_secret("hunter22").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(creds.verify_secret("hunter22", &hash).is_ok());
        assert!(matches!(
            creds.verify_secret("hunter23", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_pepper_is_part_of_hash() {
        let hash = credentials().hash_secret("hunter22").unwrap();
        let other = Credentials::new("other_pepper_value".to_string(), "x".repeat(32));

        assert!(other.verify_secret("hunter22", &hash).is_err());
    }

    #[test]
    fn test_authenticate_unknown_user() {
        assert!(matches!(
            credentials().authenticate(None, "whatever"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_token_round_trip_keeps_role() {
        let creds = credentials();
        let account = Account {
            username: "admin".to_string(),
            secret_hash: creds.hash_secret("pw").unwrap(),
            role: Role::Admin,
        };

        let claims = creds.authenticate(Some(&account), "pw").unwrap();
        let token = creds.issue_token(&claims).unwrap();
        let verified = creds.verify_token(&token).unwrap();

        assert_eq!(verified.sub, "admin");
        assert!(verified.is_admin());
    }

    #[test]
    fn test_token_with_wrong_secret_rejected() {
        let creds = credentials();
        let account = Account {
            username: "bob".to_string(),
            secret_hash: String::new(),
            role: Role::User,
        };
        let token = creds.issue_token(&creds.claims_for(&account)).unwrap();

        let other = Credentials::new("p".to_string(), "another_secret_key_that_is_long_enough".to_string());
        let err = other.verify_token(&token).unwrap_err();
        assert_eq!(err.client_message(), "Authentication failed");
    }
}
