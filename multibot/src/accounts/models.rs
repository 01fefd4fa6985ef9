//! Account data models.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Panel role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Panel login credential.
///
/// `secret_hash` is an Argon2id PHC string; the clear-text password is never
/// stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub secret_hash: String,
    pub role: Role,
}

impl Account {
    pub fn view(&self) -> AccountView {
        AccountView {
            username: self.username.clone(),
            role: self.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Account projection without the secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub username: String,
    pub role: Role,
}

/// JWT claims carried in the panel session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelClaims {
    pub sub: String, // Username
    pub role: Role,
    pub exp: i64, // Expiration timestamp
    pub iat: i64, // Issued at timestamp
}

impl PanelClaims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
