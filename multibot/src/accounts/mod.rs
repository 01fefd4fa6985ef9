//! Panel accounts: the in-memory store plus credential helpers.
//!
//! - Argon2id password hashing with a server-side pepper
//! - JWT session tokens carrying username and role
//!
//! The store itself is owned by the panel actor. Hashing and token work is
//! done by [`Credentials`] outside the actor so slow hashing never stalls
//! command processing.

pub mod credentials;
pub mod errors;
pub mod models;
pub mod store;

pub use credentials::Credentials;
pub use errors::{AuthError, AuthResult};
pub use models::{Account, AccountView, PanelClaims, Role};
pub use store::AccountStore;
