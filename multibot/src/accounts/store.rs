//! In-memory account store.

use super::models::{Account, AccountView};
use crate::errors::{PanelError, PanelResult};
use std::collections::BTreeMap;

/// Keyed collection of panel accounts, unique by username
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: BTreeMap<String, Account>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding exactly one seeded account
    pub fn seeded(admin: Account) -> Self {
        let mut store = Self::new();
        store.accounts.insert(admin.username.clone(), admin);
        store
    }

    /// Add an account
    ///
    /// # Errors
    ///
    /// * `PanelError::EmptyInput` - Username is blank
    /// * `PanelError::DuplicateUsername` - Username already exists; the store is unchanged
    pub fn add(&mut self, mut account: Account) -> PanelResult<AccountView> {
        account.username = account.username.trim().to_string();
        if account.username.is_empty() {
            return Err(PanelError::EmptyInput("username"));
        }

        if self.accounts.contains_key(&account.username) {
            return Err(PanelError::DuplicateUsername(account.username));
        }

        let view = account.view();
        self.accounts.insert(account.username.clone(), account);
        Ok(view)
    }

    pub fn get(&self, username: &str) -> Option<&Account> {
        self.accounts.get(username)
    }

    /// All accounts without secrets, ordered by username
    pub fn list(&self) -> Vec<AccountView> {
        self.accounts.values().map(Account::view).collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
