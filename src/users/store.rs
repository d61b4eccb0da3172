//! User lookup.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{User, UserError};

/// Read access to user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Result<User, UserError>;

    /// Look a user up by email, ignoring case and surrounding whitespace.
    async fn get_by_email(&self, email: &str) -> Result<User, UserError>;

    /// Add a new account, returning it with its assigned id.
    ///
    /// The id on `user` is ignored. Fails with [`UserError::EmailTaken`] if
    /// another account has the same email.
    async fn create(&self, user: User) -> Result<User, UserError>;
}

fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Thread-safe in-memory user store.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<i64, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    /// Add or replace a user.
    pub fn insert(&self, user: User) -> Result<(), UserError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| UserError::Backend("internal lock poisoned".into()))?;
        users.insert(user.id, user);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_id(&self, id: i64) -> Result<User, UserError> {
        let users = self
            .users
            .read()
            .map_err(|_| UserError::Backend("internal lock poisoned".into()))?;
        users.get(&id).cloned().ok_or(UserError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, UserError> {
        let users = self
            .users
            .read()
            .map_err(|_| UserError::Backend("internal lock poisoned".into()))?;
        users
            .values()
            .find(|u| same_email(&u.email, email))
            .cloned()
            .ok_or(UserError::NotFound)
    }

    async fn create(&self, mut user: User) -> Result<User, UserError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| UserError::Backend("internal lock poisoned".into()))?;

        if users.values().any(|u| same_email(&u.email, &user.email)) {
            return Err(UserError::EmailTaken);
        }

        user.id = users.keys().max().map_or(1, |id| id + 1);
        users.insert(user.id, user.clone());
        Ok(user)
    }
}
