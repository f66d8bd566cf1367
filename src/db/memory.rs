//! Mutex-guarded in-process store, for tests and local runs without
//! PostgreSQL.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::auth::{Store, TokenWriter};
use crate::core::models::{AccessToken, Client, Permission, RefreshToken, User};
use crate::core::types::{ClientId, UserId};
use crate::provider::error::Error;

#[derive(Clone, Debug, Default)]
struct Tables {
    clients: HashMap<ClientId, Client>,
    users: Vec<User>,
    access_tokens: HashMap<String, AccessToken>,
    refresh_tokens: HashMap<String, RefreshToken>,
    permissions: Vec<Permission>,
    roles: HashMap<String, Vec<i32>>,
    user_roles: HashMap<UserId, Vec<String>>,
}

impl Tables {
    fn insert_access_token(&mut self, token: &AccessToken) -> Result<(), Error> {
        if self.access_tokens.contains_key(token.token()) {
            return Err(Error::storage("duplicate access token"));
        }
        self.access_tokens
            .insert(token.token().to_string(), token.clone());
        Ok(())
    }

    fn insert_refresh_token(&mut self, token: &RefreshToken) -> Result<(), Error> {
        if self.refresh_tokens.contains_key(token.token()) {
            return Err(Error::storage("duplicate refresh token"));
        }
        self.refresh_tokens
            .insert(token.token().to_string(), token.clone());
        Ok(())
    }

    fn extend_access_token(&mut self, token: &str, expires: DateTime<Utc>) -> Result<(), Error> {
        let found = self.access_tokens.get_mut(token).ok_or(Error::TokenNotFound)?;
        *found = AccessToken::new(
            found.token().to_string(),
            found.client_id().clone(),
            found.user_id().cloned(),
            expires,
            found.scope().cloned(),
        );
        Ok(())
    }

    fn extend_refresh_token(&mut self, token: &str, expires: DateTime<Utc>) -> Result<(), Error> {
        let found = self.refresh_tokens.get_mut(token).ok_or(Error::TokenNotFound)?;
        *found = RefreshToken::new(
            found.token().to_string(),
            found.client_id().clone(),
            found.user_id().cloned(),
            expires,
            found.scope().cloned(),
        );
        Ok(())
    }

    fn permissions_of(&self, user: &UserId) -> Vec<&Permission> {
        let permission_ids: Vec<i32> = self
            .user_roles
            .get(user)
            .into_iter()
            .flatten()
            .filter_map(|role| self.roles.get(role))
            .flatten()
            .copied()
            .collect();

        self.permissions
            .iter()
            .filter(|p| permission_ids.contains(&p.id))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic inside a transaction poisons the lock after the staged copy
    // is already discarded, so the tables themselves are intact.
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_client(&self, client: Client) {
        self.tables().clients.insert(client.id.clone(), client);
    }

    pub fn insert_user(&self, user: User) {
        let mut tables = self.tables();
        tables.users.retain(|u| u.id != user.id);
        tables.users.push(user);
    }

    /// Lets `role` call `method` on every endpoint under `endpoint`.
    /// Returns the permission id.
    pub fn grant_permission(&self, role: &str, method: &str, endpoint: &str) -> i32 {
        let mut tables = self.tables();

        let existing = tables
            .permissions
            .iter()
            .find(|p| p.method == method && p.endpoint == endpoint)
            .map(|p| p.id);
        let id = match existing {
            Some(id) => id,
            None => {
                let id = tables.permissions.len() as i32 + 1;
                tables.permissions.push(Permission {
                    id,
                    method: method.to_string(),
                    endpoint: endpoint.to_string(),
                });
                id
            }
        };

        let granted = tables.roles.entry(role.to_string()).or_default();
        if !granted.contains(&id) {
            granted.push(id);
        }
        id
    }

    pub fn assign_role(&self, user: &UserId, role: &str) {
        let mut tables = self.tables();
        let roles = tables.user_roles.entry(user.clone()).or_default();
        if !roles.iter().any(|r| r == role) {
            roles.push(role.to_string());
        }
    }

    /// Stored access token, regardless of permissions.
    pub fn access_token(&self, token: &str) -> Option<AccessToken> {
        self.tables().access_tokens.get(token).cloned()
    }

    pub fn refresh_token(&self, token: &str) -> Option<RefreshToken> {
        self.tables().refresh_tokens.get(token).cloned()
    }

    pub fn access_token_count(&self) -> usize {
        self.tables().access_tokens.len()
    }

    pub fn refresh_token_count(&self) -> usize {
        self.tables().refresh_tokens.len()
    }
}

/// Writes against the staged copy of a transaction.
struct Staged<'a> {
    tables: &'a RefCell<Tables>,
}

impl TokenWriter for Staged<'_> {
    fn create_access_token(&self, token: &AccessToken) -> Result<(), Error> {
        self.tables.borrow_mut().insert_access_token(token)
    }

    fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), Error> {
        self.tables.borrow_mut().insert_refresh_token(token)
    }

    fn extend_access_token_expiry(&self, token: &str, expires: DateTime<Utc>) -> Result<(), Error> {
        self.tables.borrow_mut().extend_access_token(token, expires)
    }

    fn extend_refresh_token_expiry(&self, token: &str, expires: DateTime<Utc>) -> Result<(), Error> {
        self.tables.borrow_mut().extend_refresh_token(token, expires)
    }
}

impl TokenWriter for MemoryStore {
    fn create_access_token(&self, token: &AccessToken) -> Result<(), Error> {
        self.tables().insert_access_token(token)
    }

    fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), Error> {
        self.tables().insert_refresh_token(token)
    }

    fn extend_access_token_expiry(&self, token: &str, expires: DateTime<Utc>) -> Result<(), Error> {
        self.tables().extend_access_token(token, expires)
    }

    fn extend_refresh_token_expiry(&self, token: &str, expires: DateTime<Utc>) -> Result<(), Error> {
        self.tables().extend_refresh_token(token, expires)
    }
}

impl Store for MemoryStore {
    fn resolve_client(&self, client_id: &ClientId) -> Result<Option<Client>, Error> {
        Ok(self.tables().clients.get(client_id).cloned())
    }

    fn resolve_user(&self, identifier: &str) -> Result<Option<User>, Error> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.identified_by(identifier))
            .cloned())
    }

    fn resolve_access_token(
        &self,
        token: &str,
        method: &str,
        endpoint: &str,
    ) -> Result<Option<AccessToken>, Error> {
        let tables = self.tables();

        let found = match tables.access_tokens.get(token) {
            Some(found) => found,
            None => return Ok(None),
        };
        let user = match found.user_id() {
            Some(user) => user,
            None => return Ok(None),
        };

        let permissions = tables.permissions_of(user);
        Ok(Permission::most_specific(permissions, method, endpoint).map(|_| found.clone()))
    }

    fn resolve_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, Error> {
        Ok(self.tables().refresh_tokens.get(token).cloned())
    }

    fn with_transaction<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&dyn TokenWriter) -> Result<T, Error>,
    {
        let mut tables = self.tables();
        let staged = RefCell::new(tables.clone());

        let value = f(&Staged { tables: &staged })?;
        *tables = staged.into_inner();

        Ok(value)
    }
}
