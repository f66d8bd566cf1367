use chrono::{DateTime, Utc};

use crate::core::models::{AccessToken, Client, RefreshToken, User};
use crate::core::types::ClientId;
use crate::provider::error::Error;

pub mod access_token;

pub use access_token::*;

/// Writes allowed on token records. Implemented by stores and by the
/// handle a store hands to a transactional unit of work.
pub trait TokenWriter {
    fn create_access_token(&self, token: &AccessToken) -> Result<(), Error>;
    fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), Error>;
    fn extend_access_token_expiry(&self, token: &str, expires: DateTime<Utc>) -> Result<(), Error>;
    fn extend_refresh_token_expiry(&self, token: &str, expires: DateTime<Utc>)
        -> Result<(), Error>;
}

pub trait Store: TokenWriter {
    fn resolve_client(&self, client_id: &ClientId) -> Result<Option<Client>, Error>;

    /// Looks a user up by username, email or telephone.
    fn resolve_user(&self, identifier: &str) -> Result<Option<User>, Error>;

    /// Resolves `token` only if its user holds a permission for `method` on
    /// an endpoint prefix of `endpoint`.
    fn resolve_access_token(
        &self,
        token: &str,
        method: &str,
        endpoint: &str,
    ) -> Result<Option<AccessToken>, Error>;

    fn resolve_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, Error>;

    /// Runs `f` inside a write transaction. `Ok` commits; an `Err` or a panic
    /// leaving `f` rolls back.
    fn with_transaction<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&dyn TokenWriter) -> Result<T, Error>;
}
