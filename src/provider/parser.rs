use tracing::{event, Level};

use crate::auth::Store;
use crate::core::models::AccessToken;
use crate::core::types::TokenType;
use crate::util::hash::fingerprint;

use super::error::Error;

/// Pulls the bearer token out of an `Authorization` header value.
pub fn bearer_token(header: &str) -> Result<&str, Error> {
    if header.is_empty() {
        return Err(Error::EmptyCredential);
    }

    match header.split_once(' ') {
        Some((scheme, token)) if scheme == TokenType::Bearer.as_str() && !token.is_empty() => {
            Ok(token)
        }
        _ => Err(Error::TokenTypeMismatch),
    }
}

/// Turns an `Authorization` header into the access token it names, provided
/// the token's user may call `method` on `endpoint`.
///
/// Expiry is not checked here.
pub struct Parser<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> Parser<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn parse(&self, header: &str, method: &str, endpoint: &str) -> Result<AccessToken, Error> {
        let token = bearer_token(header)?;

        self.store
            .resolve_access_token(token, method, endpoint)?
            .ok_or_else(|| {
                event!(
                    Level::DEBUG,
                    token = %fingerprint(token),
                    method,
                    endpoint,
                    "no permitted token"
                );
                Error::TokenNotFound
            })
    }
}
