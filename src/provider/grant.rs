use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{event, Level};

use crate::auth::{Store, TokenWriter};
use crate::core::config::TokenConfig;
use crate::core::models::{AccessToken, Client, Credential, RefreshToken, TokenRequest};
use crate::core::types::{GrantType, HashedPassword, Password, Scope};
use crate::util::hash::{fingerprint, HashingService};
use crate::util::random::token_string;

use super::error::Error;

fn authenticate_client<S: Store>(
    store: &S,
    credential: &Credential,
    grant: GrantType,
) -> Result<Client, Error> {
    let client = store
        .resolve_client(&credential.client_id)?
        .ok_or(Error::ClientNotFound)?;

    if !client.verify(credential) {
        event!(Level::DEBUG, "client secret mismatch");
        return Err(Error::InvalidClient);
    }

    if !client.allows(grant) {
        return Err(Error::UnauthorizedClient(grant));
    }

    Ok(client)
}

#[derive(Debug)]
pub struct ClientCredentialsGrant {
    access_lifetime: Duration,
}

impl ClientCredentialsGrant {
    pub fn create<S: Store>(&self, store: &S, credential: &Credential) -> Result<AccessToken, Error> {
        let client = authenticate_client(store, credential, GrantType::ClientCredentials)?;

        let token = AccessToken::issue(token_string()?, client.id, None, None, self.access_lifetime);
        store.create_access_token(&token)?;

        Ok(token)
    }

    pub fn extend_with_tx(&self, tx: &dyn TokenWriter, token: &str) -> Result<(), Error> {
        tx.extend_access_token_expiry(token, Utc::now() + self.access_lifetime)
    }
}

#[derive(Debug)]
pub struct PasswordGrant {
    hasher: Arc<HashingService>,
    access_lifetime: Duration,
}

impl PasswordGrant {
    pub fn create<S: Store>(&self, store: &S, credential: &Credential) -> Result<AccessToken, Error> {
        let client = authenticate_client(store, credential, GrantType::Password)?;

        let (username, password) = match (&credential.username, &credential.password) {
            (Some(u), Some(p)) => (u, p),
            _ => return Err(Error::InvalidPassword),
        };

        let user = store.resolve_user(username)?.ok_or_else(|| {
            event!(Level::DEBUG, "no user for identifier");
            Error::InvalidPassword
        })?;

        if !self.check_password(password, &user.password_hash) {
            return Err(Error::InvalidPassword);
        }

        let token = AccessToken::issue(
            token_string()?,
            client.id,
            Some(user.id),
            Some(Scope::user()),
            self.access_lifetime,
        );
        store.create_access_token(&token)?;

        Ok(token)
    }

    fn check_password(&self, password: &Password, hash: &HashedPassword) -> bool {
        self.hasher.verify(password, hash)
    }

    /// Issues a logged-in user token (user id, no scope) on `tx`.
    pub fn create_with_tx(
        &self,
        tx: &dyn TokenWriter,
        request: &TokenRequest,
    ) -> Result<AccessToken, Error> {
        let token = AccessToken::issue(
            token_string()?,
            request.client_id.clone(),
            Some(request.user_id.clone()),
            None,
            self.access_lifetime,
        );
        tx.create_access_token(&token)?;

        Ok(token)
    }

    pub fn extend_with_tx(&self, tx: &dyn TokenWriter, token: &str) -> Result<(), Error> {
        tx.extend_access_token_expiry(token, Utc::now() + self.access_lifetime)
    }
}

#[derive(Debug)]
pub struct RefreshGrant {
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl RefreshGrant {
    /// Trades a live refresh token for a fresh user token and pushes the
    /// refresh token's expiry forward, both in one transaction.
    pub fn create<S: Store>(&self, store: &S, credential: &Credential) -> Result<AccessToken, Error> {
        let client = authenticate_client(store, credential, GrantType::RefreshToken)?;

        let presented = credential.refresh_token.as_deref().ok_or(Error::InvalidGrant)?;
        let refresh = store
            .resolve_refresh_token(presented)?
            .filter(|r| r.client_id() == &client.id)
            .ok_or_else(|| {
                event!(Level::DEBUG, token = %fingerprint(presented), "unknown refresh token");
                Error::InvalidGrant
            })?;

        if !refresh.verify_expire_in() {
            return Err(Error::Expired);
        }

        store.with_transaction(|tx| {
            let token = AccessToken::issue(
                token_string()?,
                client.id.clone(),
                refresh.user_id().cloned(),
                None,
                self.access_lifetime,
            );
            tx.create_access_token(&token)?;
            self.extend_with_tx(tx, refresh.token())?;
            Ok(token)
        })
    }

    /// Issues the refresh half of a token pair on `tx`. A brand id on the
    /// request scopes the token to that brand.
    pub fn create_with_tx(
        &self,
        tx: &dyn TokenWriter,
        request: &TokenRequest,
    ) -> Result<RefreshToken, Error> {
        let token = RefreshToken::issue(
            token_string()?,
            request.client_id.clone(),
            Some(request.user_id.clone()),
            request.brand_scope(),
            self.refresh_lifetime,
        );
        tx.create_refresh_token(&token)?;

        Ok(token)
    }

    pub fn extend_with_tx(&self, tx: &dyn TokenWriter, token: &str) -> Result<(), Error> {
        tx.extend_refresh_token_expiry(token, Utc::now() + self.refresh_lifetime)
    }
}

#[derive(Debug)]
pub enum GrantStrategy {
    ClientCredentials(ClientCredentialsGrant),
    Password(PasswordGrant),
    Refresh(RefreshGrant),
}

impl GrantStrategy {
    pub fn create<S: Store>(&self, store: &S, credential: &Credential) -> Result<AccessToken, Error> {
        use GrantStrategy::*;

        match self {
            ClientCredentials(g) => g.create(store, credential),
            Password(g) => g.create(store, credential),
            Refresh(g) => g.create(store, credential),
        }
    }

    /// Pushes the expiry of the token kind this strategy issues.
    pub fn extend_with_tx(&self, tx: &dyn TokenWriter, token: &str) -> Result<(), Error> {
        use GrantStrategy::*;

        match self {
            ClientCredentials(g) => g.extend_with_tx(tx, token),
            Password(g) => g.extend_with_tx(tx, token),
            Refresh(g) => g.extend_with_tx(tx, token),
        }
    }
}

/// Grant strategies keyed by grant type.
#[derive(Debug)]
pub struct Grants {
    table: HashMap<GrantType, GrantStrategy>,
}

impl Grants {
    pub fn new(config: &TokenConfig, hasher: Arc<HashingService>) -> Self {
        let access_lifetime = config.access_lifetime();
        let refresh_lifetime = config.refresh_lifetime();

        let mut table = HashMap::new();
        table.insert(
            GrantType::ClientCredentials,
            GrantStrategy::ClientCredentials(ClientCredentialsGrant { access_lifetime }),
        );
        table.insert(
            GrantType::Password,
            GrantStrategy::Password(PasswordGrant {
                hasher,
                access_lifetime,
            }),
        );
        table.insert(
            GrantType::RefreshToken,
            GrantStrategy::Refresh(RefreshGrant {
                access_lifetime,
                refresh_lifetime,
            }),
        );

        Self { table }
    }

    pub fn get(&self, grant: GrantType) -> Result<&GrantStrategy, Error> {
        self.table
            .get(&grant)
            .ok_or_else(|| Error::UnsupportedGrantType(grant.to_string()))
    }

    fn password_grant(&self) -> Result<&PasswordGrant, Error> {
        match self.get(GrantType::Password)? {
            GrantStrategy::Password(g) => Ok(g),
            _ => Err(Error::UnsupportedGrantType(GrantType::Password.to_string())),
        }
    }

    fn refresh_grant(&self) -> Result<&RefreshGrant, Error> {
        match self.get(GrantType::RefreshToken)? {
            GrantStrategy::Refresh(g) => Ok(g),
            _ => Err(Error::UnsupportedGrantType(GrantType::RefreshToken.to_string())),
        }
    }

    #[tracing::instrument(
        skip(self, store, credential),
        fields(client_id = ?credential.client_id, grant_type = %credential.grant_type)
    )]
    pub fn create<S: Store>(&self, store: &S, credential: &Credential) -> Result<AccessToken, Error> {
        let grant: GrantType = credential.grant_type.parse()?;
        let token = self.get(grant)?.create(store, credential)?;

        event!(Level::INFO, token = %fingerprint(token.token()), "issued access token");
        Ok(token)
    }

    /// Issues a user token and a refresh token together; neither persists
    /// unless both do.
    #[tracing::instrument(skip(self, store, request), fields(client_id = ?request.client_id))]
    pub fn create_by_token_request<S: Store>(
        &self,
        store: &S,
        request: &TokenRequest,
    ) -> Result<(AccessToken, RefreshToken), Error> {
        store
            .resolve_client(&request.client_id)?
            .ok_or(Error::ClientNotFound)?;

        let user_grant = self.password_grant()?;
        let refresh_grant = self.refresh_grant()?;

        let pair = store.with_transaction(|tx| {
            let access = user_grant.create_with_tx(tx, request)?;
            let refresh = refresh_grant.create_with_tx(tx, request)?;
            Ok((access, refresh))
        })?;

        event!(
            Level::INFO,
            token = %fingerprint(pair.0.token()),
            refresh = %fingerprint(pair.1.token()),
            "issued token pair"
        );
        Ok(pair)
    }

    pub fn extend_access_token<S: Store>(&self, store: &S, token: &str) -> Result<(), Error> {
        let strategy = self.get(GrantType::Password)?;
        store.with_transaction(|tx| strategy.extend_with_tx(tx, token))
    }

    pub fn extend_refresh_token<S: Store>(&self, store: &S, token: &str) -> Result<(), Error> {
        let strategy = self.get(GrantType::RefreshToken)?;
        store.with_transaction(|tx| strategy.extend_with_tx(tx, token))
    }
}
