use std::sync::Arc;

use tracing::{event, Level};

use crate::auth::{Store, TokenResponse};
use crate::core::config::TokenConfig;
use crate::core::models::{AccessToken, Credential, TokenRequest};
use crate::util::hash::HashingService;

pub mod error;
pub mod grant;
pub mod parser;
pub mod validation;

use error::Error;
use grant::Grants;
use parser::Parser;
use validation::RequestValidator;

/// Entry point for issuing, parsing and extending tokens over a [`Store`].
#[derive(Debug)]
pub struct TokenProvider<S> {
    store: S,
    config: TokenConfig,
    grants: Grants,
    validator: RequestValidator,
}

impl<S: Store> TokenProvider<S> {
    pub fn new(
        store: S,
        hasher: HashingService,
        config: TokenConfig,
        validator: RequestValidator,
    ) -> Self {
        let grants = Grants::new(&config, Arc::new(hasher));

        Self {
            store,
            config,
            grants,
            validator,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Single-token issuance for the grant named by the credential.
    pub fn create(&self, credential: &Credential) -> Result<TokenResponse, Error> {
        self.validator.validate_credential(credential)?;

        let token = self.grants.create(&self.store, credential)?;
        Ok(TokenResponse::from(&token))
    }

    /// Issues a user access token and a refresh token for a user the caller
    /// has already authenticated.
    pub fn create_by_token_request(&self, request: &TokenRequest) -> Result<TokenResponse, Error> {
        self.validator.validate_token_request(request)?;

        let (access, refresh) = self.grants.create_by_token_request(&self.store, request)?;
        Ok(TokenResponse::from(&access)
            .with_refresh_token(&refresh, self.config.access_lifetime()))
    }

    /// Resolves a bearer header to a token permitted for `method` on
    /// `endpoint`. The caller checks expiry.
    pub fn parse_with_access_token(
        &self,
        header: &str,
        method: &str,
        endpoint: &str,
    ) -> Result<AccessToken, Error> {
        Parser::new(&self.store).parse(header, method, endpoint)
    }

    pub fn client_scope_allowed(&self, client_id: &str) -> bool {
        let allowed = self.config.client_scope_allowed(client_id);
        if !allowed {
            event!(Level::INFO, client_id, "client outside allow-list");
        }
        allowed
    }

    #[tracing::instrument(skip_all)]
    pub fn extend_access_token(&self, token: &str) -> Result<(), Error> {
        self.grants.extend_access_token(&self.store, token)
    }

    #[tracing::instrument(skip_all)]
    pub fn extend_refresh_token(&self, token: &str) -> Result<(), Error> {
        self.grants.extend_refresh_token(&self.store, token)
    }
}
