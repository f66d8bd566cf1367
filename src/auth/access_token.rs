use chrono::Duration;

use crate::core::models::{AccessToken, Credential, RefreshToken};
use crate::core::types::{ClientId, ClientSecret, Password, Scope, TokenType};

#[derive(Debug, serde::Deserialize)]
pub struct ClientCredentials {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
}

/// Body of a token endpoint request, without the client credentials.
#[derive(Debug, serde::Deserialize)]
pub struct TokenForm {
    pub grant_type: String,
    pub username: Option<String>,
    pub password: Option<Password>,
    pub refresh_token: Option<String>,
}

impl From<(ClientCredentials, TokenForm)> for Credential {
    fn from((client, form): (ClientCredentials, TokenForm)) -> Self {
        Credential {
            grant_type: form.grant_type,
            client_id: client.client_id,
            client_secret: client.client_secret,
            username: form.username,
            password: form.password,
            refresh_token: form.refresh_token,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: TokenType,
    /// `null` for unscoped tokens.
    pub scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    pub fn with_refresh_token(self, refresh: &RefreshToken, expires_in: Duration) -> Self {
        Self {
            expires_in: Some(expires_in.num_seconds()),
            refresh_token: Some(refresh.token().to_string()),
            ..self
        }
    }
}

impl From<&AccessToken> for TokenResponse {
    fn from(token: &AccessToken) -> Self {
        Self {
            access_token: token.token().to_string(),
            token_type: TokenType::Bearer,
            scope: token.scope().cloned(),
            expires_in: None,
            refresh_token: None,
        }
    }
}
