use crate::core::types::GrantType;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("client not found")]
    ClientNotFound,
    #[error("invalid client credentials")]
    InvalidClient,
    #[error("client may not use the {0} grant")]
    UnauthorizedClient(GrantType),
    #[error("client may not request tokens")]
    ClientNotAllowed,
    #[error("invalid username or password")]
    InvalidPassword,
    #[error("invalid grant")]
    InvalidGrant,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unsupported grant type {0:?}")]
    UnsupportedGrantType(String),
    #[error("empty credential")]
    EmptyCredential,
    #[error("token type mismatch")]
    TokenTypeMismatch,
    #[error("token not found")]
    TokenNotFound,
    #[error("token expired")]
    Expired,
    #[error("failed to generate token")]
    TokenGeneration(#[source] rand::Error),
    #[error("storage failure: {0}")]
    Storage(#[source] BoxError),
    #[error("transaction failure: {0}")]
    Transaction(#[source] BoxError),
    #[error("rollback failed ({source}) after: {cause}")]
    Rollback {
        cause: Box<Error>,
        #[source]
        source: BoxError,
    },
}

impl Error {
    pub fn storage(e: impl Into<BoxError>) -> Self {
        Self::Storage(e.into())
    }

    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::TokenGeneration(_) | Self::Storage(_) | Self::Transaction(_) | Self::Rollback { .. }
        )
    }

    /// HTTP status for a failed issuance request.
    pub fn status_code(&self) -> u16 {
        use Error::*;

        match self {
            InvalidRequest(_) | UnsupportedGrantType(_) | InvalidGrant => 400,
            InvalidClient | InvalidPassword | EmptyCredential | TokenTypeMismatch | TokenNotFound
            | Expired => 401,
            UnauthorizedClient(_) | ClientNotAllowed => 403,
            ClientNotFound => 404,
            TokenGeneration(_) | Storage(_) | Transaction(_) | Rollback { .. } => 500,
        }
    }

    /// Short client-facing reason. Never carries storage detail.
    pub fn reason(&self) -> &'static str {
        use Error::*;

        match self {
            ClientNotFound => "client not found",
            InvalidClient => "invalid client",
            UnauthorizedClient(_) => "unauthorized client",
            ClientNotAllowed => "client not allowed",
            InvalidPassword => "invalid password",
            InvalidGrant => "invalid grant",
            InvalidRequest(_) => "invalid request",
            UnsupportedGrantType(_) => "unsupported grant type",
            EmptyCredential => "empty credential",
            TokenTypeMismatch => "token type mismatch",
            TokenNotFound => "token not found",
            Expired => "token expired",
            TokenGeneration(_) | Storage(_) | Transaction(_) | Rollback { .. } => "internal error",
        }
    }
}

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Self {
        Self::Storage(Box::new(e))
    }
}

impl From<diesel::r2d2::PoolError> for Error {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        Self::Storage(Box::new(e))
    }
}
