use crate::core::models::{Credential, TokenRequest};
use crate::core::types::GrantType;

use super::error::Error;

/// Shape checks on issuance input, run before anything touches the store.
#[derive(Clone, Debug, Default)]
pub struct RequestValidator;

fn missing(field: &str) -> Error {
    Error::InvalidRequest(format!("{} is required", field))
}

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

impl RequestValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_credential(&self, credential: &Credential) -> Result<(), Error> {
        if blank(Some(credential.client_id.as_ref())) {
            return Err(missing("client_id"));
        }

        match credential.grant_type.parse::<GrantType>()? {
            GrantType::ClientCredentials => {}
            GrantType::Password => {
                if blank(credential.username.as_deref()) {
                    return Err(missing("username"));
                }
                if blank(credential.password.as_ref().map(|p| p.0.as_str())) {
                    return Err(missing("password"));
                }
            }
            GrantType::RefreshToken => {
                if blank(credential.refresh_token.as_deref()) {
                    return Err(missing("refresh_token"));
                }
            }
        }

        Ok(())
    }

    pub fn validate_token_request(&self, request: &TokenRequest) -> Result<(), Error> {
        if blank(Some(request.client_id.as_ref())) {
            return Err(missing("clientId"));
        }
        if blank(Some(request.user_id.as_ref())) {
            return Err(missing("userId"));
        }

        Ok(())
    }
}
