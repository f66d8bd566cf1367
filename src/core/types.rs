use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::provider::error::Error;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    ClientCredentials,
    Password,
    RefreshToken,
}

impl GrantType {
    pub const ALL: [GrantType; 3] = [
        GrantType::ClientCredentials,
        GrantType::Password,
        GrantType::RefreshToken,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::Password => "password",
            Self::RefreshToken => "refresh_token",
        }
    }

    /// Parses a comma or space delimited list, as stored on a client record.
    /// Unknown tags are skipped.
    pub fn parse_list(list: &str) -> Vec<GrantType> {
        list.split(|c: char| c == ',' || c.is_whitespace())
            .filter_map(|tag| tag.parse().ok())
            .collect()
    }
}

impl FromStr for GrantType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GrantType::ALL
            .iter()
            .find(|g| g.as_str() == s)
            .copied()
            .ok_or_else(|| Error::UnsupportedGrantType(s.to_string()))
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl FromStr for ClientId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct ClientSecret(pub String);

impl AsRef<str> for ClientSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret(..)")
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Password(pub String);

impl AsRef<str> for Password {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(..)")
    }
}

/// An argon2 encoded hash of a [`Password`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HashedPassword(pub String);

impl From<String> for HashedPassword {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for HashedPassword {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Label narrowing what a token authorizes.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Scope(pub String);

impl Scope {
    pub const USER: &'static str = "user";
    pub const BRAND_PREFIX: &'static str = "brandId";

    pub fn user() -> Self {
        Self(Self::USER.to_string())
    }

    pub fn brand(brand_id: &str) -> Self {
        Self(format!("{}:{}", Self::BRAND_PREFIX, brand_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum TokenType {
    Bearer,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bearer => "Bearer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_type_tags() {
        assert_eq!("password".parse::<GrantType>().ok(), Some(GrantType::Password));
        assert_eq!(
            "refresh_token".parse::<GrantType>().ok(),
            Some(GrantType::RefreshToken)
        );
        assert!(matches!(
            "authorization_code".parse::<GrantType>(),
            Err(Error::UnsupportedGrantType(tag)) if tag == "authorization_code"
        ));
    }

    #[test]
    fn grant_list_skips_unknown_tags() {
        let grants = GrantType::parse_list("password, client_credentials implicit");
        assert_eq!(grants, vec![GrantType::Password, GrantType::ClientCredentials]);
    }

    #[test]
    fn brand_scope() {
        assert_eq!(Scope::brand("42").as_str(), "brandId:42");
    }
}
