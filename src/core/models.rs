use chrono::{DateTime, Duration, Utc};

use super::types::*;

/// Proof of identity presented to the token endpoint. Never persisted.
#[derive(Clone, Debug)]
pub struct Credential {
    pub grant_type: String,
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub username: Option<String>,
    pub password: Option<Password>,
    pub refresh_token: Option<String>,
}

/// Request for an access + refresh token pair on behalf of an already
/// authenticated user.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub client_id: ClientId,
    pub user_id: UserId,
    #[serde(default)]
    pub brand_id: Option<String>,
    #[serde(default)]
    pub login_method: Option<String>,
    #[serde(skip)]
    pub device_info: Option<String>,
    #[serde(skip)]
    pub ip_address: Option<String>,
}

impl TokenRequest {
    pub fn new(client_id: ClientId, user_id: UserId) -> Self {
        Self {
            client_id,
            user_id,
            brand_id: None,
            login_method: None,
            device_info: None,
            ip_address: None,
        }
    }

    pub fn brand_scope(&self) -> Option<Scope> {
        self.brand_id
            .as_deref()
            .filter(|b| !b.is_empty())
            .map(Scope::brand)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AccessToken {
    access_token: String,
    client_id: ClientId,
    user_id: Option<UserId>,
    expires: DateTime<Utc>,
    scope: Option<Scope>,
}

impl AccessToken {
    pub fn new(
        access_token: String,
        client_id: ClientId,
        user_id: Option<UserId>,
        expires: DateTime<Utc>,
        scope: Option<Scope>,
    ) -> Self {
        Self {
            access_token,
            client_id,
            user_id,
            expires,
            scope,
        }
    }

    /// A token expiring `lifetime` from now.
    pub fn issue(
        access_token: String,
        client_id: ClientId,
        user_id: Option<UserId>,
        scope: Option<Scope>,
        lifetime: Duration,
    ) -> Self {
        Self::new(access_token, client_id, user_id, Utc::now() + lifetime, scope)
    }

    pub fn token(&self) -> &str {
        &self.access_token
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn verify_expire_in(&self) -> bool {
        self.verify_expire_in_at(Utc::now())
    }

    /// Expiry is exclusive: the token is dead at the instant it expires.
    pub fn verify_expire_in_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires
    }

    pub fn verify_user_id(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn verify_user_logged_in(&self) -> bool {
        self.user_id.is_some() && self.scope.is_none()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RefreshToken {
    refresh_token: String,
    client_id: ClientId,
    user_id: Option<UserId>,
    expires: DateTime<Utc>,
    scope: Option<Scope>,
}

impl RefreshToken {
    pub fn new(
        refresh_token: String,
        client_id: ClientId,
        user_id: Option<UserId>,
        expires: DateTime<Utc>,
        scope: Option<Scope>,
    ) -> Self {
        Self {
            refresh_token,
            client_id,
            user_id,
            expires,
            scope,
        }
    }

    pub fn issue(
        refresh_token: String,
        client_id: ClientId,
        user_id: Option<UserId>,
        scope: Option<Scope>,
        lifetime: Duration,
    ) -> Self {
        Self::new(refresh_token, client_id, user_id, Utc::now() + lifetime, scope)
    }

    pub fn token(&self) -> &str {
        &self.refresh_token
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn verify_expire_in(&self) -> bool {
        Utc::now() < self.expires
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    pub id: ClientId,
    pub secret: ClientSecret,
    pub redirect_uri: String,
    pub grant_types: Vec<GrantType>,
}

impl Client {
    pub fn verify(&self, credential: &Credential) -> bool {
        self.id == credential.client_id
            && self.secret.as_ref().as_bytes() == credential.client_secret.as_ref().as_bytes()
    }

    /// An empty grant list places no restriction on the client.
    pub fn allows(&self, grant: GrantType) -> bool {
        self.grant_types.is_empty() || self.grant_types.contains(&grant)
    }
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub password_hash: HashedPassword,
}

impl User {
    pub fn identified_by(&self, identifier: &str) -> bool {
        self.username == identifier
            || self.email.as_deref() == Some(identifier)
            || self.telephone.as_deref() == Some(identifier)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permission {
    pub id: i32,
    pub method: String,
    pub endpoint: String,
}

impl Permission {
    pub fn matches(&self, method: &str, endpoint: &str) -> bool {
        self.method == method && endpoint.starts_with(&self.endpoint)
    }

    /// Longest matching endpoint prefix; equal lengths go to the lowest id.
    pub fn most_specific<'a, I>(permissions: I, method: &str, endpoint: &str) -> Option<&'a Permission>
    where
        I: IntoIterator<Item = &'a Permission>,
    {
        permissions
            .into_iter()
            .filter(|p| p.matches(method, endpoint))
            .min_by(|a, b| {
                b.endpoint
                    .len()
                    .cmp(&a.endpoint.len())
                    .then(a.id.cmp(&b.id))
            })
    }
}
