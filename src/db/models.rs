use chrono::{DateTime, Utc};

use crate::core::models as entity;
use crate::core::types::{ClientId, ClientSecret, GrantType, HashedPassword, Scope, UserId};

use super::schema::*;

#[derive(Debug)]
#[derive(Queryable, Insertable)]
#[table_name = "oauth_clients"]
pub struct Client {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub grant_types: String,
}

#[derive(Debug)]
#[derive(Queryable, QueryableByName, Insertable)]
#[table_name = "oauth_access_tokens"]
pub struct AccessToken {
    pub access_token: String,
    pub client_id: String,
    pub user_id: Option<String>,
    pub expires: DateTime<Utc>,
    pub scope: Option<String>,
}

#[derive(Debug)]
#[derive(Queryable, Insertable)]
#[table_name = "oauth_refresh_tokens"]
pub struct RefreshToken {
    pub refresh_token: String,
    pub client_id: String,
    pub user_id: Option<String>,
    pub expires: DateTime<Utc>,
    pub scope: Option<String>,
}

#[derive(Debug)]
#[derive(Queryable, Insertable)]
#[table_name = "users"]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub password_hash: String,
}

#[derive(Debug)]
#[derive(Insertable)]
#[table_name = "roles"]
pub struct NewRole<'a> {
    pub name: &'a str,
}

#[derive(Debug)]
#[derive(Insertable)]
#[table_name = "permissions"]
pub struct NewPermission<'a> {
    pub method: &'a str,
    pub endpoint: &'a str,
}

#[derive(Debug)]
#[derive(Queryable, Insertable)]
#[table_name = "user_roles"]
pub struct UserRole {
    pub user_id: String,
    pub role_id: i32,
}

#[derive(Debug)]
#[derive(Queryable, Insertable)]
#[table_name = "role_permissions"]
pub struct RolePermission {
    pub role_id: i32,
    pub permission_id: i32,
}

impl From<Client> for entity::Client {
    fn from(c: Client) -> Self {
        Self {
            id: ClientId(c.client_id),
            secret: ClientSecret(c.client_secret),
            redirect_uri: c.redirect_uri,
            grant_types: GrantType::parse_list(&c.grant_types),
        }
    }
}

impl From<User> for entity::User {
    fn from(u: User) -> Self {
        Self {
            id: UserId(u.id),
            username: u.username,
            email: u.email,
            telephone: u.telephone,
            password_hash: HashedPassword(u.password_hash),
        }
    }
}

impl From<AccessToken> for entity::AccessToken {
    fn from(t: AccessToken) -> Self {
        Self::new(
            t.access_token,
            ClientId(t.client_id),
            t.user_id.map(UserId),
            t.expires,
            t.scope.map(Scope),
        )
    }
}

impl From<&entity::AccessToken> for AccessToken {
    fn from(t: &entity::AccessToken) -> Self {
        Self {
            access_token: t.token().to_string(),
            client_id: t.client_id().0.clone(),
            user_id: t.user_id().map(|u| u.0.clone()),
            expires: t.expires(),
            scope: t.scope().map(|s| s.0.clone()),
        }
    }
}

impl From<RefreshToken> for entity::RefreshToken {
    fn from(t: RefreshToken) -> Self {
        Self::new(
            t.refresh_token,
            ClientId(t.client_id),
            t.user_id.map(UserId),
            t.expires,
            t.scope.map(Scope),
        )
    }
}

impl From<&entity::RefreshToken> for RefreshToken {
    fn from(t: &entity::RefreshToken) -> Self {
        Self {
            refresh_token: t.token().to_string(),
            client_id: t.client_id().0.clone(),
            user_id: t.user_id().map(|u| u.0.clone()),
            expires: t.expires(),
            scope: t.scope().map(|s| s.0.clone()),
        }
    }
}
