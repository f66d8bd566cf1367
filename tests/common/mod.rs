#![allow(dead_code)]

use kagi::core::config::TokenConfig;
use kagi::core::models::{Client, Credential, User};
use kagi::core::types::{ClientId, ClientSecret, GrantType, Password, UserId};
use kagi::db::MemoryStore;
use kagi::provider::validation::RequestValidator;
use kagi::provider::TokenProvider;
use kagi::util::hash::HashingService;

pub const CLIENT_ID: &str = "client_web";
pub const CLIENT_SECRET: &str = "s3cret";
pub const OPS_CLIENT_ID: &str = "client_ops";
pub const OPS_CLIENT_SECRET: &str = "ops-secret";

pub const USER_ID: &str = "42";
pub const USERNAME: &str = "alice";
pub const EMAIL: &str = "alice@example.com";
pub const TELEPHONE: &str = "+15550100";
pub const PASSWORD: &str = "correct horse battery staple";

const HASH_SECRET: &str = "pepper";

pub fn hasher() -> HashingService {
    HashingService::with_secret_key(HASH_SECRET.to_string())
}

/// A web client allowed every grant, an ops client limited to
/// client_credentials, and one user who may read tasks and token info.
pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();

    store.insert_client(Client {
        id: ClientId(CLIENT_ID.to_string()),
        secret: ClientSecret(CLIENT_SECRET.to_string()),
        redirect_uri: "https://app.example.com/callback".to_string(),
        grant_types: vec![],
    });
    store.insert_client(Client {
        id: ClientId(OPS_CLIENT_ID.to_string()),
        secret: ClientSecret(OPS_CLIENT_SECRET.to_string()),
        redirect_uri: String::new(),
        grant_types: vec![GrantType::ClientCredentials],
    });

    let password_hash = hasher()
        .hash(&Password(PASSWORD.to_string()))
        .expect("hash fixture password");
    store.insert_user(User {
        id: UserId(USER_ID.to_string()),
        username: USERNAME.to_string(),
        email: Some(EMAIL.to_string()),
        telephone: Some(TELEPHONE.to_string()),
        password_hash,
    });

    store.grant_permission("member", "GET", "/tasks");
    store.grant_permission("member", "GET", "/oauth/v1/tokeninfo");
    store.assign_role(&UserId(USER_ID.to_string()), "member");

    store
}

pub fn provider_with<S: kagi::auth::Store>(store: S, config: TokenConfig) -> TokenProvider<S> {
    TokenProvider::new(store, hasher(), config, RequestValidator::new())
}

pub fn provider() -> TokenProvider<MemoryStore> {
    provider_with(seeded_store(), TokenConfig::default())
}

pub fn credential(grant_type: &str) -> Credential {
    Credential {
        grant_type: grant_type.to_string(),
        client_id: ClientId(CLIENT_ID.to_string()),
        client_secret: ClientSecret(CLIENT_SECRET.to_string()),
        username: None,
        password: None,
        refresh_token: None,
    }
}

pub fn password_credential(username: &str, password: &str) -> Credential {
    Credential {
        username: Some(username.to_string()),
        password: Some(Password(password.to_string())),
        ..credential("password")
    }
}
