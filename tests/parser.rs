mod common;

use chrono::{Duration, Utc};

use kagi::auth::TokenWriter;
use kagi::core::models::AccessToken;
use kagi::core::types::{ClientId, UserId};
use kagi::provider::error::Error;

use common::*;

fn login(provider: &kagi::provider::TokenProvider<kagi::db::MemoryStore>) -> String {
    provider
        .create(&password_credential(USERNAME, PASSWORD))
        .unwrap()
        .access_token
}

#[test]
fn bearer_header_resolves_permitted_token() {
    let provider = provider();
    let token = login(&provider);

    let header = format!("Bearer {}", token);
    let parsed = provider
        .parse_with_access_token(&header, "GET", "/tasks/17")
        .unwrap();
    assert_eq!(parsed.token(), token);
    assert_eq!(parsed.user_id(), Some(&UserId(USER_ID.to_string())));
    assert!(parsed.verify_expire_in());
}

#[test]
fn permission_must_cover_method_and_endpoint() {
    let provider = provider();
    let header = format!("Bearer {}", login(&provider));

    assert!(matches!(
        provider.parse_with_access_token(&header, "DELETE", "/tasks/17"),
        Err(Error::TokenNotFound)
    ));
    assert!(matches!(
        provider.parse_with_access_token(&header, "GET", "/users"),
        Err(Error::TokenNotFound)
    ));
}

#[test]
fn malformed_headers_are_classified() {
    let provider = provider();

    assert!(matches!(
        provider.parse_with_access_token("", "GET", "/tasks"),
        Err(Error::EmptyCredential)
    ));
    assert!(matches!(
        provider.parse_with_access_token("Token abc", "GET", "/tasks"),
        Err(Error::TokenTypeMismatch)
    ));
    assert!(matches!(
        provider.parse_with_access_token("Bearer", "GET", "/tasks"),
        Err(Error::TokenTypeMismatch)
    ));
    assert!(matches!(
        provider.parse_with_access_token("Bearer unknown", "GET", "/tasks"),
        Err(Error::TokenNotFound)
    ));
}

#[test]
fn client_tokens_have_no_permissions() {
    let provider = provider();
    let token = provider
        .create(&credential("client_credentials"))
        .unwrap()
        .access_token;

    assert!(matches!(
        provider.parse_with_access_token(&format!("Bearer {}", token), "GET", "/tasks"),
        Err(Error::TokenNotFound)
    ));
}

#[test]
fn expired_tokens_still_parse() {
    let provider = provider();
    provider
        .store()
        .create_access_token(&AccessToken::new(
            "expired".to_string(),
            ClientId(CLIENT_ID.to_string()),
            Some(UserId(USER_ID.to_string())),
            Utc::now() - Duration::seconds(1),
            None,
        ))
        .unwrap();

    let parsed = provider
        .parse_with_access_token("Bearer expired", "GET", "/tasks")
        .unwrap();
    assert!(!parsed.verify_expire_in());
}
