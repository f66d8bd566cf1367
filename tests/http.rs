mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::Value;

use kagi::auth::TokenWriter;
use kagi::core::config::TokenConfig;
use kagi::core::models::AccessToken;
use kagi::core::types::{ClientId, UserId};
use kagi::db::MemoryStore;
use kagi::provider::TokenProvider;

use common::*;

fn basic(client_id: &str, secret: &str) -> String {
    format!(
        "Basic {}",
        base64::encode(format!("{}:{}", client_id, secret))
    )
}

fn body(resp: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
    serde_json::from_slice(resp.body()).unwrap()
}

fn shared(provider: TokenProvider<MemoryStore>) -> Arc<TokenProvider<MemoryStore>> {
    Arc::new(provider)
}

#[tokio::test]
async fn token_endpoint_accepts_basic_auth() {
    let routes = kagi::http::routes(shared(provider()));

    let resp = warp::test::request()
        .method("POST")
        .path("/oauth/v1/token")
        .header("authorization", basic(CLIENT_ID, CLIENT_SECRET))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("grant_type=client_credentials")
        .reply(&routes)
        .await;

    assert_eq!(resp.status(), 200);
    let json = body(&resp);
    assert_eq!(json["token_type"], "Bearer");
    assert!(json["access_token"].as_str().map_or(false, |t| !t.is_empty()));
    assert!(json["scope"].is_null());
}

#[tokio::test]
async fn token_endpoint_accepts_form_credentials() {
    let routes = kagi::http::routes(shared(provider()));

    let form = format!(
        "grant_type=password&client_id={}&client_secret={}&username={}&password={}",
        CLIENT_ID, CLIENT_SECRET, USERNAME, "correct+horse+battery+staple"
    );
    let resp = warp::test::request()
        .method("POST")
        .path("/oauth/v1/token")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(form)
        .reply(&routes)
        .await;

    assert_eq!(resp.status(), 200);
    assert_eq!(body(&resp)["scope"], "user");
}

#[tokio::test]
async fn token_endpoint_maps_errors() {
    let routes = kagi::http::routes(shared(provider()));

    let resp = warp::test::request()
        .method("POST")
        .path("/oauth/v1/token")
        .header("authorization", basic(CLIENT_ID, "wrong"))
        .body("grant_type=client_credentials")
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 401);
    assert_eq!(body(&resp)["error"], "invalid client");

    let resp = warp::test::request()
        .method("POST")
        .path("/oauth/v1/token")
        .header("authorization", basic("nobody", "x"))
        .body("grant_type=client_credentials")
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 404);

    let resp = warp::test::request()
        .method("POST")
        .path("/oauth/v1/token")
        .body("grant_type=client_credentials")
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn token_endpoint_enforces_allow_list() {
    let config = TokenConfig {
        client_scope: vec![OPS_CLIENT_ID.to_string()],
        ..Default::default()
    };
    let routes = kagi::http::routes(shared(provider_with(seeded_store(), config)));

    let resp = warp::test::request()
        .method("POST")
        .path("/oauth/v1/token")
        .header("authorization", basic(CLIENT_ID, CLIENT_SECRET))
        .body("grant_type=client_credentials")
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 403);
    assert_eq!(body(&resp)["error"], "client not allowed");
}

#[tokio::test]
async fn tokeninfo_requires_a_live_permitted_token() {
    let provider = provider();
    let token = provider
        .create(&password_credential(EMAIL, PASSWORD))
        .unwrap()
        .access_token;
    provider
        .store()
        .create_access_token(&AccessToken::new(
            "expired".to_string(),
            ClientId(CLIENT_ID.to_string()),
            Some(UserId(USER_ID.to_string())),
            Utc::now() - Duration::seconds(5),
            None,
        ))
        .unwrap();
    let routes = kagi::http::routes(shared(provider));

    let resp = warp::test::request()
        .path("/oauth/v1/tokeninfo")
        .header("authorization", format!("Bearer {}", token))
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 200);
    let json = body(&resp);
    assert_eq!(json["user_id"], USER_ID);
    assert_eq!(json["client_id"], CLIENT_ID);

    let resp = warp::test::request()
        .path("/oauth/v1/tokeninfo")
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 401);
    assert_eq!(body(&resp)["error"], "empty credential");

    let resp = warp::test::request()
        .path("/oauth/v1/tokeninfo")
        .header("authorization", "Bearer expired")
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 401);
    assert_eq!(body(&resp)["error"], "token expired");

    let resp = warp::test::request()
        .path("/oauth/v1/tokeninfo")
        .header("authorization", "Bearer unknown")
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 401);
    assert_eq!(body(&resp)["error"], "token not found");
}

#[tokio::test]
async fn token_endpoint_rejects_malformed_form_with_valid_client() {
    let routes = kagi::http::routes(shared(provider()));

    let resp = warp::test::request()
        .method("POST")
        .path("/oauth/v1/token")
        .header("authorization", basic(CLIENT_ID, CLIENT_SECRET))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("username=alice")
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 400);
    assert_eq!(body(&resp)["error"], "invalid request");
}

#[tokio::test]
async fn tokeninfo_rejects_non_ascii_authorization() {
    let routes = kagi::http::routes(shared(provider()));

    let resp = warp::test::request()
        .path("/oauth/v1/tokeninfo")
        .header("authorization", &b"Bearer caf\xc3\xa9"[..])
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 401);
    assert_eq!(body(&resp)["error"], "token type mismatch");
}
