use std::sync::Arc;

use warp::Filter;

use crate::auth::{ClientCredentials, Store, TokenForm};
use crate::core::models::{AccessToken, Credential};
use crate::http::encoding::{self, reply, with_access_token};
use crate::provider::error::Error;
use crate::provider::TokenProvider;

/// Principal behind a validated bearer token.
#[derive(Debug, serde::Serialize)]
struct TokenInfo {
    client_id: String,
    user_id: Option<String>,
    scope: Option<String>,
    expires_in: i64,
}

impl From<&AccessToken> for TokenInfo {
    fn from(token: &AccessToken) -> Self {
        Self {
            client_id: token.client_id().0.clone(),
            user_id: token.user_id().map(|u| u.0.clone()),
            scope: token.scope().map(|s| s.0.clone()),
            expires_in: (token.expires() - chrono::Utc::now()).num_seconds().max(0),
        }
    }
}

pub fn oauth_endpoint<S>(
    provider: Arc<TokenProvider<S>>,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone
where
    S: Store + Send + Sync + 'static,
{
    let with_provider = {
        let provider = provider.clone();
        warp::any().map(move || provider.clone())
    };

    let token = warp::path("token")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_provider)
        .and(encoding::body_with_credentials::<TokenForm>())
        .and_then(
            |provider: Arc<TokenProvider<S>>, (credentials, form): (ClientCredentials, TokenForm)| async move {
                let credential = Credential::from((credentials, form));
                let result = match provider.client_scope_allowed(credential.client_id.as_ref()) {
                    true => provider.create(&credential),
                    false => Err(Error::ClientNotAllowed),
                };
                reply::json_encode(result)
            },
        );

    let tokeninfo = warp::path("tokeninfo")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_access_token(provider))
        .map(|token: AccessToken| warp::reply::json(&TokenInfo::from(&token)));

    warp::path("v1").and(token.or(tokeninfo))
}
