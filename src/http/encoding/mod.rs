pub mod error;
pub mod reply;

use std::sync::Arc;

use http_basic_auth::Credential as BasicCredentials;
use warp::filters::path::FullPath;
use warp::http::header::{HeaderMap, AUTHORIZATION};
use warp::http::Method;
use warp::{Filter, Rejection};

use crate::auth::{ClientCredentials, Store};
use crate::core::models::AccessToken;
use crate::core::types::{ClientId, ClientSecret};
use crate::provider::error::Error;
use crate::provider::TokenProvider;

use self::error::AuthRejection;

#[derive(serde::Deserialize)]
pub struct WithCredentials<T> {
    #[serde(flatten)]
    credentials: ClientCredentials,
    #[serde(flatten)]
    body: T,
}

impl<T> From<(BasicCredentials, T)> for WithCredentials<T> {
    fn from((credentials, value): (BasicCredentials, T)) -> Self {
        let credentials = ClientCredentials {
            client_id: ClientId(credentials.user_id),
            client_secret: ClientSecret(credentials.password),
        };

        Self::join(credentials, value)
    }
}

impl<T> WithCredentials<T> {
    pub fn join(credentials: ClientCredentials, body: T) -> Self {
        Self { credentials, body }
    }

    pub fn split(self) -> (ClientCredentials, T) {
        (self.credentials, self.body)
    }
}

/// Form body plus client credentials, from HTTP Basic auth or from the
/// form itself. A Basic-authenticated request with an undecodable form is
/// an invalid request, not a missing client.
pub fn body_with_credentials<T: serde::de::DeserializeOwned + Send>(
) -> impl Filter<Extract = ((ClientCredentials, T),), Error = Rejection> + Clone {
    let form = warp::body::form::<T>().or_else(|_| async move {
        let error = Error::InvalidRequest("malformed form body".to_string());
        Err(warp::reject::custom(AuthRejection::Issuance(error)))
    });
    let basic = warp::header::<BasicCredentials>("Authorization")
        .and(form)
        .map(|c, b| (c, b).into());
    let body = warp::body::form::<WithCredentials<T>>();
    basic
        .or(body)
        .unify()
        .or_else(|rejection: Rejection| async move {
            match rejection.find::<AuthRejection>() {
                Some(_) => Err(rejection),
                None => Err(warp::reject::custom(AuthRejection::MissingClientCredentials)),
            }
        })
        .map(|w: WithCredentials<T>| w.split())
}

// A missing header is an empty credential; one that is not visible ASCII
// cannot carry a bearer token.
fn authorization(headers: &HeaderMap) -> Result<&str, Error> {
    match headers.get(AUTHORIZATION) {
        Some(value) => value.to_str().map_err(|_| Error::TokenTypeMismatch),
        None => Ok(""),
    }
}

/// Admits requests whose bearer token is live and permitted for the
/// request's method and path, extracting the token.
pub fn with_access_token<S>(
    provider: Arc<TokenProvider<S>>,
) -> impl Filter<Extract = (AccessToken,), Error = Rejection> + Clone
where
    S: Store + Send + Sync + 'static,
{
    warp::method()
        .and(warp::path::full())
        .and(warp::header::headers_cloned())
        .and_then(move |method: Method, path: FullPath, headers: HeaderMap| {
            let provider = provider.clone();
            async move {
                let result = authorization(&headers)
                    .and_then(|header| {
                        provider.parse_with_access_token(header, method.as_str(), path.as_str())
                    })
                    .and_then(|token| match token.verify_expire_in() {
                        true => Ok(token),
                        false => Err(Error::Expired),
                    })
                    .map_err(AuthRejection::Unauthenticated);
                reply::accept(result)
            }
        })
}
