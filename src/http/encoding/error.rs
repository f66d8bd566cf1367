use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::provider::error::Error;

#[derive(Debug)]
pub enum AuthRejection {
    /// Token endpoint failure, reported with the error's own status.
    Issuance(Error),
    /// Bearer gate failure. Always 401.
    Unauthenticated(Error),
    MissingClientCredentials,
}

impl warp::reject::Reject for AuthRejection {}

impl From<Error> for AuthRejection {
    fn from(error: Error) -> Self {
        Self::Issuance(error)
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl AuthRejection {
    fn status(&self) -> StatusCode {
        match self {
            Self::Issuance(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Unauthenticated(_) | Self::MissingClientCredentials => StatusCode::UNAUTHORIZED,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::Issuance(e) | Self::Unauthenticated(e) => e.reason(),
            Self::MissingClientCredentials => "invalid client",
        }
    }
}

pub async fn handle_reject(err: Rejection) -> Result<impl Reply, Rejection> {
    match err.find::<AuthRejection>() {
        Some(e) => {
            if let AuthRejection::Issuance(inner) | AuthRejection::Unauthenticated(inner) = e {
                if inner.is_server_error() {
                    tracing::error!(error = %inner, "request failed");
                }
            }
            let body = warp::reply::json(&ErrorBody { error: e.reason() });
            Ok(warp::reply::with_status(body, e.status()))
        }
        None => Err(err),
    }
}
