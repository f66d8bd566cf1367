use std::net::SocketAddr;
use std::sync::Arc;

use warp::Filter;

use crate::auth::Store;
use crate::provider::TokenProvider;

mod endpoints;

use endpoints::oauth::oauth_endpoint;

use super::encoding::error::handle_reject;

#[derive(Debug)]
pub struct Server<S> {
    provider: Arc<TokenProvider<S>>,
}

/// Every route the daemon serves, with rejections mapped to JSON errors.
pub fn routes<S>(
    provider: Arc<TokenProvider<S>>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone
where
    S: Store + Send + Sync + 'static,
{
    warp::path("oauth")
        .and(oauth_endpoint(provider))
        .recover(handle_reject)
}

impl<S> Server<S>
where
    S: Store + Send + Sync + 'static,
{
    pub fn new(provider: Arc<TokenProvider<S>>) -> Self {
        Self { provider }
    }

    pub async fn serve(self, addr: SocketAddr) {
        let routes = routes(self.provider).with(warp::log("kagi::http"));

        tracing::info!(%addr, "listening");
        warp::serve(routes).run(addr).await;
    }
}
