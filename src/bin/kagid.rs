use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use kagi::core::config::TokenConfig;
use kagi::db::DbStore;
use kagi::http::Server;
use kagi::provider::error::Error;
use kagi::provider::validation::RequestValidator;
use kagi::provider::TokenProvider;
use kagi::util::hash::HashingService;

#[derive(Debug, Parser)]
#[clap(
    name = "kagid",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS")
)]
struct Options {
    #[clap(long, env = "DATABASE_URL")]
    database_url: String,
    /// Read replica used for bearer token checks
    #[clap(long, env = "DATABASE_READ_URL")]
    database_read_url: Option<String>,
    #[clap(long, env = "HASH_SECRET", hide_env_values = true)]
    hash_secret: String,
    #[clap(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:8001")]
    bind_address: SocketAddr,
    #[clap(flatten)]
    tokens: TokenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let opts = Options::parse();

    let store = DbStore::acquire(&opts.database_url, opts.database_read_url.as_deref())?;
    store.migrate()?;

    let hasher = HashingService::with_secret_key(opts.hash_secret);
    let provider = TokenProvider::new(store, hasher, opts.tokens, RequestValidator::new());

    Server::new(Arc::new(provider))
        .serve(opts.bind_address)
        .await;
    Ok(())
}
