use chrono::Duration;

pub const DEFAULT_ACCESS_LIFETIME: u64 = 3600;
pub const DEFAULT_REFRESH_LIFETIME: u64 = 1_209_600;

// A century; keeps `now + lifetime` representable.
const MAX_LIFETIME: u64 = 100 * 365 * 24 * 3600;

const WILDCARD: &str = "*";

/// Token lifetimes and the client allow-list.
///
/// Zero values mean "not configured" and fall back to the defaults.
#[derive(Clone, Debug, Default, clap::Args)]
pub struct TokenConfig {
    /// Access token lifetime in seconds
    #[clap(long, env = "ACCESS_TOKEN_LIFETIME", default_value = "0")]
    pub access_token_lifetime: u64,
    /// Refresh token lifetime in seconds
    #[clap(long, env = "REFRESH_TOKEN_LIFETIME", default_value = "0")]
    pub refresh_token_lifetime: u64,
    /// Absolute access token expiration in seconds, overrides the access lifetime
    #[clap(long, env = "TOKEN_EXPIRATION", default_value = "0")]
    pub expiration: u64,
    /// Client ids allowed to request tokens, `*` or nothing allows all
    #[clap(long, env = "CLIENT_SCOPE", value_delimiter = ',')]
    pub client_scope: Vec<String>,
}

impl TokenConfig {
    pub fn access_lifetime(&self) -> Duration {
        let secs = match (self.expiration, self.access_token_lifetime) {
            (0, 0) => DEFAULT_ACCESS_LIFETIME,
            (0, lifetime) => lifetime,
            (expiration, _) => expiration,
        };
        seconds(secs)
    }

    pub fn refresh_lifetime(&self) -> Duration {
        match self.refresh_token_lifetime {
            0 => seconds(DEFAULT_REFRESH_LIFETIME),
            lifetime => seconds(lifetime),
        }
    }

    pub fn client_scope_allowed(&self, client_id: &str) -> bool {
        self.client_scope.is_empty()
            || self
                .client_scope
                .iter()
                .any(|c| c == WILDCARD || c == client_id)
    }
}

fn seconds(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_LIFETIME) as i64)
}
