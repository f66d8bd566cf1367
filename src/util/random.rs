use rand::RngCore;

use crate::core::types::ClientSecret;
use crate::provider::error::Error;

use super::hash::Salt;

const TOKEN_BYTES: usize = 32;

pub trait FromRandom {
    fn from_random() -> Self;
}

impl FromRandom for Salt {
    fn from_random() -> Self {
        Salt(random_string(32))
    }
}

impl FromRandom for ClientSecret {
    fn from_random() -> Self {
        ClientSecret(random_string(48))
    }
}

/// An opaque token string: 32 bytes from the OS random source, URL-safe
/// base64 without padding.
pub fn token_string() -> Result<String, Error> {
    let mut buf = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng
        .try_fill_bytes(&mut buf)
        .map_err(Error::TokenGeneration)?;
    Ok(base64::encode_config(buf, base64::URL_SAFE_NO_PAD))
}

fn random_string(size: usize) -> String {
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(size)
        .map(char::from)
        .collect()
}
