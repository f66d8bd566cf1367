use sha2::Digest;

use crate::core::types::{HashedPassword, Password};

use super::random::FromRandom;

#[derive(Debug)]
pub struct Salt(pub String);

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(#[from] argon2::Error);

/// Argon2 hashing keyed with a server-side secret.
pub struct HashingService {
    secret_key: String,
}

impl std::fmt::Debug for HashingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashingService").finish_non_exhaustive()
    }
}

impl HashingService {
    pub fn with_secret_key(secret_key: String) -> Self {
        Self { secret_key }
    }

    fn get_config(&self) -> argon2::Config {
        argon2::Config {
            secret: self.secret_key.as_bytes(),
            ..argon2::Config::default()
        }
    }

    pub fn hash(&self, password: &Password) -> Result<HashedPassword, HashError> {
        let salt = Salt::from_random();
        let hash = argon2::hash_encoded(
            password.as_ref().as_bytes(),
            salt.0.as_bytes(),
            &self.get_config(),
        )?;

        Ok(hash.into())
    }

    /// A malformed stored hash counts as a mismatch.
    pub fn verify(&self, password: &Password, hashed: &HashedPassword) -> bool {
        argon2::verify_encoded_ext(
            hashed.as_ref(),
            password.as_ref().as_bytes(),
            self.secret_key.as_bytes(),
            &[],
        )
        .unwrap_or(false)
    }
}

/// Short, non-reversible tag for a token, safe to log.
pub fn fingerprint(token: &str) -> String {
    let digest = sha2::Sha256::digest(token.as_bytes());
    let mut tag = base64::encode_config(digest, base64::URL_SAFE_NO_PAD);
    tag.truncate(12);
    tag
}
