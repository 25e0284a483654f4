//! Salted digests for passwords and one-time tokens.
//!
//! Passwords are Argon2id PHC strings. One-time tokens are random and short
//! lived, so they use HMAC-SHA256 keyed by a random per-record salt.
//! Verification picks the scheme from the stored hash and compares in
//! constant time.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Salt and hash as stored alongside the record: hex salt and MAC for
/// tokens, base64 salt and PHC string for passwords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub salt: String,
    pub hash: String,
}

impl Digest {
    /// HMAC digest of a one-time token under a fresh random salt.
    pub fn new(secret: &str) -> Self {
        let salt = Uuid::new_v4().as_bytes().to_vec();
        let hash = mac(&salt, secret);
        Self {
            salt: hex::encode(&salt),
            hash: hex::encode(hash),
        }
    }

    /// Argon2id digest of a password under a fresh random salt.
    pub fn password(secret: &str) -> Self {
        let hashed = SaltString::encode_b64(Uuid::new_v4().as_bytes()).and_then(|salt| {
            let hash = Argon2::default()
                .hash_password(secret.as_bytes(), &salt)?
                .to_string();
            Ok((salt.as_str().to_string(), hash))
        });
        match hashed {
            Ok((salt, hash)) => Self { salt, hash },
            // Unreachable with default parameters; an empty hash never verifies
            Err(_) => Self {
                salt: String::new(),
                hash: String::new(),
            },
        }
    }

    pub fn verify(&self, secret: &str) -> bool {
        if self.hash.starts_with('$') {
            return PasswordHash::new(&self.hash).is_ok_and(|parsed| {
                Argon2::default()
                    .verify_password(secret.as_bytes(), &parsed)
                    .is_ok()
            });
        }

        let (Ok(salt), Ok(expected)) = (hex::decode(&self.salt), hex::decode(&self.hash)) else {
            return false;
        };
        // HMAC accepts keys of any length
        let Ok(mut mac) = HmacSha256::new_from_slice(&salt) else {
            return false;
        };
        mac.update(secret.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

fn mac(salt: &[u8], secret: &str) -> Vec<u8> {
    match HmacSha256::new_from_slice(salt) {
        Ok(mut mac) => {
            mac.update(secret.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        // Unreachable for HMAC; an empty hash never verifies
        Err(_) => Vec::new(),
    }
}

/// A fresh one-time token for email confirmation or password reset.
pub fn one_time_token() -> String {
    Uuid::new_v4().simple().to_string()
}
