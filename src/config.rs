//! The persisted engine configuration record.
//!
//! Serialized shape: `{"version": 4, "salt": "...", "iterations": 100000}`,
//! plus a `"secret"` field once a ciphertext token has been stored. The salt
//! and iteration count must stay stable for a given encrypted value; changing
//! either invalidates decryption.

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Config version this engine reads and writes.
pub const CONFIG_VERSION: u32 = 4;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Salt length in characters.
pub const SALT_LENGTH: usize = 16;

/// Salt alphabet: ASCII letters, digits, and punctuation (94 characters).
const SALT_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789\
      !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    pub version: u32,
    pub salt: String,
    pub iterations: u32,
    /// Ciphertext token; present only once a secret has been stored.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub secret: Option<String>,
}

impl EngineConfig {
    /// Produce a fresh record: version 4, a random 16-character salt, and the
    /// default iteration count. Uses the OS CSPRNG for the salt.
    pub fn generate() -> Result<Self, CryptoError> {
        Ok(Self {
            version: CONFIG_VERSION,
            salt: generate_salt()?,
            iterations: DEFAULT_ITERATIONS,
            secret: None,
        })
    }

    /// Copy of this record with `secret` set to the given token.
    pub fn with_secret(&self, token: impl Into<String>) -> Self {
        Self {
            secret: Some(token.into()),
            ..self.clone()
        }
    }
}

/// Draw a 16-character salt uniformly from the 94-character alphabet.
///
/// Rejection sampling keeps the draw unbiased: 188 is an exact multiple of 94,
/// so bytes 188..=255 are discarded rather than folded in.
fn generate_salt() -> Result<String, CryptoError> {
    debug_assert_eq!(SALT_ALPHABET.len(), 94);
    let mut salt = String::with_capacity(SALT_LENGTH);
    let mut buf = [0u8; 64];
    'fill: loop {
        getrandom::getrandom(&mut buf).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
        for &b in &buf {
            if b < 188 {
                salt.push(SALT_ALPHABET[(b % 94) as usize] as char);
                if salt.len() == SALT_LENGTH {
                    break 'fill;
                }
            }
        }
    }
    Ok(salt)
}
