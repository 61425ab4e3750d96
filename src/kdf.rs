//! PBKDF2-HMAC-SHA256 key derivation.
//!
//! The engine derives 32 bytes from the application identifier, salted with the
//! config salt and stretched by the config iteration count, then base64url
//! encodes the result. The encoded form is the symmetric key material consumed
//! by the token layer.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::base64url::base64url_encode;
use crate::error::CryptoError;

/// Derived key length in bytes, before base64url encoding.
pub const KEY_LENGTH: usize = 32;

/// Base64url-encoded key material, zeroized on drop.
///
/// Recomputed on every encrypt/decrypt call; never persisted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey(String);

impl DerivedKey {
    /// The padded base64url encoding of the 32 raw key bytes (44 chars).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Derive key material from an application identifier.
///
/// PBKDF2-HMAC-SHA256, output length 32 bytes, salt = UTF-8 bytes of `salt`,
/// derivation input = UTF-8 bytes of `app_id`, base64url-encoded.
pub fn derive_key(app_id: &str, salt: &str, iterations: u32) -> Result<DerivedKey, CryptoError> {
    if iterations == 0 {
        return Err(CryptoError::KeyDerivation(
            "iteration count must be positive".into(),
        ));
    }
    let mut okm = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(app_id.as_bytes(), salt.as_bytes(), iterations, &mut okm);
    let encoded = base64url_encode(&okm);
    okm.zeroize();
    Ok(DerivedKey(encoded))
}
